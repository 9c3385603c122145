// tests/access_tests.rs

use chrono::{Duration, Utc};
use dronaa_backend::{config::Config, routes, state::AppState, utils::hash::hash_password};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions, types::Json};

async fn spawn_app() -> (String, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "access_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        super_admin_email: None,
        super_admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

async fn insert_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    role: &str,
    enrollment_number: Option<&str>,
) -> i64 {
    let hashed = hash_password("password123").expect("hash password");
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (name, email, password, role, enrollment_number)
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(email)
    .bind(&hashed)
    .bind(role)
    .bind(enrollment_number)
    .fetch_one(pool)
    .await
    .expect("insert user")
}

/// Seeds a one-question test with an arbitrary schedule.
async fn insert_test_scheduled(
    pool: &SqlitePool,
    date: chrono::NaiveDate,
    start_time: &str,
    end_time: &str,
) -> i64 {
    let admin_email = format!("admin_{}@dronaa.test", &uuid::Uuid::new_v4().to_string()[..8]);
    let admin_id = insert_user(pool, "Seeder Admin", &admin_email, "admin", None).await;

    let test_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO tests (title, date, start_time, end_time, duration_minutes, total_marks, created_by)
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind("Scheduled test")
    .bind(date)
    .bind(start_time)
    .bind(end_time)
    .bind(30_i64)
    .bind(1_i64)
    .bind(admin_id)
    .fetch_one(pool)
    .await
    .expect("insert test");

    sqlx::query(
        "INSERT INTO questions (test_id, position, text, options, correct_answer)
         VALUES (?, 0, 'Pick A', ?, 'A')",
    )
    .bind(test_id)
    .bind(Json(vec!["A".to_string(), "B".to_string()]))
    .execute(pool)
    .await
    .expect("insert question");

    test_id
}

async fn login(client: &reqwest::Client, address: &str, email: &str) -> String {
    let resp = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .expect("login request")
        .json::<serde_json::Value>()
        .await
        .expect("login json");

    resp["token"].as_str().expect("token").to_string()
}

async fn fetch_exam(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    test_id: i64,
) -> reqwest::Response {
    client
        .get(format!("{}/api/exams/{}", address, test_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("fetch exam request")
}

#[tokio::test]
async fn fetching_a_test_scheduled_another_day_is_rejected() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    insert_user(&pool, "Gita", "gita@dronaa.test", "student", Some("EN-601")).await;
    let yesterday = (Utc::now() - Duration::days(1)).date_naive();
    let test_id = insert_test_scheduled(&pool, yesterday, "00:00:00", "23:59:59").await;
    let token = login(&client, &address, "gita@dronaa.test").await;

    let resp = fetch_exam(&client, &address, &token, test_id).await;

    assert_eq!(resp.status().as_u16(), 403);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "not_scheduled_today");
}

#[tokio::test]
async fn fetching_outside_the_window_reports_which_side() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    insert_user(&pool, "Hari", "hari@dronaa.test", "student", Some("EN-602")).await;
    let today = Utc::now().date_naive();

    // A window pinned to the first instant of the day has ended for the
    // rest of it; one pinned to the last instant has not started yet.
    let ended = insert_test_scheduled(&pool, today, "00:00:00", "00:00:00").await;
    let not_started = insert_test_scheduled(&pool, today, "23:59:59", "23:59:59").await;
    let token = login(&client, &address, "hari@dronaa.test").await;

    let resp = fetch_exam(&client, &address, &token, ended).await;
    assert_eq!(resp.status().as_u16(), 403);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "ended");

    let resp = fetch_exam(&client, &address, &token, not_started).await;
    assert_eq!(resp.status().as_u16(), 403);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "not_started");
}

#[tokio::test]
async fn student_payloads_never_contain_answer_keys() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    insert_user(&pool, "Ira", "ira@dronaa.test", "student", Some("EN-603")).await;
    let today = Utc::now().date_naive();
    let test_id = insert_test_scheduled(&pool, today, "00:00:00", "23:59:59").await;
    let token = login(&client, &address, "ira@dronaa.test").await;

    let resp = fetch_exam(&client, &address, &token, test_id).await;
    assert_eq!(resp.status().as_u16(), 200);
    let raw = resp.text().await.unwrap();
    assert!(
        !raw.contains("correct_answer"),
        "fetch payload leaked the answer key: {raw}"
    );

    let resp = client
        .get(format!("{}/api/exams/active", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("active request");
    assert_eq!(resp.status().as_u16(), 200);
    let raw = resp.text().await.unwrap();
    assert!(
        !raw.contains("correct_answer"),
        "active payload leaked the answer key: {raw}"
    );
}

#[tokio::test]
async fn fetching_an_already_submitted_test_conflicts() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    insert_user(&pool, "Jai", "jai@dronaa.test", "student", Some("EN-604")).await;
    let today = Utc::now().date_naive();
    let test_id = insert_test_scheduled(&pool, today, "00:00:00", "23:59:59").await;
    let token = login(&client, &address, "jai@dronaa.test").await;

    let resp = client
        .post(format!("{}/api/exams/{}/submit", address, test_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "answers": ["A"] }))
        .send()
        .await
        .expect("submit request");
    assert_eq!(resp.status().as_u16(), 200);

    let resp = fetch_exam(&client, &address, &token, test_id).await;
    assert_eq!(resp.status().as_u16(), 409);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "already_submitted");
}

#[tokio::test]
async fn result_is_not_found_before_any_submission() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    insert_user(&pool, "Kiran", "kiran@dronaa.test", "student", Some("EN-605")).await;
    let today = Utc::now().date_naive();
    let test_id = insert_test_scheduled(&pool, today, "00:00:00", "23:59:59").await;
    let token = login(&client, &address, "kiran@dronaa.test").await;

    let resp = client
        .get(format!("{}/api/exams/{}/result", address, test_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("result request");

    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn routes_are_gated_by_role() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    insert_user(&pool, "Student", "stud@dronaa.test", "student", Some("EN-606")).await;
    insert_user(&pool, "Admin", "adm@dronaa.test", "admin", None).await;
    insert_user(&pool, "Root", "root@dronaa.test", "superadmin", None).await;

    let student = login(&client, &address, "stud@dronaa.test").await;
    let admin = login(&client, &address, "adm@dronaa.test").await;
    let root = login(&client, &address, "root@dronaa.test").await;

    // No token at all.
    let resp = client
        .get(format!("{}/api/exams/active", address))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    // A student cannot read admin reports.
    let resp = client
        .get(format!("{}/api/admin/students", address))
        .header("Authorization", format!("Bearer {}", student))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // An admin cannot take tests.
    let resp = client
        .get(format!("{}/api/exams/active", address))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // An admin cannot mint other admins; the super-admin can.
    let new_admin = serde_json::json!({
        "name": "Second Admin",
        "email": "second@dronaa.test",
        "password": "password123"
    });
    let resp = client
        .post(format!("{}/api/admin/admins", address))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&new_admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = client
        .post(format!("{}/api/admin/admins", address))
        .header("Authorization", format!("Bearer {}", root))
        .json(&new_admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
}

#[tokio::test]
async fn leaderboard_is_visible_to_admins_and_students_alike() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    insert_user(&pool, "Student", "s@dronaa.test", "student", Some("EN-607")).await;
    insert_user(&pool, "Admin", "a@dronaa.test", "admin", None).await;
    let today = Utc::now().date_naive();
    let test_id = insert_test_scheduled(&pool, today, "00:00:00", "23:59:59").await;

    for email in ["s@dronaa.test", "a@dronaa.test"] {
        let token = login(&client, &address, email).await;
        let resp = client
            .get(format!("{}/api/exams/{}/leaderboard", address, test_id))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }
}

#[tokio::test]
async fn creating_a_test_with_an_inverted_window_fails_validation() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    insert_user(&pool, "Admin", "adm2@dronaa.test", "admin", None).await;
    let token = login(&client, &address, "adm2@dronaa.test").await;

    let resp = client
        .post(format!("{}/api/admin/tests", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "title": "Backwards test",
            "date": Utc::now().date_naive(),
            "start_time": "10:00:00",
            "end_time": "09:00:00",
            "duration_minutes": 30,
            "total_marks": 1,
            "questions": [
                { "text": "Q", "options": ["A", "B"], "correct_answer": "A" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // No questions at all is rejected the same way.
    let resp = client
        .post(format!("{}/api/admin/tests", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "title": "Empty test",
            "date": Utc::now().date_naive(),
            "start_time": "09:00:00",
            "end_time": "10:00:00",
            "duration_minutes": 30,
            "total_marks": 1,
            "questions": []
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_student_email_conflicts() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    insert_user(&pool, "Admin", "adm3@dronaa.test", "admin", None).await;
    let token = login(&client, &address, "adm3@dronaa.test").await;

    let student = serde_json::json!({
        "name": "Lina",
        "email": "lina@dronaa.test",
        "password": "password123",
        "enrollment_number": "EN-701"
    });

    let resp = client
        .post(format!("{}/api/admin/students", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let resp = client
        .post(format!("{}/api/admin/students", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn leaderboard_for_an_unknown_test_is_not_found() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    insert_user(&pool, "Student", "sx@dronaa.test", "student", Some("EN-608")).await;
    let token = login(&client, &address, "sx@dronaa.test").await;

    let resp = client
        .get(format!("{}/api/exams/4242/leaderboard", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
