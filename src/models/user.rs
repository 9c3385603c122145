// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Closed set of account roles.
///
/// Stored as lowercase TEXT in the `users.role` column and carried
/// verbatim inside JWT claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Taking tests and reading own scores.
    pub fn can_take_tests(self) -> bool {
        matches!(self, Role::Student)
    }

    /// Creating students and tests, reading answer keys and absentee lists.
    pub fn can_manage_tests(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    /// Creating admin accounts.
    pub fn can_create_admins(self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// Leaderboards are visible to every authenticated account.
    pub fn can_view_leaderboard(self) -> bool {
        true
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Student => "student",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        };
        write!(f, "{}", name)
    }
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique login email.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub role: Role,

    /// Set for students only.
    pub enrollment_number: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Student identity summary for admin-facing reports.
#[derive(Debug, Serialize, FromRow)]
pub struct StudentSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub enrollment_number: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for an admin creating a student account.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters."))]
    pub name: String,
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
    #[validate(length(min = 1, max = 50))]
    pub enrollment_number: String,
}

/// DTO for the super-admin creating an admin account.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdminRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters."))]
    pub name: String,
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}
