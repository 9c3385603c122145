// src/services/scoring.rs

use crate::models::test::Question;

/// Scores a submitted answer vector against a test's questions.
///
/// Matching is position-aligned: `answers[i]` is compared with
/// `questions[i].correct_answer` using exact string equality. A `None`
/// entry is a skipped question, answers past the question count are
/// ignored, and a short vector scores nothing for the missing tail.
/// The result is always in `0..=questions.len()`.
pub fn score_answers(questions: &[Question], answers: &[Option<String>]) -> i64 {
    questions
        .iter()
        .zip(answers.iter())
        .filter(|(question, answer)| answer.as_deref() == Some(question.correct_answer.as_str()))
        .count() as i64
}
