// src/services/availability.rs

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, codes},
    models::test::Test,
};

/// Why a test cannot be viewed or taken right now.
///
/// Each reason maps to a stable machine code; the client shows
/// different UI for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenial {
    NotScheduledToday,
    NotStarted,
    Ended,
}

impl AccessDenial {
    pub fn code(self) -> &'static str {
        match self {
            AccessDenial::NotScheduledToday => codes::NOT_SCHEDULED_TODAY,
            AccessDenial::NotStarted => codes::NOT_STARTED,
            AccessDenial::Ended => codes::ENDED,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            AccessDenial::NotScheduledToday => "Test is not scheduled for today",
            AccessDenial::NotStarted => "Test has not started yet",
            AccessDenial::Ended => "Test has ended",
        }
    }
}

impl From<AccessDenial> for AppError {
    fn from(denial: AccessDenial) -> Self {
        AppError::forbidden(denial.code(), denial.message())
    }
}

/// Decides whether a test is open at `now`.
///
/// All comparisons are UTC: the scheduled calendar day must match the
/// UTC day of `now`, and the UTC time-of-day must lie inside the
/// inclusive `[start_time, end_time]` window. Instants exactly on
/// either bound are allowed.
pub fn check(test: &Test, now: DateTime<Utc>) -> Result<(), AccessDenial> {
    if test.date != now.date_naive() {
        return Err(AccessDenial::NotScheduledToday);
    }

    let time_of_day = now.time();
    if time_of_day < test.start_time {
        return Err(AccessDenial::NotStarted);
    }
    if time_of_day > test.end_time {
        return Err(AccessDenial::Ended);
    }

    Ok(())
}

/// True when the test's window contains `now`. Used by the
/// active-tests listing, where a closed test is simply filtered out
/// rather than reported.
pub fn is_open(test: &Test, now: DateTime<Utc>) -> bool {
    check(test, now).is_ok()
}
