use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::prelude::FromRow;

/// Free-form feedback for one (participant, event) pair; at most one per
/// pair, and only after at least one attendance mark
#[derive(PartialEq, Debug, FromRow, Clone, Serialize)]
pub struct Feedback {
    pub participant: i64,
    pub event: i64,
    /// Json array of responses
    pub response: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// One row of the event-wide feedback report, joined with the author's
/// identity
#[derive(Debug, FromRow, Serialize)]
pub struct FeedbackReportRow {
    pub name: String,
    pub email: String,
    pub branch: String,
    pub year: i64,
    pub phone: String,
    pub response: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
