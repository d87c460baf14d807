//! Database row types — these map directly to SQLite rows.
//! Distinct from the tgp-types API models to keep the DB layer independent.

use chrono::{DateTime, Utc};
use tracing::warn;

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct ApplicationRow {
    pub id: i64,
    pub user_id: i64,
    pub applicant_name: String,
    pub conference_name: String,
    pub conference_acronym: String,
    pub core_ranking: String,
    pub start_date: String,
    pub end_date: String,
    pub paper_title: String,
    pub author: String,
    pub grant_amount_requested: f64,
    pub justification: String,
    pub pdf_url: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct CommentRow {
    pub id: i64,
    pub application_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub parent_id: Option<i64>,
    pub comment_text: String,
    pub created_at: String,
}

/// Fields required to insert a new application. The row's id, status, and
/// timestamp are assigned by the store.
pub struct NewApplication {
    pub user_id: i64,
    pub conference_name: String,
    pub conference_acronym: String,
    pub core_ranking: String,
    pub start_date: String,
    pub end_date: String,
    pub paper_title: String,
    pub author: String,
    pub grant_amount_requested: f64,
    pub justification: String,
    pub pdf_url: String,
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC, falling back through RFC 3339 for externally written
/// rows.
pub fn timestamp_utc(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}': {}", raw, e);
            DateTime::default()
        })
}
