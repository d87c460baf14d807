use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Submitted,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "Submitted",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    pub fn parse(s: &str) -> Option<ApplicationStatus> {
        match s {
            "Submitted" => Some(ApplicationStatus::Submitted),
            "Approved" => Some(ApplicationStatus::Approved),
            "Rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A grant application as returned to the frontend. `applicant_name` is
/// resolved by join; the password column never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
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
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub application_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub parent_id: Option<i64>,
    pub comment_text: String,
    pub created_at: DateTime<Utc>,
}

/// One root comment with its direct replies, the only nesting shape the
/// portal renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub root: Comment,
    pub replies: Vec<Comment>,
}
