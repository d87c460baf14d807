use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use tgp_db::models::{ApplicationRow, NewApplication, timestamp_utc};
use tgp_types::api::Claims;
use tgp_types::models::{Application, ApplicationStatus};

use crate::error::ApiError;
use crate::AppState;
use crate::storage::MAX_DOCUMENT_SIZE;

/// Validated submission fields, minus the document which is staged
/// separately.
#[derive(Debug)]
pub(crate) struct SubmissionFields {
    pub conference_name: String,
    pub conference_acronym: String,
    pub core_ranking: String,
    pub start_date: String,
    pub end_date: String,
    pub paper_title: String,
    pub author: String,
    pub grant_amount_requested: f64,
    pub justification: String,
}

fn required(
    fields: &HashMap<String, String>,
    key: &'static str,
    missing: &mut Vec<&'static str>,
) -> String {
    match fields.get(key).map(|v| v.trim()) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            missing.push(key);
            String::new()
        }
    }
}

fn optional(fields: &HashMap<String, String>, key: &str) -> String {
    fields.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Check every required form field and report all that are missing in one
/// response, not just the first.
pub(crate) fn validate_submission(
    fields: &HashMap<String, String>,
    has_document: bool,
) -> Result<SubmissionFields, ApiError> {
    let mut missing = Vec::new();

    let conference_name = required(fields, "conferenceName", &mut missing);
    let start_date = required(fields, "startDate", &mut missing);
    let end_date = required(fields, "endDate", &mut missing);
    let paper_title = required(fields, "paperTitle", &mut missing);
    let author = required(fields, "author", &mut missing);
    let amount_raw = required(fields, "grantAmountRequested", &mut missing);
    let justification = required(fields, "justification", &mut missing);
    if !has_document {
        missing.push("file");
    }

    if !missing.is_empty() {
        return Err(ApiError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    let grant_amount_requested: f64 = amount_raw
        .parse()
        .map_err(|_| ApiError::Validation("grantAmountRequested must be a number".into()))?;
    if !grant_amount_requested.is_finite() || grant_amount_requested < 0.0 {
        return Err(ApiError::Validation(
            "grantAmountRequested must be non-negative".into(),
        ));
    }

    Ok(SubmissionFields {
        conference_name,
        conference_acronym: optional(fields, "conferenceAcronym"),
        core_ranking: optional(fields, "coreRanking"),
        start_date,
        end_date,
        paper_title,
        author,
        grant_amount_requested,
        justification,
    })
}

/// POST /api/applications — multipart form: text fields plus the supporting
/// document. The document is persisted before the row insert so a stored
/// application always carries its URL.
pub async fn submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut document: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("malformed multipart body".into()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let ext = field
                .file_name()
                .and_then(|f| f.rsplit_once('.'))
                .map(|(_, e)| e.to_ascii_lowercase())
                .unwrap_or_else(|| "pdf".into());
            let data = field
                .bytes()
                .await
                .map_err(|_| ApiError::Validation("failed to read uploaded file".into()))?;
            document = Some((ext, data.to_vec()));
        } else {
            let value = field
                .text()
                .await
                .map_err(|_| ApiError::Validation("malformed multipart body".into()))?;
            fields.insert(name, value);
        }
    }

    let validated = validate_submission(&fields, document.is_some())?;
    let (ext, bytes) = document.unwrap_or_default();

    if bytes.is_empty() {
        return Err(ApiError::Validation("uploaded document is empty".into()));
    }
    if bytes.len() > MAX_DOCUMENT_SIZE {
        // Staged bytes are dropped here, nothing reaches the store.
        return Err(ApiError::Validation(
            "document exceeds the 200 KiB limit".into(),
        ));
    }

    let pdf_url = state
        .docs
        .save(&bytes, &ext)
        .await
        .map_err(ApiError::Storage)?;

    let new_app = NewApplication {
        user_id: claims.sub,
        conference_name: validated.conference_name,
        conference_acronym: validated.conference_acronym,
        core_ranking: validated.core_ranking,
        start_date: validated.start_date,
        end_date: validated.end_date,
        paper_title: validated.paper_title,
        author: validated.author,
        grant_amount_requested: validated.grant_amount_requested,
        justification: validated.justification,
        pdf_url,
    };

    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || db.db.insert_application(&new_app))
        .await
        .map_err(ApiError::task)??;

    info!("Application {} submitted by user {}", row.id, claims.sub);

    Ok((StatusCode::CREATED, Json(to_application(row))))
}

/// GET /api/applications/submitted
pub async fn list_submitted(
    State(state): State<AppState>,
) -> Result<Json<Vec<Application>>, ApiError> {
    list_by_status(state, ApplicationStatus::Submitted).await
}

/// GET /api/applications/approved
pub async fn list_approved(
    State(state): State<AppState>,
) -> Result<Json<Vec<Application>>, ApiError> {
    list_by_status(state, ApplicationStatus::Approved).await
}

async fn list_by_status(
    state: AppState,
    status: ApplicationStatus,
) -> Result<Json<Vec<Application>>, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || {
        db.db.list_applications_by_status(status.as_str())
    })
    .await
    .map_err(ApiError::task)??;

    Ok(Json(rows.into_iter().map(to_application).collect()))
}

/// GET /api/applications/{id}
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Application>, ApiError> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || db.db.get_application(id))
        .await
        .map_err(ApiError::task)??
        .ok_or(ApiError::NotFound("application"))?;

    Ok(Json(to_application(row)))
}

/// POST /api/applications/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Application>, ApiError> {
    transition(state, id, ApplicationStatus::Approved).await
}

/// POST /api/applications/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Application>, ApiError> {
    transition(state, id, ApplicationStatus::Rejected).await
}

/// Status transition. No terminal lock: a decided application may be
/// re-transitioned and the last writer wins.
async fn transition(
    state: AppState,
    id: i64,
    target: ApplicationStatus,
) -> Result<Json<Application>, ApiError> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        db.db.update_application_status(id, target.as_str())
    })
    .await
    .map_err(ApiError::task)?
    .map_err(|e| match e {
        tgp_db::StoreError::NotFound => ApiError::NotFound("application"),
        other => other.into(),
    })?;

    info!("Application {} -> {}", id, target);
    Ok(Json(to_application(row)))
}

pub(crate) fn to_application(row: ApplicationRow) -> Application {
    let status = ApplicationStatus::parse(&row.status).unwrap_or_else(|| {
        warn!("Corrupt status '{}' on application {}", row.status, row.id);
        ApplicationStatus::Submitted
    });

    Application {
        id: row.id,
        user_id: row.user_id,
        applicant_name: row.applicant_name,
        conference_name: row.conference_name,
        conference_acronym: row.conference_acronym,
        core_ranking: row.core_ranking,
        start_date: row.start_date,
        end_date: row.end_date,
        paper_title: row.paper_title,
        author: row.author,
        grant_amount_requested: row.grant_amount_requested,
        justification: row.justification,
        pdf_url: row.pdf_url,
        status,
        created_at: timestamp_utc(&row.created_at),
    }
}
