use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use tgp_db::StoreError;
use tgp_db::models::{CommentRow, timestamp_utc};
use tgp_types::api::{
    AddCommentRequest, Claims, CommentCountResponse, CommentsResponse, DeleteCommentResponse,
    EditCommentRequest,
};
use tgp_types::models::Comment;

use crate::error::ApiError;
use crate::{AppState, tree};

/// GET /api/applications/{id}/comments — flat rows grouped into two-level
/// threads.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(application_id): Path<i64>,
) -> Result<Json<CommentsResponse>, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || {
        if db.db.get_application(application_id)?.is_none() {
            return Err(StoreError::NotFound);
        }
        db.db.list_comments(application_id)
    })
    .await
    .map_err(ApiError::task)?
    .map_err(|e| match e {
        StoreError::NotFound => ApiError::NotFound("application"),
        other => other.into(),
    })?;

    let flat: Vec<Comment> = rows.into_iter().map(to_comment).collect();
    Ok(Json(CommentsResponse {
        comments: tree::build_tree(flat),
    }))
}

/// POST /api/applications/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Path(application_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        db.db
            .add_comment(application_id, claims.sub, req.parent_id, &req.comment_text)
    })
    .await
    .map_err(ApiError::task)?
    .map_err(|e| match e {
        StoreError::NotFound => ApiError::NotFound("application or parent comment"),
        other => other.into(),
    })?;

    Ok((StatusCode::CREATED, Json(to_comment(row))))
}

/// PUT /api/comments/{id} — author only, text only.
pub async fn edit_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<EditCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        db.db.edit_comment(comment_id, claims.sub, &req.comment_text)
    })
    .await
    .map_err(ApiError::task)?
    .map_err(|e| match e {
        StoreError::NotFound => ApiError::NotFound("comment"),
        other => other.into(),
    })?;

    Ok(Json(to_comment(row)))
}

/// DELETE /api/comments/{id} — removes the comment and its direct replies.
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DeleteCommentResponse>, ApiError> {
    let db = state.clone();
    let removed = tokio::task::spawn_blocking(move || db.db.delete_comment(comment_id, claims.sub))
        .await
        .map_err(ApiError::task)?
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("comment"),
            other => other.into(),
        })?;

    Ok(Json(DeleteCommentResponse { removed }))
}

/// GET /api/applications/{id}/comments/count
pub async fn count_comments(
    State(state): State<AppState>,
    Path(application_id): Path<i64>,
) -> Result<Json<CommentCountResponse>, ApiError> {
    let db = state.clone();
    let count = tokio::task::spawn_blocking(move || db.db.count_comments(application_id))
        .await
        .map_err(ApiError::task)??;

    Ok(Json(CommentCountResponse { count }))
}

pub(crate) fn to_comment(row: CommentRow) -> Comment {
    Comment {
        id: row.id,
        application_id: row.application_id,
        user_id: row.user_id,
        user_name: row.user_name,
        parent_id: row.parent_id,
        comment_text: row.comment_text,
        created_at: timestamp_utc(&row.created_at),
    }
}
