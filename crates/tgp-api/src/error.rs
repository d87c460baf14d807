use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tgp_db::StoreError;
use tracing::error;

/// Request failure taxonomy. Every variant renders as a `{ "message": ... }`
/// JSON body with the mapped status; storage internals are logged, never
/// returned to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authentication(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("internal storage error")]
    Storage(#[source] anyhow::Error),
}

impl ApiError {
    pub fn task(err: tokio::task::JoinError) -> Self {
        ApiError::Storage(err.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("resource"),
            StoreError::NotOwner => ApiError::Forbidden("only the author may modify a comment"),
            StoreError::EmptyText => {
                ApiError::Validation("comment text must not be empty".into())
            }
            StoreError::ReplyDepth => {
                ApiError::Validation("replies cannot be nested more than one level".into())
            }
            other => ApiError::Storage(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(source) => {
                error!("storage failure: {:#}", source);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(serde_json::json!({ "message": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_onto_http_taxonomy() {
        assert!(matches!(
            ApiError::from(StoreError::NotFound),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::NotOwner),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::EmptyText),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::ReplyDepth),
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn storage_variant_hides_internal_detail() {
        let err = ApiError::Storage(anyhow::anyhow!("disk exploded at /var/lib"));
        assert_eq!(err.to_string(), "internal storage error");
    }
}
