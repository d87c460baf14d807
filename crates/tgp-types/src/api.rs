use serde::{Deserialize, Serialize};

use crate::models::CommentThread;
use crate::role::Role;

// -- JWT Claims --

/// JWT claims carried by every authenticated request. Canonical definition
/// lives here so the token module and the middleware share one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: i64,
    pub role: Role,
    pub token: String,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddCommentRequest {
    pub comment_text: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditCommentRequest {
    pub comment_text: String,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<CommentThread>,
}

#[derive(Debug, Serialize)]
pub struct DeleteCommentResponse {
    /// Rows removed: the comment itself plus its direct replies.
    pub removed: usize,
}

#[derive(Debug, Serialize)]
pub struct CommentCountResponse {
    pub count: i64,
}
