use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use tgp_types::api::{AuthResponse, LoginRequest, SignupRequest};
use tgp_types::role::Role;

use crate::error::ApiError;
use crate::{AppState, token};

/// POST /api/auth/signup/{role}
pub async fn signup(
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = Role::parse(&role).ok_or_else(|| ApiError::Validation("invalid role".into()))?;

    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(ApiError::Validation("name and email are required".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    if state.db.get_user_by_email(req.email.trim())?.is_some() {
        return Err(ApiError::Validation("user already exists".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("password hashing failed: {e}")))?
        .to_string();

    let user_id = state
        .db
        .create_user(req.name.trim(), req.email.trim(), &password_hash, role.as_str())?;

    let jwt = token::issue(&state.jwt_secret, user_id, role)?;

    info!("Registered {} account for user {}", role, user_id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id,
            role,
            token: jwt,
        }),
    ))
}

/// POST /api/auth/login/{role} — lookup is by email and role together, so a
/// credential only opens the dashboard it was registered for.
pub async fn login(
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = Role::parse(&role).ok_or_else(|| ApiError::Validation("invalid role".into()))?;

    let user = state
        .db
        .get_user_by_email_and_role(req.email.trim(), role.as_str())?
        .ok_or(ApiError::NotFound("user"))?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("corrupt password hash: {e}")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Authentication("incorrect password"))?;

    let jwt = token::issue(&state.jwt_secret, user.id, role)?;

    Ok(Json(AuthResponse {
        user_id: user.id,
        role,
        token: jwt,
    }))
}
