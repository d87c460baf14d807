//! Credential issuance and verification. Pure functions over a shared
//! secret; no transport concerns and no refresh mechanism — expiry is
//! enforced by verification failing.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use tgp_types::api::Claims;
use tgp_types::role::Role;

use crate::error::ApiError;

/// Tokens are valid for one hour.
const TOKEN_TTL_SECS: i64 = 3600;

pub fn issue(secret: &str, user_id: i64, role: Role) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        role,
        exp: (Utc::now().timestamp() + TOKEN_TTL_SECS) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Storage(e.into()))
}

/// Validate a bearer token and return its claims. `None` means the caller
/// sent no token at all.
pub fn verify(secret: &str, token: Option<&str>) -> Result<Claims, ApiError> {
    let token = token.ok_or(ApiError::Authentication("no token provided"))?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Authentication("invalid or expired token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issue_verify_roundtrip() {
        let token = issue(SECRET, 7, Role::AppComm).unwrap();
        let claims = verify(SECRET, Some(&token)).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, Role::AppComm);
    }

    #[test]
    fn missing_token_is_an_authentication_error() {
        let err = verify(SECRET, None).unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }

    #[test]
    fn wrong_secret_fails() {
        let token = issue(SECRET, 7, Role::Admin).unwrap();
        assert!(verify("other-secret", Some(&token)).is_err());
    }

    #[test]
    fn garbage_token_fails() {
        assert!(verify(SECRET, Some("not.a.jwt")).is_err());
    }

    #[test]
    fn expired_token_fails() {
        let claims = Claims {
            sub: 7,
            role: Role::Applicant,
            exp: (Utc::now().timestamp() - 7200) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(verify(SECRET, Some(&token)).is_err());
    }
}
