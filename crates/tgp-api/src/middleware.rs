use axum::{
    Extension,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use tgp_types::api::Claims;
use tgp_types::role::Capability;

use crate::error::ApiError;
use crate::{AppState, token};

/// Bearer token from the Authorization header, falling back to the `token`
/// cookie — the frontend uses the cookie for form posts and the header
/// everywhere else.
fn extract_token(req: &Request) -> Option<String> {
    let header_token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if let Some(token) = header_token {
        return Some(token.to_string());
    }

    CookieJar::from_headers(req.headers())
        .get("token")
        .map(|c| c.value().to_string())
}

/// Validate the caller's JWT and attach its claims to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&req);
    let claims = token::verify(&state.jwt_secret, token.as_deref())?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Compare the authenticated role against the capability's allow-list.
/// Runs after `require_auth`; the capability is the layer's state.
pub async fn require_capability(
    State(capability): State<Capability>,
    Extension(claims): Extension<Claims>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !capability.permits(claims.role) {
        return Err(ApiError::Forbidden("insufficient role permissions"));
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_headers(headers: &[(&str, &str)]) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn prefers_authorization_header() {
        let req = request_with_headers(&[
            ("authorization", "Bearer header-token"),
            ("cookie", "token=cookie-token"),
        ]);
        assert_eq!(extract_token(&req).as_deref(), Some("header-token"));
    }

    #[test]
    fn falls_back_to_cookie() {
        let req = request_with_headers(&[("cookie", "session=x; token=cookie-token")]);
        assert_eq!(extract_token(&req).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn no_credential_yields_none() {
        let req = request_with_headers(&[]);
        assert_eq!(extract_token(&req), None);
    }
}
