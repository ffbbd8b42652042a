use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use db::models::user::User;
use utils_core::response::ApiResponse;
use utils_jwt::JwtError;

use crate::AppState;

/// The authenticated caller, inserted as a request extension once the
/// bearer token has been resolved to a stored user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn unauthorized(message: &str) -> Response {
    let response = ApiResponse::<()>::error(message);
    (StatusCode::UNAUTHORIZED, Json(response)).into_response()
}

pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(token) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
    else {
        tracing::warn!(
            path = %req.uri().path(),
            method = %req.method(),
            reason = "missing_token",
            "Unauthorized API request"
        );
        return unauthorized("Unauthorized");
    };

    let claims = match state.jwt().verify(token) {
        Ok(claims) => claims,
        Err(JwtError::Expired) => return unauthorized("Token expired. Please sign in again."),
        Err(_) => {
            tracing::warn!(
                path = %req.uri().path(),
                reason = "invalid_token",
                "Unauthorized API request"
            );
            return unauthorized("Unauthorized");
        }
    };

    let user = match User::find_by_id(state.db(), claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            // Token outlived the account.
            return unauthorized("Unauthorized");
        }
        Err(err) => {
            tracing::error!("Failed to load authenticated user: {err}");
            let response = ApiResponse::<()>::error("Internal server error");
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response();
        }
    };

    let mut req = req;
    req.extensions_mut().insert(AuthUser(user));
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::parse_authorization_bearer;

    #[test]
    fn bearer_parsing_accepts_case_variants_and_rejects_garbage() {
        assert_eq!(parse_authorization_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_authorization_bearer("bearer abc"), Some("abc"));
        assert_eq!(parse_authorization_bearer("  Bearer   abc  "), Some("abc"));
        assert_eq!(parse_authorization_bearer("Basic abc"), None);
        assert_eq!(parse_authorization_bearer("Bearer "), None);
        assert_eq!(parse_authorization_bearer("abc"), None);
    }
}
