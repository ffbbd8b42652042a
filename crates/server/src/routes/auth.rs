use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::user::{CreateUser, User};
use serde::{Deserialize, Serialize};
use utils_core::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, http::auth::AuthUser};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::Internal(format!("Failed to hash password: {err}")))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::error!("Stored password hash is unparseable");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn validate_registration(payload: &RegisterRequest) -> Result<(), ApiError> {
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "Username must be 1-{MAX_USERNAME_LEN} characters"
        )));
    }
    if !payload.email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ResponseJson<ApiResponse<AuthResponse>>, ApiError> {
    validate_registration(&payload)?;

    let password_hash = hash_password(&payload.password)?;
    let user = User::create(
        state.db(),
        &CreateUser {
            username: payload.username.trim().to_string(),
            email: payload.email.trim().to_string(),
            password_hash,
        },
        Uuid::new_v4(),
    )
    .await?;

    tracing::info!(user_id = %user.id, "Registered user '{}'", user.username);

    let token = state.jwt().issue(user.id, state.token_ttl())?;
    Ok(ResponseJson(ApiResponse::success(AuthResponse {
        user,
        token,
    })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<AuthResponse>>, ApiError> {
    // Unknown usernames and wrong passwords are indistinguishable to the
    // caller.
    let credentials =
        User::find_credentials_by_username(state.db(), payload.username.trim()).await?;

    let Some(credentials) = credentials else {
        return Err(ApiError::Unauthorized);
    };
    if !verify_password(&payload.password, &credentials.password_hash) {
        tracing::warn!(user_id = %credentials.user.id, "Failed login attempt");
        return Err(ApiError::Unauthorized);
    }

    let token = state.jwt().issue(credentials.user.id, state.token_ttl())?;
    Ok(ResponseJson(ApiResponse::success(AuthResponse {
        user: credentials.user,
        token,
    })))
}

pub async fn me(
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// Endpoints reachable without a token.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Endpoints behind the auth middleware.
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}
