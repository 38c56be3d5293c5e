//! Authentication endpoints
//!
//! Passwords are stored and compared as Argon2 hashes only. There is no
//! session or token layer; login answers whether the credentials are valid.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::store::{StoreError, User};
use crate::AppState;

const INVALID_CREDENTIALS: &str = "invalid username or password";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub username: String,
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Handler for POST /api/auth/register
pub async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if request.password.is_empty() {
        return Err(ApiError::bad_request("password must not be empty"));
    }

    let hash = hash_password(&request.password)?;
    let user = state
        .store
        .create_user(&request.username, &request.email, &hash)
        .await?;

    info!(username = %user.username, "registered user");
    Ok(Json(user.into()))
}

/// Handler for POST /api/auth/login
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = find_user(&state, &request.username).await?;
    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }
    Ok(Json(user.into()))
}

/// Handler for POST /api/auth/change-password
pub async fn change_password_handler(
    State(state): State<AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = find_user(&state, &request.username).await?;
    if !verify_password(&request.current_password, &user.password_hash) {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }
    if request.new_password.is_empty() {
        return Err(ApiError::bad_request("password must not be empty"));
    }

    let hash = hash_password(&request.new_password)?;
    state.store.update_password(user.id, &hash).await?;

    info!(username = %user.username, "password changed");
    Ok(Json(user.into()))
}

/// An unknown username answers the same way as a wrong password.
async fn find_user(state: &AppState, username: &str) -> Result<User, ApiError> {
    match state.store.user_by_username(username).await {
        Ok(user) => Ok(user),
        Err(StoreError::NotFound) => Err(ApiError::unauthorized(INVALID_CREDENTIALS)),
        Err(other) => Err(other.into()),
    }
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("same").unwrap();
        let second = hash_password("same").unwrap();
        assert_ne!(first, second);
    }
}
