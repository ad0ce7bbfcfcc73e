//! Account creation and login.
//!
//! Sits in front of the signaling hub: a browser logs in here, then joins a
//! room with the display name it got back. The hub itself never sees
//! credentials.

use std::fmt;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use dashmap::DashMap;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::app_state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateAccountError {
    DuplicateEmail,
    InvalidInput(&'static str),
}

impl fmt::Display for CreateAccountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateAccountError::DuplicateEmail => write!(f, "email is already registered"),
            CreateAccountError::InvalidInput(reason) => write!(f, "invalid input: {reason}"),
        }
    }
}

impl std::error::Error for CreateAccountError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "invalid email or password"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Pluggable account backend.
pub trait AccountService: Send + Sync {
    fn create_account(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), CreateAccountError>;

    /// Check credentials; returns the display name to join rooms with.
    fn authenticate(&self, email: &str, password: &str) -> Result<String, AuthError>;
}

#[derive(Debug, Clone)]
struct AccountEntry {
    full_name: String,
    salt: [u8; 16],
    hash: [u8; 32],
}

/// Process-local accounts, lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    // normalized email -> entry
    accounts: DashMap<String, AccountEntry>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountService for InMemoryAccountStore {
    fn create_account(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), CreateAccountError> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(CreateAccountError::InvalidInput("full name is required"));
        }
        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(CreateAccountError::InvalidInput("email is not valid"));
        }
        if password.trim().is_empty() || password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CreateAccountError::InvalidInput(
                "password must be at least 6 characters",
            ));
        }

        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        let entry = AccountEntry {
            full_name: full_name.to_string(),
            salt,
            hash: hash_password(password, &salt),
        };

        // Entry API keeps check-and-insert atomic per key.
        match self.accounts.entry(email) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(CreateAccountError::DuplicateEmail),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                tracing::info!(email = %slot.key(), "account created");
                slot.insert(entry);
                Ok(())
            }
        }
    }

    fn authenticate(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let entry = self
            .accounts
            .get(&normalize_email(email))
            .ok_or(AuthError::InvalidCredentials)?;

        if hash_password(password, &entry.salt) == entry.hash {
            Ok(entry.full_name.clone())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str, salt: &[u8; 16]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub display_name: String,
}

/// POST /api/accounts
pub async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountResponse>), (StatusCode, String)> {
    let Json(req) = payload.map_err(bad_request)?;
    state
        .accounts
        .create_account(&req.full_name, &req.email, &req.password)
        .map_err(|err| match err {
            CreateAccountError::DuplicateEmail => (StatusCode::CONFLICT, err.to_string()),
            CreateAccountError::InvalidInput(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            display_name: req.full_name.trim().to_string(),
        }),
    ))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AccountResponse>, (StatusCode, String)> {
    let Json(req) = payload.map_err(bad_request)?;
    match state.accounts.authenticate(&req.email, &req.password) {
        Ok(display_name) => Ok(Json(AccountResponse { display_name })),
        Err(err) => {
            tracing::debug!(email = %req.email, "login rejected");
            Err((StatusCode::UNAUTHORIZED, err.to_string()))
        }
    }
}

// Malformed or incomplete bodies are invalid input, not axum's 415/422.
fn bad_request(rejection: JsonRejection) -> (StatusCode, String) {
    (
        StatusCode::BAD_REQUEST,
        format!("invalid input: {}", rejection.body_text()),
    )
}
