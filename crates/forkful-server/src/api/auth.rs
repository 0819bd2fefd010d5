//! Registration, login and credential verification.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use forkful_shared::identity::{normalize_email, validate_registration, RegistrationInput, Role};
use forkful_shared::password::{hash_password, verify_password};
use forkful_shared::validation::non_blank;
use forkful_shared::ValidationErrors;
use forkful_store::{Restaurant, StoreError, User};

use super::{ApiJson, AppState};
use crate::credential::AuthUser;
use crate::error::ServerError;

/// The public part of a user returned alongside a fresh token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<Uuid>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            name: user.name.clone(),
            restaurant_id: user.restaurant_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegistrationInput>,
) -> Result<(StatusCode, Json<RegisterResponse>), ServerError> {
    let registration = validate_registration(&input, state.config.admin_email.as_deref())?;

    if state
        .db
        .lock()
        .await
        .find_user_by_email(&registration.email)?
        .is_some()
    {
        return Err(ServerError::validation("email", "Email already in use"));
    }

    let password = registration.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let now = Utc::now();
    let mut user = User {
        id: Uuid::new_v4(),
        name: registration.name,
        email: registration.email,
        password_hash,
        role: registration.role,
        restaurant_id: None,
        created_at: now,
    };
    let restaurant = registration.restaurant.map(|draft| Restaurant {
        id: Uuid::new_v4(),
        name: draft.name,
        description: draft.description,
        address: draft.address,
        phone: draft.phone,
        owner_id: user.id,
        created_at: now,
    });
    user.restaurant_id = restaurant.as_ref().map(|r| r.id);

    state
        .db
        .lock()
        .await
        .register_user(&user, restaurant.as_ref())?;

    let token = state.tokens.issue(user.id, user.role, user.restaurant_id)?;

    info!(
        user_id = %user.id,
        role = %user.role,
        restaurant_id = ?user.restaurant_id,
        "User registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully",
            token,
            user: UserSummary::from(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<Json<LoginResponse>, ServerError> {
    let email = non_blank(input.email.as_deref()).map(|e| normalize_email(&e));
    let password = input.password.unwrap_or_default();

    let mut missing = ValidationErrors::new();
    if email.is_none() {
        missing.push("email", "Email is required");
    }
    if password.is_empty() {
        missing.push("password", "Password is required");
    }
    let email = missing.into_result(email.unwrap_or_default())?;

    let user = state.db.lock().await.find_user_by_email(&email)?;
    let Some(user) = user else {
        debug!("Login for unknown email");
        return Err(ServerError::invalid_credentials());
    };

    let stored_hash = user.password_hash.clone();
    let matches =
        tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await?;
    if !matches {
        debug!(user_id = %user.id, "Login with wrong password");
        return Err(ServerError::invalid_credentials());
    }

    let token = state.tokens.issue(user.id, user.role, user.restaurant_id)?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

/// The caller's stored profile, without the password hash.
pub async fn verify(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<User>, ServerError> {
    match state.db.lock().await.get_user(caller.user_id) {
        Ok(user) => Ok(Json(user)),
        Err(StoreError::NotFound) => Err(ServerError::NotFound("User not found".to_string())),
        Err(e) => Err(e.into()),
    }
}
