//! The route handler for registering a new user.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use serde::Deserialize;
use serde_json::json;

use crate::{
    Error, PasswordHash,
    auth::{AuthState, token::{TOKEN_DURATION, encode_token}},
    user::{NewUser, create_user},
};

/// The raw data sent by the client to register.
#[derive(Debug, Deserialize)]
pub struct SignUpData {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Handler for sign-up requests.
///
/// On success, responds with 201 Created and a token the client may use to
/// sign in straight away.
///
/// # Errors
///
/// Responds with a failure envelope if:
/// - any field is missing or empty,
/// - the email is not a valid email address,
/// - the username or email is already registered,
/// - an internal error occurred while hashing the password or saving the user.
pub async fn post_sign_up(
    State(state): State<AuthState>,
    body: Result<Json<SignUpData>, JsonRejection>,
) -> Response {
    match sign_up(&state, body) {
        Ok(token) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "Account created successfully!",
                "token": token,
            })),
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}

fn sign_up(
    state: &AuthState,
    body: Result<Json<SignUpData>, JsonRejection>,
) -> Result<String, Error> {
    let Json(data) = body?;

    let (username, email, password) = match (data.username, data.email, data.password) {
        (Some(username), Some(email), Some(password))
            if !username.trim().is_empty() && !email.trim().is_empty() && !password.is_empty() =>
        {
            (username.trim().to_owned(), email.trim().to_owned(), password)
        }
        _ => return Err(Error::InvalidInput("All fields are required.".to_owned())),
    };

    if !EmailAddress::is_valid(&email) {
        return Err(Error::InvalidInput(format!(
            "\"{email}\" is not a valid email address."
        )));
    }

    let password_hash = PasswordHash::new(&password, state.password_cost)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let user = create_user(
        NewUser {
            username,
            email,
            password_hash,
        },
        &connection,
    )?;

    tracing::info!("Registered user {} ({})", user.username, user.id);

    encode_token(&user, &state.token_keys, TOKEN_DURATION)
}
