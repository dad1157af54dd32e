//! The route handler for signing in with an email or username and a password.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::{
    Error,
    auth::{
        AuthState,
        cookie::set_token_cookie,
        token::{TOKEN_DURATION, encode_token},
    },
    database_id::BudgetId,
    user::{User, UserProfile, get_budget_refs, get_user_by_identifier},
};

/// The raw data entered by the user on sign in.
#[derive(Debug, Deserialize)]
pub struct SignInData {
    /// Either the email or the username of the user.
    pub identifier: Option<String>,
    pub password: Option<String>,
}

/// Handler for sign-in requests.
///
/// On success, sets the token cookie and responds with the user's profile.
///
/// # Errors
///
/// Responds with a failure envelope if:
/// - the identifier or password is missing,
/// - no user has the given email or username,
/// - the password is wrong.
pub async fn post_sign_in(
    State(state): State<AuthState>,
    jar: CookieJar,
    body: Result<Json<SignInData>, JsonRejection>,
) -> Response {
    match sign_in(&state, body) {
        Ok((token, user)) => (
            StatusCode::OK,
            set_token_cookie(jar, token, state.secure_cookies),
            Json(json!({
                "success": true,
                "message": "Login successful",
                "user": user,
            })),
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}

fn sign_in(
    state: &AuthState,
    body: Result<Json<SignInData>, JsonRejection>,
) -> Result<(String, UserProfile), Error> {
    let Json(data) = body?;

    let (identifier, password) = match (data.identifier, data.password) {
        (Some(identifier), Some(password))
            if !identifier.trim().is_empty() && !password.is_empty() =>
        {
            (identifier.trim().to_owned(), password)
        }
        _ => {
            return Err(Error::InvalidInput(
                "Identifier (email/username) and password are required.".to_owned(),
            ));
        }
    };

    let (user, budgets) = find_user(state, &identifier)?;

    let is_password_correct = user
        .password_hash
        .verify(&password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_correct {
        tracing::debug!("Rejected sign in for user {}: wrong password", user.id);
        return Err(Error::InvalidPassword);
    }

    let token = encode_token(&user, &state.token_keys, TOKEN_DURATION)?;

    Ok((token, UserProfile::new(user, budgets)))
}

/// Load the user with the email or username `identifier` and their budget IDs.
///
/// The database lock is released on return, so password verification does
/// not block other requests.
fn find_user(state: &AuthState, identifier: &str) -> Result<(User, Vec<BudgetId>), Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_identifier(identifier, &connection).map_err(|error| match error {
        Error::NotFound => Error::UnknownUser,
        error => error,
    })?;
    let budgets = get_budget_refs(user.id, &connection)?;

    Ok((user, budgets))
}

#[cfg(test)]
mod sign_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        Error, PasswordHash,
        auth::{AuthState, COOKIE_TOKEN, TokenKeys, decode_token, post_sign_in},
        initialize_db,
        user::{NewUser, create_user},
    };

    use super::find_user;

    fn get_test_state() -> AuthState {
        let connection = Connection::open_in_memory().unwrap();
        initialize_db(&connection).unwrap();
        create_user(
            NewUser {
                username: "alice".to_owned(),
                email: "alice@example.com".to_owned(),
                password_hash: PasswordHash::new("hunter2", 4).unwrap(),
            },
            &connection,
        )
        .unwrap();

        AuthState {
            db_connection: Arc::new(Mutex::new(connection)),
            token_keys: TokenKeys::new("foobar"),
            secure_cookies: false,
            password_cost: 4,
        }
    }

    fn get_test_server(state: AuthState) -> TestServer {
        let app = Router::new()
            .route("/api/sign-in", post(post_sign_in))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn sign_in_with_username_sets_cookie() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post("/api/sign-in")
            .json(&json!({ "identifier": "alice", "password": "hunter2" }))
            .await;

        response.assert_status_ok();
        let token = response.cookie(COOKIE_TOKEN).value().to_owned();
        let claims = decode_token(&token, &state.token_keys).unwrap();
        assert_eq!(claims.username, "alice");

        let body = response.json::<Value>();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Login successful");
        assert_eq!(body["user"]["username"], "alice");
        assert!(body["user"].get("password").is_none());
        assert!(body["user"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn sign_in_with_email_succeeds() {
        let server = get_test_server(get_test_state());

        server
            .post("/api/sign-in")
            .json(&json!({ "identifier": "alice@example.com", "password": "hunter2" }))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn sign_in_fails_with_wrong_password() {
        let server = get_test_server(get_test_state());

        let response = server
            .post("/api/sign-in")
            .json(&json!({ "identifier": "alice", "password": "hunter3" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["message"], "Invalid password.");
        assert!(response.maybe_cookie(COOKIE_TOKEN).is_none());
    }

    #[tokio::test]
    async fn sign_in_fails_with_unknown_user() {
        let server = get_test_server(get_test_state());

        let response = server
            .post("/api/sign-in")
            .json(&json!({ "identifier": "bob", "password": "hunter2" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["message"], "No such user found");
    }

    #[tokio::test]
    async fn sign_in_fails_with_missing_password() {
        let server = get_test_server(get_test_state());

        let response = server
            .post("/api/sign-in")
            .json(&json!({ "identifier": "alice" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["message"],
            "Identifier (email/username) and password are required."
        );
    }

    #[test]
    fn user_lookup_releases_database_lock() {
        let state = get_test_state();

        let (user, budgets) = find_user(&state, "alice@example.com").unwrap();

        assert_eq!(user.username, "alice");
        assert!(budgets.is_empty());
        assert!(
            state.db_connection.try_lock().is_ok(),
            "database lock held after the user lookup"
        );
    }

    #[test]
    fn user_lookup_maps_missing_user() {
        let state = get_test_state();

        assert_eq!(
            find_user(&state, "bob").map(|_| ()),
            Err(Error::UnknownUser)
        );
    }
}
