use axum::http::StatusCode;
use axum_extra::extract::cookie::Cookie;
use axum_test::{TestResponse, TestServer};
use rusqlite::Connection;
use serde_json::Value;

use crate::{
    AppState, PasswordHash,
    auth::{COOKIE_TOKEN, TOKEN_DURATION, encode_token},
    build_router,
    user::{NewUser, User, create_user},
};

/// An app state backed by an in-memory database, with a cheap password hash cost.
pub(crate) fn get_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");

    AppState::new(connection, "42", false)
        .expect("Could not create app state")
        .with_password_cost(4)
}

/// A server for the full app router.
pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::new(build_router(state)).expect("Could not create test server.")
}

/// Register `username` directly in the database and return the user with a
/// token cookie that signs them in.
pub(crate) fn create_test_user(state: &AppState, username: &str) -> (User, Cookie<'static>) {
    let connection = state.db_connection.lock().unwrap();
    let user = create_user(
        NewUser {
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        },
        &connection,
    )
    .expect("Could not create test user");
    let token = encode_token(&user, &state.token_keys, TOKEN_DURATION)
        .expect("Could not create token");

    (user, Cookie::new(COOKIE_TOKEN, token))
}

/// Check the status code and the `{success, message}` envelope of a response,
/// then return the full body.
#[track_caller]
pub(crate) fn assert_envelope(
    response: &TestResponse,
    status: StatusCode,
    success: bool,
    message: &str,
) -> Value {
    response.assert_status(status);
    let body = response.json::<Value>();

    assert_eq!(body["success"], success, "unexpected body {body}");
    assert_eq!(body["message"], message, "unexpected body {body}");

    body
}
