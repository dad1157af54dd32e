//! The crate-wide error type and its conversion into a JSON failure envelope.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
///
/// Every error is rendered as `{"success": false, "message": ...}` so that
/// clients never receive an unstructured fault.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing or a field had an invalid value.
    ///
    /// The string is shown to the client as-is.
    #[error("{0}")]
    InvalidInput(String),

    /// The request body could not be parsed as the expected JSON document.
    #[error("invalid request body: {0}")]
    MalformedBody(String),

    /// A user with the same username or email is already registered.
    #[error("User already exists. Please use a different username or email.")]
    UserAlreadyExists,

    /// No user matched the email or username given at sign-in.
    #[error("No such user found")]
    UnknownUser,

    /// The password given at sign-in did not match the stored hash.
    #[error("Invalid password.")]
    InvalidPassword,

    /// The request did not carry a token cookie.
    #[error("Authorization token is required.")]
    MissingToken,

    /// The token cookie could not be verified or has expired.
    #[error("Invalid or expired token.")]
    InvalidToken,

    /// The caller tried to act on a resource owned by another user.
    ///
    /// The string is shown to the client as-is.
    #[error("{0}")]
    Forbidden(String),

    /// The user referenced by a valid token no longer exists.
    #[error("User not found.")]
    UserNotFound,

    /// The requested transaction does not exist.
    #[error("Transaction not found.")]
    TransactionNotFound,

    /// The requested budget does not exist.
    #[error("Budget not found.")]
    BudgetNotFound,

    /// The requested resource was not found.
    ///
    /// Internally, this error occurs when a query returns no rows. Handlers
    /// should replace it with a more specific variant where one exists.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A signed token could not be created.
    ///
    /// The error string should only be logged on the server.
    #[error("token creation failed: {0}")]
    TokenCreation(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A response body could not be buffered for logging.
    #[error("could not read the response body: {0}")]
    ResponseBody(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && (desc.contains("user.username") || desc.contains("user.email")) =>
            {
                Error::UserAlreadyExists
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::MalformedBody(rejection.body_text())
    }
}

impl Error {
    /// The HTTP status code used when rendering this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) | Error::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Error::UnknownUser
            | Error::InvalidPassword
            | Error::MissingToken
            | Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::UserNotFound
            | Error::TransactionNotFound
            | Error::BudgetNotFound
            | Error::NotFound => StatusCode::NOT_FOUND,
            Error::UserAlreadyExists => StatusCode::CONFLICT,
            Error::TokenCreation(_)
            | Error::HashingError(_)
            | Error::ResponseBody(_)
            | Error::DatabaseLockError
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The message sent to clients for server-side failures.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error.";

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server-side details are not intended to be shown to the client.
        let message = if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
            INTERNAL_ERROR_MESSAGE.to_owned()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}
