//! Code for creating the user tables, fetching users, and maintaining each
//! user's ordered lists of owned transaction and budget references.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    AppState, Error, PasswordHash,
    auth::Claims,
    database_id::{BudgetId, TransactionId},
};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The unique name the user signs in with.
    pub username: String,
    /// The user's unique email address, also accepted at sign-in.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// When the user signed up.
    pub created_at: OffsetDateTime,
}

/// The data needed to register a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: PasswordHash,
}

/// The public view of a user that is safe to send to clients.
///
/// The password hash and the transaction references are never included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserID,
    pub username: String,
    pub email: String,
    /// The IDs of the user's budgets, oldest first.
    pub budgets: Vec<BudgetId>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UserProfile {
    /// Build the public view of `user`.
    pub fn new(user: User, budgets: Vec<BudgetId>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            budgets,
            created_at: user.created_at,
        }
    }
}

/// Create the user table and the tables holding each user's reference lists.
///
/// The reference tables keep insertion order through their row IDs.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_transaction_ref (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                transaction_id INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_budget_ref (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                budget_id INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: row.get(4)?,
    })
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::UserAlreadyExists] if the username or email is taken,
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "INSERT INTO user (username, email, password, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, username, email, password, created_at",
        )?
        .query_row(
            (
                &new_user.username,
                &new_user.email,
                new_user.password_hash.as_ref(),
                OffsetDateTime::now_utc(),
            ),
            map_user_row,
        )
        .map_err(|error| error.into())
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user ([Error::NotFound]),
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, email, password, created_at FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user whose email or username equals `identifier`.
///
/// # Errors
///
/// This function will return an error if:
/// - no user has that email or username ([Error::NotFound]),
/// - there was an error trying to access the store.
pub fn get_user_by_identifier(identifier: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, email, password, created_at FROM user
             WHERE email = :identifier OR username = :identifier",
        )?
        .query_row(&[(":identifier", identifier)], map_user_row)
        .map_err(|error| error.into())
}

/// Append `transaction_id` to the end of the user's transaction list.
pub fn push_transaction_ref(
    user_id: UserID,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO user_transaction_ref (user_id, transaction_id) VALUES (?1, ?2)",
        (user_id.as_i64(), transaction_id),
    )?;

    Ok(())
}

/// Remove every occurrence of `transaction_id` from the user's transaction list.
///
/// Returns the number of references removed.
pub fn pull_transaction_ref(
    user_id: UserID,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM user_transaction_ref WHERE user_id = ?1 AND transaction_id = ?2",
            (user_id.as_i64(), transaction_id),
        )
        .map_err(|error| error.into())
}

/// The user's transaction references in insertion order.
pub fn get_transaction_refs(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<TransactionId>, Error> {
    connection
        .prepare("SELECT transaction_id FROM user_transaction_ref WHERE user_id = :user_id ORDER BY id")?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| row.get(0))?
        .map(|maybe_id| maybe_id.map_err(Error::from))
        .collect()
}

/// Append `budget_id` to the end of the user's budget list.
pub fn push_budget_ref(
    user_id: UserID,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO user_budget_ref (user_id, budget_id) VALUES (?1, ?2)",
        (user_id.as_i64(), budget_id),
    )?;

    Ok(())
}

/// Remove every occurrence of `budget_id` from the user's budget list.
///
/// Returns the number of references removed.
pub fn pull_budget_ref(
    user_id: UserID,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM user_budget_ref WHERE user_id = ?1 AND budget_id = ?2",
            (user_id.as_i64(), budget_id),
        )
        .map_err(|error| error.into())
}

/// The user's budget references in insertion order.
pub fn get_budget_refs(user_id: UserID, connection: &Connection) -> Result<Vec<BudgetId>, Error> {
    connection
        .prepare("SELECT budget_id FROM user_budget_ref WHERE user_id = :user_id ORDER BY id")?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| row.get(0))?
        .map(|maybe_id| maybe_id.map_err(Error::from))
        .collect()
}

/// Load `user_id` and build their public profile.
///
/// # Errors
///
/// Returns an [Error::UserNotFound] if the user does not exist.
pub fn get_user_profile(user_id: UserID, connection: &Connection) -> Result<UserProfile, Error> {
    let user = get_user_by_id(user_id, connection).map_err(|error| match error {
        Error::NotFound => Error::UserNotFound,
        error => error,
    })?;
    let budgets = get_budget_refs(user_id, connection)?;

    Ok(UserProfile::new(user, budgets))
}

/// The state needed to look up user info.
#[derive(Debug, Clone)]
pub struct UserState {
    /// The database connection for reading users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns the signed-in user's profile.
pub async fn get_user_info_endpoint(State(state): State<UserState>, claims: Claims) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(_) => return Error::DatabaseLockError.into_response(),
    };

    match get_user_profile(claims.id, &connection) {
        Ok(user) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "User information retrieved successfully.",
                "user": user,
            })),
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}
