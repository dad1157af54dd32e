//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{Error, PasswordHash, auth::TokenKeys, db::initialize};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The keys used for signing and verifying tokens.
    pub token_keys: TokenKeys,

    /// Whether the token cookie is marked `Secure`.
    pub secure_cookies: bool,

    /// The bcrypt cost used for hashing new passwords.
    pub password_cost: u32,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        token_secret: &str,
        secure_cookies: bool,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            token_keys: TokenKeys::new(token_secret),
            secure_cookies,
            password_cost: PasswordHash::DEFAULT_COST,
        })
    }

    /// Use `cost` when hashing new passwords.
    ///
    /// Tests use a low cost to keep sign-up fast.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        state.token_keys.clone()
    }
}
