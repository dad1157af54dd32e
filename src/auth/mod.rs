//! Sign-up, sign-in and sign-out, and the signed-token cookie that keeps a
//! user signed in between requests.

mod cookie;
mod extractor;
mod log_out;
mod sign_in;
mod sign_up;
mod token;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

pub use cookie::{COOKIE_TOKEN, invalidate_token_cookie, set_token_cookie};
pub use log_out::get_log_out;
pub use sign_in::post_sign_in;
pub use sign_up::post_sign_up;
pub use token::{Claims, TOKEN_DURATION, TokenKeys, decode_token, encode_token};

use crate::AppState;

/// The state needed to register users and sign them in and out.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The database connection for reading and creating users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing tokens.
    pub token_keys: TokenKeys,
    /// Whether the token cookie should only be sent over HTTPS.
    pub secure_cookies: bool,
    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            token_keys: state.token_keys.clone(),
            secure_cookies: state.secure_cookies,
            password_cost: state.password_cost,
        }
    }
}

impl FromRef<AuthState> for TokenKeys {
    fn from_ref(state: &AuthState) -> Self {
        state.token_keys.clone()
    }
}
