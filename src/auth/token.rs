//! Defines the signed token carried in the auth cookie and how to encode and
//! verify it.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::User, user::UserID};

// Code in this module is adapted from https://github.com/tokio-rs/axum/blob/main/examples/jwt/src/main.rs

/// How long a token is valid for after it is issued.
pub const TOKEN_DURATION: Duration = Duration::days(1);

/// The keys used to sign and verify tokens, derived from one shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenKeys {
    /// Create the signing and verification keys from `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys").finish_non_exhaustive()
    }
}

/// The contents of a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the signed-in user.
    pub id: UserID,
    /// The username of the signed-in user at the time the token was issued.
    pub username: String,
    /// The email of the signed-in user at the time the token was issued.
    pub email: String,
    /// The time the token was issued, as a unix timestamp.
    pub iat: i64,
    /// The expiry time of the token, as a unix timestamp.
    pub exp: i64,
}

/// Create a signed token for `user` that expires after `duration`.
///
/// # Errors
///
/// Returns an [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(user: &User, keys: &TokenKeys, duration: Duration) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        iat: now.unix_timestamp(),
        exp: (now + duration).unix_timestamp(),
    };

    encode(&Header::default(), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify `token` and return its claims.
///
/// # Errors
///
/// Returns an [Error::InvalidToken] if the signature does not match or the token has expired.
pub fn decode_token(token: &str, keys: &TokenKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, &keys.decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected token: {error}");
            Error::InvalidToken
        })
}
