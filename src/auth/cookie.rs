//! Defines functions for storing the signed token in a cookie.

use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use super::token::TOKEN_DURATION;

/// The name of the cookie holding the signed token.
pub const COOKIE_TOKEN: &str = "token";

/// Add the token cookie to the cookie jar, indicating that a user is signed in.
///
/// The cookie lives as long as the token itself. `secure` controls whether
/// browsers only send the cookie over HTTPS.
pub fn set_token_cookie(jar: CookieJar, token: String, secure: bool) -> CookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, token))
            .max_age(TOKEN_DURATION)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(secure),
    )
}

/// Set the token cookie to an empty value that has already expired, which should delete the cookie on the client side.
pub fn invalidate_token_cookie(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, ""))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(secure),
    )
}

/// Get the raw token from the cookie jar, treating an empty cookie as absent.
pub fn get_token_from_cookies(jar: &CookieJar) -> Option<String> {
    jar.get(COOKIE_TOKEN)
        .map(|cookie| cookie.value_trimmed().to_owned())
        .filter(|token| !token.is_empty())
}
