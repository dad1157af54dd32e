//! Lets route handlers take [Claims] as an argument to require a signed-in user.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;

use crate::{
    Error,
    auth::{
        cookie::get_token_from_cookies,
        token::{Claims, TokenKeys, decode_token},
    },
};

impl<S> FromRequestParts<S> for Claims
where
    TokenKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = get_token_from_cookies(&jar).ok_or(Error::MissingToken)?;
        let keys = TokenKeys::from_ref(state);

        decode_token(&token, &keys)
    }
}
