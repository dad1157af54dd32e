//! Log-out route handler that invalidates the token cookie.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use crate::auth::{AuthState, cookie::invalidate_token_cookie};

/// Invalidate the token cookie.
///
/// This always succeeds, even if the client was not signed in.
pub async fn get_log_out(State(state): State<AuthState>, jar: CookieJar) -> Response {
    let jar = invalidate_token_cookie(jar, state.secure_cookies);

    (
        jar,
        Json(json!({
            "success": true,
            "message": "Logout successful",
        })),
    )
        .into_response()
}
