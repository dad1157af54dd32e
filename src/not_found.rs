//! The fallback handler for unknown routes.

use axum::{
    Json,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Respond with 404 Not Found in the same envelope as every other response.
pub async fn get_404_not_found(uri: Uri) -> Response {
    tracing::debug!("No route for {uri}");

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": format!("No route found for {}.", uri.path()),
        })),
    )
        .into_response()
}
