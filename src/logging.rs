//! Middleware for logging requests and responses.

use axum::{
    body::Bytes,
    extract::Request,
    http::{HeaderMap, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::Error;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// The fields in [REDACTED_FIELDS] of JSON bodies are never logged.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            return Error::MalformedBody(format!("could not read request body: {error}"))
                .into_response();
        }
    };

    log_request(&parts, &display_text(&parts.headers, &body_bytes));

    let request = Request::from_parts(parts, body_bytes.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes: Bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            return Error::ResponseBody(error.to_string()).into_response();
        }
    };
    log_response(&parts, &display_text(&parts.headers, &body_bytes));

    Response::from_parts(parts, body_bytes.into())
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/json"))
}

/// The JSON fields that hold credentials.
pub const REDACTED_FIELDS: [&str; 2] = ["password", "token"];

const REDACTED: &str = "********";

fn display_text(headers: &HeaderMap, body: &Bytes) -> String {
    let body_text = String::from_utf8_lossy(body);

    if is_json(headers) {
        redact_fields(&body_text, &REDACTED_FIELDS)
    } else {
        body_text.into_owned()
    }
}

/// Replace the value of every field named in `field_names`, at any depth of
/// a JSON document.
///
/// Text that is not JSON is returned as-is.
fn redact_fields(json_text: &str, field_names: &[&str]) -> String {
    let Ok(mut value) = serde_json::from_str::<Value>(json_text) else {
        return json_text.to_owned();
    };

    if redact_value(&mut value, field_names) {
        value.to_string()
    } else {
        json_text.to_owned()
    }
}

fn redact_value(value: &mut Value, field_names: &[&str]) -> bool {
    let mut redacted = false;

    match value {
        Value::Object(object) => {
            for (key, field) in object.iter_mut() {
                if field_names.contains(&key.as_str()) {
                    *field = Value::String(REDACTED.to_owned());
                    redacted = true;
                } else {
                    redacted |= redact_value(field, field_names);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                redacted |= redact_value(item, field_names);
            }
        }
        _ => {}
    }

    redacted
}

/// The number of characters of a body shown in `info` level logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(LOG_BODY_LENGTH_LIMIT) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {:}...",
            parts.method,
            parts.uri,
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {:}...",
            parts.status,
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}
