//! Defines the endpoint for listing the signed-in user's transactions.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    Error,
    auth::Claims,
    transaction::{TransactionState, core::get_user_transactions},
};

/// A route handler that returns the signed-in user's transactions, newest first.
///
/// An empty list is reported with `success: false`, which clients use to
/// show an empty state.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    claims: Claims,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(_) => return Error::DatabaseLockError.into_response(),
    };

    match get_user_transactions(claims.id, &connection) {
        Ok(transactions) if transactions.is_empty() => Json(json!({
            "success": false,
            "message": "No transactions found.",
            "transactions": transactions,
        }))
        .into_response(),
        Ok(transactions) => Json(json!({
            "success": true,
            "message": "Transactions retrieved successfully.",
            "transactions": transactions,
        }))
        .into_response(),
        Err(error) => error.into_response(),
    }
}
