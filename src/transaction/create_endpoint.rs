//! Defines the endpoint for creating a new transaction.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    Error,
    auth::Claims,
    transaction::{Transaction, TransactionData, TransactionState, core::create_transaction},
};

/// A route handler for creating a new transaction owned by the signed-in user.
///
/// Responds with 201 Created and the new transaction on success.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    claims: Claims,
    body: Result<Json<TransactionData>, JsonRejection>,
) -> Response {
    match create(&state, &claims, body) {
        Ok(transaction) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "Transaction created successfully.",
                "transaction": transaction,
            })),
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}

fn create(
    state: &TransactionState,
    claims: &Claims,
    body: Result<Json<TransactionData>, JsonRejection>,
) -> Result<Transaction, Error> {
    let Json(data) = body?;
    let new_transaction = data.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(claims.id, new_transaction, &connection)?;
    tracing::debug!(
        "Created transaction {} for user {}",
        transaction.id,
        claims.id
    );

    Ok(transaction)
}
