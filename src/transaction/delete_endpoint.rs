//! Defines the endpoint for deleting a transaction.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    Error,
    auth::Claims,
    database_id::TransactionId,
    transaction::{
        TransactionState,
        core::{delete_transaction, get_owned_transaction},
    },
};

/// The body of a delete request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTransactionData {
    pub transaction_id: Option<TransactionId>,
}

/// A route handler for deleting one of the signed-in user's transactions.
///
/// The transaction is also removed from the user's transaction list.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    claims: Claims,
    body: Result<Json<DeleteTransactionData>, JsonRejection>,
) -> Response {
    match delete(&state, &claims, body) {
        Ok(()) => Json(json!({
            "success": true,
            "message": "Transaction deleted successfully.",
        }))
        .into_response(),
        Err(error) => error.into_response(),
    }
}

fn delete(
    state: &TransactionState,
    claims: &Claims,
    body: Result<Json<DeleteTransactionData>, JsonRejection>,
) -> Result<(), Error> {
    let Json(data) = body?;
    let transaction_id = data
        .transaction_id
        .ok_or_else(|| Error::InvalidInput("Transaction ID is required.".to_owned()))?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_owned_transaction(transaction_id, claims.id, "delete", &connection)?;
    delete_transaction(transaction_id, claims.id, &connection).map_err(|error| match error {
        Error::NotFound => Error::TransactionNotFound,
        error => error,
    })?;

    tracing::debug!("Deleted transaction {transaction_id} for user {}", claims.id);

    Ok(())
}
