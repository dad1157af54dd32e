//! Defines the endpoint for editing a transaction.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    Error,
    auth::Claims,
    database_id::TransactionId,
    transaction::{
        Transaction, TransactionData, TransactionState,
        core::{get_owned_transaction, update_transaction},
    },
};

/// The body of an edit request: the transaction to edit and its new fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTransactionData {
    pub transaction_id: Option<TransactionId>,
    #[serde(flatten)]
    pub fields: TransactionData,
}

/// A route handler for overwriting the amount, date, description and category
/// of one of the signed-in user's transactions.
///
/// Unlike on creation, the category is required.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    claims: Claims,
    body: Result<Json<EditTransactionData>, JsonRejection>,
) -> Response {
    match edit(&state, &claims, body) {
        Ok(transaction) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Transaction updated successfully.",
                "transaction": transaction,
            })),
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}

fn edit(
    state: &TransactionState,
    claims: &Claims,
    body: Result<Json<EditTransactionData>, JsonRejection>,
) -> Result<Transaction, Error> {
    let Json(data) = body?;
    let transaction_id = data
        .transaction_id
        .ok_or_else(|| Error::InvalidInput("Transaction ID is required.".to_owned()))?;
    if data
        .fields
        .category
        .as_deref()
        .is_none_or(|category| category.trim().is_empty())
    {
        return Err(Error::InvalidInput("Missing required fields.".to_owned()));
    }
    let changes = data.fields.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_owned_transaction(transaction_id, claims.id, "edit", &connection)?;

    update_transaction(transaction_id, changes, &connection)
}
