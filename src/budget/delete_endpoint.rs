//! Defines the endpoint for deleting a budget.

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
    budget::{
        BudgetState,
        core::{delete_budget, get_owned_budget},
    },
    database_id::BudgetId,
};

/// The body of a delete request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBudgetData {
    pub budget_id: Option<BudgetId>,
}

/// A route handler for deleting one of the signed-in user's budgets.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    claims: Claims,
    body: Result<Json<DeleteBudgetData>, JsonRejection>,
) -> Response {
    match delete(&state, &claims, body) {
        Ok(()) => Json(json!({
            "success": true,
            "message": "Budget deleted successfully",
        }))
        .into_response(),
        Err(error) => error.into_response(),
    }
}

fn delete(
    state: &BudgetState,
    claims: &Claims,
    body: Result<Json<DeleteBudgetData>, JsonRejection>,
) -> Result<(), Error> {
    let Json(data) = body?;
    let budget_id = data
        .budget_id
        .ok_or_else(|| Error::InvalidInput("Budget ID is required.".to_owned()))?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_owned_budget(budget_id, claims.id, "delete", &connection)?;
    delete_budget(budget_id, claims.id, &connection).map_err(|error| match error {
        Error::NotFound => Error::BudgetNotFound,
        error => error,
    })?;

    tracing::debug!("Deleted budget {budget_id} for user {}", claims.id);

    Ok(())
}
