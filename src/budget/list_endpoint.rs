//! Defines the endpoint for listing the signed-in user's budgets.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    Error,
    auth::Claims,
    budget::{BudgetState, core::get_user_budgets},
};

/// A route handler that returns the signed-in user's budgets, latest start date first.
pub async fn get_budgets_endpoint(State(state): State<BudgetState>, claims: Claims) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(_) => return Error::DatabaseLockError.into_response(),
    };

    match get_user_budgets(claims.id, &connection) {
        Ok(budgets) => Json(json!({
            "success": true,
            "message": "Budgets retrieved successfully.",
            "budgets": budgets,
        }))
        .into_response(),
        Err(error) => error.into_response(),
    }
}
