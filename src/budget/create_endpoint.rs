//! Defines the endpoint for creating a budget.

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
    budget::{Budget, BudgetData, BudgetState, core::create_budget},
};

/// A route handler for creating a budget owned by the signed-in user.
///
/// Responds with 201 Created and the new budget on success.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    claims: Claims,
    body: Result<Json<BudgetData>, JsonRejection>,
) -> Response {
    match create(&state, &claims, body) {
        Ok(budget) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "Budget created successfully",
                "budget": budget,
            })),
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}

fn create(
    state: &BudgetState,
    claims: &Claims,
    body: Result<Json<BudgetData>, JsonRejection>,
) -> Result<Budget, Error> {
    let Json(data) = body?;
    let new_budget = data.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = create_budget(claims.id, new_budget, &connection)?;
    tracing::debug!("Created budget {} for user {}", budget.id, claims.id);

    Ok(budget)
}
