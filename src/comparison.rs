//! Budget versus actual spending.
//!
//! Compares each allocation of a budget with the sum of the owner's
//! transactions in that category that fall inside the budget window.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Date;

use crate::{
    Error,
    auth::Claims,
    budget::{Budget, BudgetState, Timeframe, get_owned_budget},
    database_id::BudgetId,
    transaction::{Transaction, get_user_transactions},
};

/// How much of one allocation has been used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub category: String,
    pub allocated: f64,
    pub spent: f64,
    /// `allocated - spent`, negative when over budget.
    pub remaining: f64,
}

/// A budget compared against the transactions in its window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetComparison {
    pub budget_id: BudgetId,
    pub timeframe: Timeframe,
    pub start_date: Date,
    /// The last day of the window, inclusive.
    pub end_date: Date,
    /// One row per allocation, in allocation order.
    pub rows: Vec<ComparisonRow>,
}

/// Sum the spending per allocation of `budget`.
///
/// Only transactions dated from the budget's start date up to and including
/// its end date count. An allocation matches the transactions whose category
/// name equals its category exactly. Transactions in categories without an
/// allocation are ignored.
pub fn compare_budget(budget: &Budget, transactions: &[Transaction]) -> Vec<ComparisonRow> {
    let start_date = budget.start_date;
    let end_date = budget.end_date();
    let mut spent_by_category: HashMap<&str, f64> = HashMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.date >= start_date && transaction.date <= end_date)
    {
        *spent_by_category
            .entry(transaction.category.as_str())
            .or_insert(0.0) += transaction.amount;
    }

    budget
        .categories
        .iter()
        .map(|allocation| {
            let spent = spent_by_category
                .get(allocation.category.as_str())
                .copied()
                .unwrap_or(0.0);

            ComparisonRow {
                category: allocation.category.clone(),
                allocated: allocation.amount,
                spent,
                remaining: allocation.amount - spent,
            }
        })
        .collect()
}

/// The query string for a comparison.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareBudgetQuery {
    pub budget_id: Option<BudgetId>,
}

/// A route handler that compares one of the signed-in user's budgets with
/// their transactions.
pub async fn compare_budget_endpoint(
    State(state): State<BudgetState>,
    claims: Claims,
    query: Result<Query<CompareBudgetQuery>, QueryRejection>,
) -> Response {
    match compare(&state, &claims, query) {
        Ok(comparison) => Json(json!({
            "success": true,
            "message": "Budget comparison retrieved successfully.",
            "comparison": comparison,
        }))
        .into_response(),
        Err(error) => error.into_response(),
    }
}

fn compare(
    state: &BudgetState,
    claims: &Claims,
    query: Result<Query<CompareBudgetQuery>, QueryRejection>,
) -> Result<BudgetComparison, Error> {
    let Query(query) = query.map_err(|rejection| Error::InvalidInput(rejection.body_text()))?;
    let budget_id = query
        .budget_id
        .ok_or_else(|| Error::InvalidInput("Budget ID is required.".to_owned()))?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = get_owned_budget(budget_id, claims.id, "view", &connection)?;
    let transactions = get_user_transactions(claims.id, &connection)?;

    Ok(BudgetComparison {
        budget_id: budget.id,
        timeframe: budget.timeframe,
        start_date: budget.start_date,
        end_date: budget.end_date(),
        rows: compare_budget(&budget, &transactions),
    })
}


#[cfg(test)]
mod compare_budget_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        endpoints,
        test_utils::{assert_envelope, create_test_user, get_test_server, get_test_state},
    };

    #[tokio::test]
    async fn compares_budget_with_transactions() {
        let state = get_test_state();
        let (_, cookie) = create_test_user(&state, "alice");
        let server = get_test_server(state);

        let budget = server
            .post(endpoints::CREATE_BUDGET)
            .add_cookie(cookie.clone())
            .json(&json!({
                "timeframe": "month",
                "categories": [
                    { "category": "Food", "amount": 1000 },
                    { "category": "Shopping", "amount": 500 },
                ],
                "startDate": "2025-04-01",
            }))
            .await
            .json::<serde_json::Value>();
        let budget_id = budget["budget"]["id"].as_i64().unwrap();

        for (amount, date) in [(200, "2025-04-05"), (150, "2025-04-25"), (999, "2025-06-01")] {
            server
                .post(endpoints::CREATE_TRANSACTION)
                .add_cookie(cookie.clone())
                .json(&json!({
                    "amount": amount,
                    "date": date,
                    "description": "Groceries",
                    "category": "Food",
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server
            .get(endpoints::COMPARE_BUDGET)
            .add_query_param("budgetId", budget_id)
            .add_cookie(cookie)
            .await;

        let body = assert_envelope(
            &response,
            StatusCode::OK,
            true,
            "Budget comparison retrieved successfully.",
        );
        assert_eq!(
            body["comparison"],
            json!({
                "budgetId": budget_id,
                "timeframe": "month",
                "startDate": "2025-04-01",
                "endDate": "2025-05-01",
                "rows": [
                    { "category": "Food", "allocated": 1000.0, "spent": 350.0, "remaining": 650.0 },
                    { "category": "Shopping", "allocated": 500.0, "spent": 0.0, "remaining": 500.0 },
                ],
            })
        );
    }

    #[tokio::test]
    async fn budget_with_free_text_categories_and_millis_start_date() {
        let state = get_test_state();
        let (_, cookie) = create_test_user(&state, "alice");
        let server = get_test_server(state);

        // 2025-04-01T00:00:00Z
        let response = server
            .post(endpoints::CREATE_BUDGET)
            .add_cookie(cookie.clone())
            .json(&json!({
                "timeframe": "month",
                "categories": [
                    { "category": "Food", "amount": 300 },
                    { "category": "Entertainment", "amount": 80 },
                    { "category": "Transport", "amount": 120 },
                ],
                "startDate": 1743465600000_i64,
            }))
            .await;
        let budget = assert_envelope(
            &response,
            StatusCode::CREATED,
            true,
            "Budget created successfully",
        );
        assert_eq!(budget["budget"]["startDate"], "2025-04-01");
        let budget_id = budget["budget"]["id"].as_i64().unwrap();

        server
            .post(endpoints::CREATE_TRANSACTION)
            .add_cookie(cookie.clone())
            .json(&json!({
                "amount": 42,
                "date": "2025-04-10",
                "description": "Dinner",
                "category": "Food",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get(endpoints::COMPARE_BUDGET)
            .add_query_param("budgetId", budget_id)
            .add_cookie(cookie)
            .await;

        let body = assert_envelope(
            &response,
            StatusCode::OK,
            true,
            "Budget comparison retrieved successfully.",
        );
        assert_eq!(
            body["comparison"]["rows"],
            json!([
                { "category": "Food", "allocated": 300.0, "spent": 42.0, "remaining": 258.0 },
                { "category": "Entertainment", "allocated": 80.0, "spent": 0.0, "remaining": 80.0 },
                { "category": "Transport", "allocated": 120.0, "spent": 0.0, "remaining": 120.0 },
            ])
        );
    }

    #[tokio::test]
    async fn cannot_compare_other_users_budget() {
        let state = get_test_state();
        let (_, alice_cookie) = create_test_user(&state, "alice");
        let (_, bob_cookie) = create_test_user(&state, "bob");
        let server = get_test_server(state);

        let budget = server
            .post(endpoints::CREATE_BUDGET)
            .add_cookie(alice_cookie)
            .json(&json!({
                "timeframe": "week",
                "categories": [{ "category": "Food", "amount": 10 }],
            }))
            .await
            .json::<serde_json::Value>();

        let response = server
            .get(endpoints::COMPARE_BUDGET)
            .add_query_param("budgetId", budget["budget"]["id"].as_i64().unwrap())
            .add_cookie(bob_cookie)
            .await;

        assert_envelope(
            &response,
            StatusCode::FORBIDDEN,
            false,
            "You are not authorized to view this budget.",
        );
    }

    #[tokio::test]
    async fn compare_requires_budget_id() {
        let state = get_test_state();
        let (_, cookie) = create_test_user(&state, "alice");
        let server = get_test_server(state);

        let response = server
            .get(endpoints::COMPARE_BUDGET)
            .add_cookie(cookie)
            .await;

        assert_envelope(
            &response,
            StatusCode::BAD_REQUEST,
            false,
            "Budget ID is required.",
        );
    }
}
