//! Spending per category over the last week or the current month.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Date, Duration};

use crate::{
    Error,
    auth::Claims,
    budget::Timeframe,
    category::Category,
    date::today_utc,
    transaction::{Transaction, TransactionState, get_user_transactions},
};

/// The amount spent in one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: f64,
}

/// Spending per category over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSummary {
    pub timeframe: Timeframe,
    pub start_date: Date,
    pub end_date: Date,
    /// Only categories with at least one transaction, sorted by name.
    pub categories: Vec<CategoryTotal>,
    pub total: f64,
}

/// The first and last day, inclusive, of the summary window ending `today`.
///
/// A week covers the seven days before today and today itself, a month
/// starts on the first day of the current month.
pub fn summary_window(timeframe: Timeframe, today: Date) -> (Date, Date) {
    let start_date = match timeframe {
        Timeframe::Week => today.saturating_sub(Duration::days(7)),
        Timeframe::Month => today.replace_day(1).unwrap_or(today),
    };

    (start_date, today)
}

/// Sum the transactions dated from `start_date` to `end_date` inclusive per category.
pub fn summarize_spending(
    timeframe: Timeframe,
    start_date: Date,
    end_date: Date,
    transactions: &[Transaction],
) -> SpendingSummary {
    let mut totals: HashMap<Category, f64> = HashMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.date >= start_date && transaction.date <= end_date)
    {
        *totals.entry(transaction.category).or_insert(0.0) += transaction.amount;
    }

    let mut categories: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, amount)| CategoryTotal { category, amount })
        .collect();
    categories.sort_by_key(|total| total.category.as_str());

    let total = categories
        .iter()
        .fold(0.0, |total, category| total + category.amount);

    SpendingSummary {
        timeframe,
        start_date,
        end_date,
        categories,
        total,
    }
}

/// The query string for a spending summary.
#[derive(Debug, Deserialize)]
pub struct SpendingSummaryQuery {
    /// Either "week" or "month", defaults to "month".
    pub timeframe: Option<String>,
}

/// A route handler that summarises the signed-in user's recent spending.
pub async fn spending_summary_endpoint(
    State(state): State<TransactionState>,
    claims: Claims,
    query: Result<Query<SpendingSummaryQuery>, QueryRejection>,
) -> Response {
    match summarize(&state, &claims, query) {
        Ok(summary) => Json(json!({
            "success": true,
            "message": "Spending summary retrieved successfully.",
            "summary": summary,
        }))
        .into_response(),
        Err(error) => error.into_response(),
    }
}

fn summarize(
    state: &TransactionState,
    claims: &Claims,
    query: Result<Query<SpendingSummaryQuery>, QueryRejection>,
) -> Result<SpendingSummary, Error> {
    let Query(query) = query.map_err(|rejection| Error::InvalidInput(rejection.body_text()))?;
    let timeframe = match query.timeframe {
        Some(timeframe) => timeframe.trim().parse()?,
        None => Timeframe::default(),
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let transactions = get_user_transactions(claims.id, &connection)?;

    let (start_date, end_date) = summary_window(timeframe, today_utc());

    Ok(summarize_spending(
        timeframe,
        start_date,
        end_date,
        &transactions,
    ))
}
