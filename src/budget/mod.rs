//! Budgets: per category spending limits over a week or a month.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

pub use core::{
    Budget, BudgetData, CategoryAllocation, NewBudget, Timeframe, create_budget,
    create_budget_tables, delete_budget, get_budget, get_owned_budget, get_user_budgets,
};
pub use create_endpoint::create_budget_endpoint;
pub use delete_endpoint::delete_budget_endpoint;
pub use list_endpoint::get_budgets_endpoint;

use crate::AppState;

/// The state needed to manage a user's budgets.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
