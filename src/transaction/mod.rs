//! Transaction management for the budgeting application.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the validation of client supplied fields
//! - Database functions for storing, querying, and managing transactions
//! - Route handlers for creating, editing, deleting and listing a user's transactions

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

pub use core::{
    NewTransaction, Transaction, TransactionData, create_transaction, create_transaction_table,
    delete_transaction, get_owned_transaction, get_transaction, get_user_transactions,
    map_transaction_row, update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use list_endpoint::get_transactions_endpoint;

use crate::AppState;

/// The state needed to manage a user's transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
