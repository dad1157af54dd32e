//! Sets up the application's database.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, budget::create_budget_tables, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create all the tables for the domain models.
///
/// Tables that already exist are left untouched, so this is safe to call on
/// every start-up.
///
/// # Errors
/// Returns an error if a table could not be created or foreign keys could not be enabled.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod db_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();
        initialize(&connection).unwrap();
    }

    #[test]
    fn initialize_creates_all_tables() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let mut tables: Vec<String> = connection
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|name| name.unwrap())
            .collect();
        tables.sort();

        assert_eq!(
            tables,
            [
                "budget",
                "budget_category",
                "transaction",
                "user",
                "user_budget_ref",
                "user_transaction_ref",
            ]
        );
    }
}
