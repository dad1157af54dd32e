//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    category::Category,
    database_id::TransactionId,
    date::parse_date,
    user::{UserID, pull_transaction_ref, push_transaction_ref},
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense, i.e. an event where money was spent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The amount of money spent in this transaction.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// What the money was spent on.
    pub category: Category,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last edited.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The validated fields of a transaction that a user may set.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: f64,
    pub date: Date,
    pub description: String,
    pub category: Category,
}

impl NewTransaction {
    /// Validate the fields of a transaction.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidInput] if `amount` is zero, NaN or infinite,
    /// or `description` is blank.
    pub fn new(
        amount: f64,
        date: Date,
        description: &str,
        category: Category,
    ) -> Result<Self, Error> {
        if !amount.is_finite() || amount == 0.0 {
            return Err(Error::InvalidInput(
                "Amount must be a non-zero number.".to_owned(),
            ));
        }

        let description = description.trim();
        if description.is_empty() {
            return Err(Error::InvalidInput(
                "Description cannot be empty.".to_owned(),
            ));
        }

        Ok(Self {
            amount,
            date,
            description: description.to_owned(),
            category,
        })
    }
}

/// The transaction fields as sent by a client.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionData {
    pub amount: Option<f64>,
    /// A `YYYY-MM-DD` date.
    pub date: Option<String>,
    pub description: Option<String>,
    /// The name of a [Category], defaults to [Category::Other].
    pub category: Option<String>,
}

impl TransactionData {
    /// Check that the required fields are present and valid.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidInput] if the amount, date or description is
    /// missing, or any field has an invalid value.
    pub fn validate(self) -> Result<NewTransaction, Error> {
        let (Some(amount), Some(date), Some(description)) =
            (self.amount, self.date, self.description)
        else {
            return Err(Error::InvalidInput("Missing required fields.".to_owned()));
        };

        let date = parse_date(&date)?;
        let category = match self.category {
            Some(name) if !name.trim().is_empty() => name
                .trim()
                .parse::<Category>()
                .map_err(|error| Error::InvalidInput(error.to_string()))?,
            _ => Category::default(),
        };

        NewTransaction::new(amount, date, &description, category)
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction owned by `user_id` and append it to the user's
/// transaction list.
///
/// Both writes happen in one SQL transaction.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn create_transaction(
    user_id: UserID,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let now = OffsetDateTime::now_utc();

    let transaction = sql_transaction
        .prepare(
            "INSERT INTO \"transaction\"
                (user_id, amount, date, description, category, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, user_id, amount, date, description, category, created_at, updated_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                new_transaction.amount,
                new_transaction.date,
                new_transaction.description,
                new_transaction.category,
                now,
                now,
            ),
            map_transaction_row,
        )?;

    push_transaction_ref(user_id, transaction.id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, amount, date, description, category, created_at, updated_at
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve the transaction `id` if it is owned by `user_id`.
///
/// `action` names what the caller is trying to do, e.g. "edit", for the
/// forbidden message.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a valid transaction,
/// - [Error::Forbidden] if the transaction belongs to another user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_owned_transaction(
    id: TransactionId,
    user_id: UserID,
    action: &str,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_transaction(id, connection).map_err(|error| match error {
        Error::NotFound => Error::TransactionNotFound,
        error => error,
    })?;

    if transaction.user_id != user_id {
        tracing::warn!(
            "User {user_id} tried to {action} transaction {id} owned by user {}",
            transaction.user_id
        );
        return Err(Error::Forbidden(format!(
            "You are not authorized to {action} this transaction."
        )));
    }

    Ok(transaction)
}

/// Overwrite the user editable fields of transaction `id` and refresh its
/// update time.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    changes: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "UPDATE \"transaction\"
             SET amount = ?1, date = ?2, description = ?3, category = ?4, updated_at = ?5
             WHERE id = ?6
             RETURNING id, user_id, amount, date, description, category, created_at, updated_at",
        )?
        .query_row(
            (
                changes.amount,
                changes.date,
                changes.description,
                changes.category,
                OffsetDateTime::now_utc(),
                id,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Delete transaction `id` and remove it from the owner's transaction list.
///
/// Both writes happen in one SQL transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    owner: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let rows_affected = sql_transaction.execute(
        "DELETE FROM \"transaction\" WHERE id = :id",
        &[(":id", &id)],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    pull_transaction_ref(owner, id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(())
}

/// Get the transactions in the user's transaction list, newest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn get_user_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.user_id, t.amount, t.date, t.description, t.category,
                    t.created_at, t.updated_at
             FROM \"transaction\" t
             INNER JOIN user_transaction_ref r ON r.transaction_id = t.id
             WHERE r.user_id = :user_id
             ORDER BY t.date DESC, t.id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        date: row.get(3)?,
        description: row.get(4)?,
        category: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod validation_tests {
    use time::macros::date;

    use crate::{
        Error,
        category::Category,
        transaction::{NewTransaction, TransactionData},
    };

    fn data(amount: Option<f64>, date: Option<&str>, description: Option<&str>) -> TransactionData {
        TransactionData {
            amount,
            date: date.map(str::to_owned),
            description: description.map(str::to_owned),
            category: None,
        }
    }

    #[test]
    fn validate_defaults_category_to_other() {
        let got = data(Some(12.5), Some("2025-01-02"), Some(" Lunch "))
            .validate()
            .unwrap();

        assert_eq!(
            got,
            NewTransaction {
                amount: 12.5,
                date: date!(2025 - 01 - 02),
                description: "Lunch".to_owned(),
                category: Category::Other,
            }
        );
    }

    #[test]
    fn validate_parses_category() {
        let got = TransactionData {
            category: Some("Travel".to_owned()),
            ..data(Some(40.0), Some("2025-01-02"), Some("Bus"))
        }
        .validate()
        .unwrap();

        assert_eq!(got.category, Category::Travel);
    }

    #[test]
    fn validate_fails_on_missing_fields() {
        let want = Err(Error::InvalidInput("Missing required fields.".to_owned()));

        assert_eq!(data(None, Some("2025-01-02"), Some("Lunch")).validate(), want);
        assert_eq!(data(Some(1.0), None, Some("Lunch")).validate(), want);
        assert_eq!(data(Some(1.0), Some("2025-01-02"), None).validate(), want);
    }

    #[test]
    fn validate_fails_on_bad_values() {
        for bad in [
            data(Some(0.0), Some("2025-01-02"), Some("Lunch")),
            data(Some(f64::NAN), Some("2025-01-02"), Some("Lunch")),
            data(Some(1.0), Some("2025-01-02"), Some("   ")),
            data(Some(1.0), Some("yesterday"), Some("Lunch")),
            TransactionData {
                category: Some("Rent".to_owned()),
                ..data(Some(1.0), Some("2025-01-02"), Some("Lunch"))
            },
        ] {
            assert!(matches!(bad.validate(), Err(Error::InvalidInput(_))));
        }
    }
}
