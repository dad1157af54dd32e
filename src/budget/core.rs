//! Defines the core data models and database queries for budgets.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use crate::{
    Error,
    database_id::BudgetId,
    date::{DateInput, today_utc},
    user::{UserID, pull_budget_ref, push_budget_ref},
};

// ============================================================================
// MODELS
// ============================================================================

/// The length of a budget period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// Seven days.
    Week,
    /// Thirty days.
    #[default]
    Month,
}

impl Timeframe {
    /// The number of days in the period.
    pub fn days(&self) -> i64 {
        match self {
            Timeframe::Week => 7,
            Timeframe::Month => 30,
        }
    }

    /// The timeframe's name as stored and serialised.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Week => "week",
            Timeframe::Month => "month",
        }
    }
}

impl Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Timeframe::Week),
            "month" => Ok(Timeframe::Month),
            other => Err(Error::InvalidInput(format!(
                "\"{other}\" is not a valid timeframe, expected \"week\" or \"month\"."
            ))),
        }
    }
}

impl ToSql for Timeframe {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Timeframe {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// The amount of money set aside for one category.
///
/// Budget categories are free text. Only those that match the name of a
/// transaction [Category](crate::category::Category) can have spending
/// counted against them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAllocation {
    pub category: String,
    pub amount: f64,
}

/// A plan for how much to spend per category over a week or a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The user that owns the budget.
    pub user_id: UserID,
    /// How long the budget runs for.
    pub timeframe: Timeframe,
    /// The first day of the budget.
    pub start_date: Date,
    /// The allocations in the order the user gave them.
    pub categories: Vec<CategoryAllocation>,
    /// When the budget was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Budget {
    /// The last day of the budget window, `timeframe` days after the start date.
    pub fn end_date(&self) -> Date {
        self.start_date
            .saturating_add(Duration::days(self.timeframe.days()))
    }
}

/// The validated fields of a new budget.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub timeframe: Timeframe,
    pub start_date: Date,
    pub categories: Vec<CategoryAllocation>,
}

impl NewBudget {
    /// Validate the fields of a budget.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidInput] if there are no allocations, a
    /// category name is blank or appears twice, or an amount is negative,
    /// NaN or infinite.
    pub fn new(
        timeframe: Timeframe,
        start_date: Date,
        categories: Vec<CategoryAllocation>,
    ) -> Result<Self, Error> {
        if categories.is_empty() {
            return Err(Error::InvalidInput(
                "A budget needs at least one category.".to_owned(),
            ));
        }

        for (i, allocation) in categories.iter().enumerate() {
            if allocation.category.trim().is_empty() {
                return Err(Error::InvalidInput(
                    "Category names cannot be empty.".to_owned(),
                ));
            }

            if !allocation.amount.is_finite() || allocation.amount < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "The amount for {} must be a non-negative number.",
                    allocation.category
                )));
            }

            if categories[..i]
                .iter()
                .any(|other| other.category == allocation.category)
            {
                return Err(Error::InvalidInput(format!(
                    "{} appears more than once.",
                    allocation.category
                )));
            }
        }

        Ok(Self {
            timeframe,
            start_date,
            categories,
        })
    }
}

/// One allocation as sent by a client.
#[derive(Debug, Deserialize)]
pub struct CategoryAllocationData {
    pub category: Option<String>,
    pub amount: Option<f64>,
}

/// The budget fields as sent by a client.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetData {
    /// Either "week" or "month".
    pub timeframe: Option<String>,
    pub categories: Option<Vec<CategoryAllocationData>>,
    /// A `YYYY-MM-DD` date or a timestamp in milliseconds, defaults to today.
    pub start_date: Option<DateInput>,
}

impl BudgetData {
    /// Check that the required fields are present and valid.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidInput] if the timeframe or categories are
    /// missing, or any field has an invalid value.
    pub fn validate(self) -> Result<NewBudget, Error> {
        let (Some(timeframe), Some(categories)) = (self.timeframe, self.categories) else {
            return Err(Error::InvalidInput("Missing required fields.".to_owned()));
        };

        let timeframe: Timeframe = timeframe.trim().parse()?;
        let start_date = match self.start_date {
            Some(start_date) => start_date.to_date()?,
            None => today_utc(),
        };

        let categories = categories
            .into_iter()
            .map(|allocation| {
                let (Some(category), Some(amount)) = (allocation.category, allocation.amount)
                else {
                    return Err(Error::InvalidInput(
                        "Each category needs a category name and an amount.".to_owned(),
                    ));
                };

                Ok(CategoryAllocation {
                    category: category.trim().to_owned(),
                    amount,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        NewBudget::new(timeframe, start_date, categories)
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the budget table and the table of per category allocations.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_budget_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                timeframe TEXT NOT NULL,
                start_date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget_category (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                budget_id INTEGER NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                FOREIGN KEY(budget_id) REFERENCES budget(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create a new budget owned by `user_id` and append it to the user's budget list.
///
/// The budget row, its allocations and the list entry are written in one SQL transaction.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn create_budget(
    user_id: UserID,
    new_budget: NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let (id, created_at): (BudgetId, OffsetDateTime) = sql_transaction
        .prepare(
            "INSERT INTO budget (user_id, timeframe, start_date, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, created_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                new_budget.timeframe,
                new_budget.start_date,
                OffsetDateTime::now_utc(),
            ),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

    {
        let mut statement = sql_transaction
            .prepare("INSERT INTO budget_category (budget_id, category, amount) VALUES (?1, ?2, ?3)")?;

        for allocation in &new_budget.categories {
            statement.execute((id, &allocation.category, allocation.amount))?;
        }
    }

    push_budget_ref(user_id, id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(Budget {
        id,
        user_id,
        timeframe: new_budget.timeframe,
        start_date: new_budget.start_date,
        categories: new_budget.categories,
        created_at,
    })
}

/// Retrieve a budget and its allocations by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid budget,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_budget(id: BudgetId, connection: &Connection) -> Result<Budget, Error> {
    let mut budget = connection
        .prepare(
            "SELECT id, user_id, timeframe, start_date, created_at FROM budget WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_budget_row)?;

    budget.categories = get_allocations(id, connection)?;

    Ok(budget)
}

/// Retrieve the budget `id` if it is owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::BudgetNotFound] if `id` does not refer to a valid budget,
/// - [Error::Forbidden] if the budget belongs to another user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_owned_budget(
    id: BudgetId,
    user_id: UserID,
    action: &str,
    connection: &Connection,
) -> Result<Budget, Error> {
    let budget = get_budget(id, connection).map_err(|error| match error {
        Error::NotFound => Error::BudgetNotFound,
        error => error,
    })?;

    if budget.user_id != user_id {
        tracing::warn!(
            "User {user_id} tried to {action} budget {id} owned by user {}",
            budget.user_id
        );
        return Err(Error::Forbidden(format!(
            "You are not authorized to {action} this budget."
        )));
    }

    Ok(budget)
}

/// Delete budget `id` and its allocations, and remove it from the owner's budget list.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid budget,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_budget(id: BudgetId, owner: UserID, connection: &Connection) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    sql_transaction.execute(
        "DELETE FROM budget_category WHERE budget_id = :id",
        &[(":id", &id)],
    )?;
    let rows_affected =
        sql_transaction.execute("DELETE FROM budget WHERE id = :id", &[(":id", &id)])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    pull_budget_ref(owner, id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(())
}

/// Get the budgets in the user's budget list, latest start date first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn get_user_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    let mut budgets = connection
        .prepare(
            "SELECT b.id, b.user_id, b.timeframe, b.start_date, b.created_at
             FROM budget b
             INNER JOIN user_budget_ref r ON r.budget_id = b.id
             WHERE r.user_id = :user_id
             ORDER BY b.start_date DESC, b.id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_budget_row)?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;

    for budget in &mut budgets {
        budget.categories = get_allocations(budget.id, connection)?;
    }

    Ok(budgets)
}

fn get_allocations(
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<Vec<CategoryAllocation>, Error> {
    connection
        .prepare(
            "SELECT category, amount FROM budget_category WHERE budget_id = :budget_id ORDER BY id",
        )?
        .query_map(&[(":budget_id", &budget_id)], |row| {
            Ok(CategoryAllocation {
                category: row.get(0)?,
                amount: row.get(1)?,
            })
        })?
        .map(|maybe_allocation| maybe_allocation.map_err(Error::from))
        .collect()
}

/// Map a database row to a Budget without its allocations.
fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        timeframe: row.get(2)?,
        start_date: row.get(3)?,
        categories: Vec::new(),
        created_at: row.get(4)?,
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
        budget::{BudgetData, CategoryAllocation, NewBudget, Timeframe},
        date::{DateInput, today_utc},
    };

    use super::CategoryAllocationData;

    fn allocation(category: &str, amount: f64) -> CategoryAllocationData {
        CategoryAllocationData {
            category: Some(category.to_owned()),
            amount: Some(amount),
        }
    }

    #[test]
    fn timeframe_days() {
        assert_eq!(Timeframe::Week.days(), 7);
        assert_eq!(Timeframe::Month.days(), 30);
    }

    #[test]
    fn timeframe_parses_names() {
        assert_eq!("week".parse::<Timeframe>(), Ok(Timeframe::Week));
        assert_eq!("month".parse::<Timeframe>(), Ok(Timeframe::Month));
        assert!(matches!(
            "fortnight".parse::<Timeframe>(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn validate_keeps_allocation_order() {
        let got = BudgetData {
            timeframe: Some("week".to_owned()),
            categories: Some(vec![allocation("Travel", 50.0), allocation("Food", 0.0)]),
            start_date: Some(DateInput::Text("2025-04-01".to_owned())),
        }
        .validate()
        .unwrap();

        assert_eq!(
            got,
            NewBudget {
                timeframe: Timeframe::Week,
                start_date: date!(2025 - 04 - 01),
                categories: vec![
                    CategoryAllocation {
                        category: "Travel".to_owned(),
                        amount: 50.0
                    },
                    CategoryAllocation {
                        category: "Food".to_owned(),
                        amount: 0.0
                    },
                ],
            }
        );
    }

    #[test]
    fn validate_defaults_start_date_to_today() {
        let got = BudgetData {
            timeframe: Some("month".to_owned()),
            categories: Some(vec![allocation("Food", 100.0)]),
            start_date: None,
        }
        .validate()
        .unwrap();

        assert_eq!(got.start_date, today_utc());
    }

    #[test]
    fn validate_accepts_any_category_name() {
        let got = BudgetData {
            timeframe: Some("month".to_owned()),
            categories: Some(vec![
                allocation("Food", 300.0),
                allocation(" Entertainment ", 80.0),
                allocation("Transport", 120.0),
            ]),
            start_date: None,
        }
        .validate()
        .unwrap();

        let names: Vec<&str> = got
            .categories
            .iter()
            .map(|allocation| allocation.category.as_str())
            .collect();
        assert_eq!(names, vec!["Food", "Entertainment", "Transport"]);
    }

    #[test]
    fn validate_reads_start_date_in_millis() {
        let data: BudgetData = serde_json::from_str(
            r#"{
                "timeframe": "week",
                "categories": [{ "category": "Food", "amount": 50 }],
                "startDate": 1741564800000
            }"#,
        )
        .unwrap();

        assert_eq!(data.validate().unwrap().start_date, date!(2025 - 03 - 10));
    }

    #[test]
    fn validate_fails_on_missing_fields() {
        let want = Err(Error::InvalidInput("Missing required fields.".to_owned()));

        assert_eq!(
            BudgetData {
                categories: Some(vec![allocation("Food", 1.0)]),
                ..Default::default()
            }
            .validate(),
            want
        );
        assert_eq!(
            BudgetData {
                timeframe: Some("week".to_owned()),
                ..Default::default()
            }
            .validate(),
            want
        );
    }

    #[test]
    fn validate_fails_on_bad_allocations() {
        for categories in [
            vec![],
            vec![allocation("Food", -1.0)],
            vec![allocation("Food", f64::INFINITY)],
            vec![allocation("  ", 10.0)],
            vec![allocation("Food", 10.0), allocation("Food", 20.0)],
            vec![CategoryAllocationData {
                category: Some("Food".to_owned()),
                amount: None,
            }],
        ] {
            let result = BudgetData {
                timeframe: Some("week".to_owned()),
                categories: Some(categories),
                start_date: None,
            }
            .validate();

            assert!(
                matches!(result, Err(Error::InvalidInput(_))),
                "want invalid input, got {result:?}"
            );
        }
    }
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash,
        budget::{
            Budget, CategoryAllocation, NewBudget, Timeframe, create_budget, delete_budget,
            get_budget, get_owned_budget, get_user_budgets,
        },
        db::initialize,
        user::{NewUser, User, create_user, get_budget_refs},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_user(name: &str, conn: &Connection) -> User {
        create_user(
            NewUser {
                username: name.to_owned(),
                email: format!("{name}@example.com"),
                password_hash: PasswordHash::new_unchecked("hunter2"),
            },
            conn,
        )
        .unwrap()
    }

    fn create_test_budget(user: &User, start_date: time::Date, conn: &Connection) -> Budget {
        create_budget(
            user.id,
            NewBudget::new(
                Timeframe::Month,
                start_date,
                vec![
                    CategoryAllocation {
                        category: "Shopping".to_owned(),
                        amount: 500.0,
                    },
                    CategoryAllocation {
                        category: "Food".to_owned(),
                        amount: 1000.0,
                    },
                ],
            )
            .unwrap(),
            conn,
        )
        .unwrap()
    }

    #[test]
    fn create_round_trips_with_allocations() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);

        let budget = create_test_budget(&user, date!(2025 - 04 - 01), &conn);

        assert_eq!(get_budget(budget.id, &conn), Ok(budget.clone()));
        assert_eq!(budget.categories[0].category, "Shopping");
        assert_eq!(budget.end_date(), date!(2025 - 05 - 01));
        assert_eq!(get_budget_refs(user.id, &conn).unwrap(), vec![budget.id]);
    }

    #[test]
    fn get_owned_checks_owner() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let bob = create_test_user("bob", &conn);
        let budget = create_test_budget(&alice, date!(2025 - 04 - 01), &conn);

        assert_eq!(
            get_owned_budget(budget.id, bob.id, "delete", &conn),
            Err(Error::Forbidden(
                "You are not authorized to delete this budget.".to_owned()
            ))
        );
        assert_eq!(
            get_owned_budget(budget.id + 1, alice.id, "delete", &conn),
            Err(Error::BudgetNotFound)
        );
    }

    #[test]
    fn delete_removes_budget_allocations_and_reference() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        let budget = create_test_budget(&user, date!(2025 - 04 - 01), &conn);

        delete_budget(budget.id, user.id, &conn).unwrap();

        assert_eq!(get_budget(budget.id, &conn), Err(Error::NotFound));
        assert!(get_budget_refs(user.id, &conn).unwrap().is_empty());
        let allocation_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM budget_category", [], |row| row.get(0))
            .unwrap();
        assert_eq!(allocation_count, 0);
    }

    #[test]
    fn user_budgets_are_latest_start_first() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let bob = create_test_user("bob", &conn);
        let march = create_test_budget(&alice, date!(2025 - 03 - 01), &conn);
        let may = create_test_budget(&alice, date!(2025 - 05 - 01), &conn);
        create_test_budget(&bob, date!(2025 - 06 - 01), &conn);

        assert_eq!(get_user_budgets(alice.id, &conn).unwrap(), vec![may, march]);
    }
}
