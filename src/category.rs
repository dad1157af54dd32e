//! The fixed set of spending categories shared by transactions and budgets.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// What a transaction was for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Category {
    /// Groceries, eating out.
    Food,
    /// Clothes, gadgets and other purchases.
    Shopping,
    /// Power, water, internet, phone.
    Utilities,
    /// Anything that does not fit elsewhere.
    #[default]
    Other,
    /// Fares, fuel, accommodation.
    Travel,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Shopping,
        Category::Utilities,
        Category::Other,
        Category::Travel,
    ];

    /// The category's name as stored and serialised.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Shopping => "Shopping",
            Category::Utilities => "Utilities",
            Category::Other => "Other",
            Category::Travel => "Travel",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The string did not name a known category.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("\"{0}\" is not a valid category")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}
