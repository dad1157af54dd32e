//! Parsing of the calendar dates sent by clients.

use time::{
    Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description,
};

use serde::Deserialize;

use crate::Error;

/// A date as sent by a client: either text or a unix timestamp in milliseconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    /// See [parse_date].
    Text(String),
    /// Milliseconds since the unix epoch, as produced by `Date.now()` in JavaScript.
    EpochMillis(f64),
}

impl DateInput {
    /// Convert to a calendar date. Timestamps are read in UTC.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidInput] if the text is not a date or the
    /// timestamp is out of range.
    pub fn to_date(&self) -> Result<Date, Error> {
        match self {
            DateInput::Text(text) => parse_date(text),
            DateInput::EpochMillis(millis) => {
                let invalid = || {
                    Error::InvalidInput(format!("{millis} is not a valid timestamp."))
                };

                if !millis.is_finite() {
                    return Err(invalid());
                }

                let nanos = (*millis as i128)
                    .checked_mul(1_000_000)
                    .ok_or_else(invalid)?;

                OffsetDateTime::from_unix_timestamp_nanos(nanos)
                    .map(|timestamp| timestamp.date())
                    .map_err(|_| invalid())
            }
        }
    }
}

/// Parse a client supplied date.
///
/// Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp, in which case
/// the date part as written is used.
///
/// # Errors
///
/// Returns an [Error::InvalidInput] if `text` is neither.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    let text = text.trim();

    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .or_else(|_| OffsetDateTime::parse(text, &Rfc3339).map(|timestamp| timestamp.date()))
        .map_err(|_| {
            Error::InvalidInput(format!(
                "\"{text}\" is not a valid date, expected YYYY-MM-DD."
            ))
        })
}

/// The current date in UTC.
pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}
