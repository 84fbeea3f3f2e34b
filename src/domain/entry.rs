use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{format_cents, parse_amount, Cents, MAX_AMOUNT_CENTS};

/// Canonical date format of the ledger.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Alternative input format accepted from users.
const SLASH_DATE_FORMAT: &str = "%Y/%m/%d";

/// Inputs that resolve to the current local date.
const TODAY_SENTINELS: [&str; 2] = ["today", "t"];

/// A single expense record in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub date: NaiveDate,
    pub amount_cents: Cents,
    pub category: String,
    pub note: String,
}

impl Entry {
    /// Date rendered as `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// Amount rendered with exactly two fraction digits.
    pub fn amount_string(&self) -> String {
        format_cents(self.amount_cents)
    }
}

/// Rejected user input. The ledger is never touched when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid date format: '{0}' (use YYYY-MM-DD, YYYY/MM/DD or 'today')")]
    InvalidDate(String),

    #[error("invalid number: '{0}'")]
    InvalidNumber(String),

    #[error("negative amount: '{0}' (amounts must be zero or more)")]
    NegativeAmount(String),

    #[error("empty category")]
    EmptyCategory,
}

/// Validate and canonicalize raw user input into an [`Entry`], resolving
/// `today`/`t` against the local clock.
pub fn normalize(
    raw_date: &str,
    raw_amount: &str,
    raw_category: &str,
    raw_note: &str,
) -> Result<Entry, ValidationError> {
    normalize_on(
        Local::now().date_naive(),
        raw_date,
        raw_amount,
        raw_category,
        raw_note,
    )
}

/// Same as [`normalize`], with the date used for `today`/`t` supplied by the caller.
pub fn normalize_on(
    today: NaiveDate,
    raw_date: &str,
    raw_amount: &str,
    raw_category: &str,
    raw_note: &str,
) -> Result<Entry, ValidationError> {
    Ok(Entry {
        date: parse_entry_date(raw_date, today)?,
        amount_cents: parse_entry_amount(raw_amount)?,
        category: parse_category(raw_category)?,
        note: raw_note.trim().to_string(),
    })
}

pub fn parse_entry_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    if TODAY_SENTINELS
        .iter()
        .any(|sentinel| trimmed.eq_ignore_ascii_case(sentinel))
    {
        return Ok(today);
    }

    // chrono alone would also take signed or short years and inner spaces
    [(DATE_FORMAT, '-'), (SLASH_DATE_FORMAT, '/')]
        .iter()
        .filter(|(_, separator)| has_date_shape(trimmed, *separator, false))
        .find_map(|(format, _)| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| ValidationError::InvalidDate(trimmed.to_string()))
}

/// Parse a date exactly as the ledger stores it: zero-padded `YYYY-MM-DD`.
pub fn parse_canonical_date(raw: &str) -> Option<NaiveDate> {
    if !has_date_shape(raw, '-', true) {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Four-digit year, then month and day of one or two digits (exactly two when
/// `padded`), joined by `separator` and nothing else.
fn has_date_shape(raw: &str, separator: char, padded: bool) -> bool {
    let mut parts = raw.split(separator);
    let (Some(year), Some(month), Some(day), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let min_width = if padded { 2 } else { 1 };
    let digits = |part: &str, min: usize, max: usize| {
        (min..=max).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
    };

    digits(year, 4, 4) && digits(month, min_width, 2) && digits(day, min_width, 2)
}

pub fn parse_entry_amount(raw: &str) -> Result<Cents, ValidationError> {
    let trimmed = raw.trim();
    let parsed =
        parse_amount(trimmed).map_err(|_| ValidationError::InvalidNumber(trimmed.to_string()))?;
    if parsed.negative {
        return Err(ValidationError::NegativeAmount(trimmed.to_string()));
    }
    if parsed.magnitude > MAX_AMOUNT_CENTS {
        return Err(ValidationError::InvalidNumber(trimmed.to_string()));
    }
    Ok(parsed.magnitude)
}

pub fn parse_category(raw: &str) -> Result<String, ValidationError> {
    let category = raw.trim();
    if category.is_empty() {
        return Err(ValidationError::EmptyCategory);
    }
    Ok(category.to_string())
}
