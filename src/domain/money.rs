use std::fmt;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// For EUR/USD, 1 unit = 100 cents, so €50.00 = 5000 cents.
pub type Cents = i64;

/// Largest amount a single entry may carry: one trillion units.
/// Leaves room to sum millions of maximal entries without leaving `i64`.
pub const MAX_AMOUNT_CENTS: Cents = 100_000_000_000_000;

/// Format cents as a human-readable currency string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// A decimal amount split into its sign and its magnitude rounded to cents.
///
/// The sign is taken from the unrounded input, so "-0.001" is negative even
/// though its magnitude rounds to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedAmount {
    pub negative: bool,
    pub magnitude: Cents,
}

impl ParsedAmount {
    pub fn cents(self) -> Cents {
        if self.negative {
            -self.magnitude
        } else {
            self.magnitude
        }
    }
}

/// Parse a plain decimal string, rounding half-up to two fraction digits.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000, "0.005" -> 1
pub fn parse_amount(input: &str) -> Result<ParsedAmount, ParseCentsError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseCentsError::Empty);
    }

    let (sign, digits) = match input.as_bytes()[0] {
        b'-' => (true, &input[1..]),
        b'+' => (false, &input[1..]),
        _ => (false, input),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| ParseCentsError::Overflow)?
    };

    // Only the first three fraction digits matter: two kept, one for rounding
    let frac = fraction.as_bytes();
    let digit = |i: usize| frac.get(i).map_or(0, |b| i64::from(b - b'0'));
    let mut fraction_cents = digit(0) * 10 + digit(1);
    if digit(2) >= 5 {
        fraction_cents += 1;
    }

    let magnitude = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction_cents))
        .ok_or(ParseCentsError::Overflow)?;

    let nonzero = whole.bytes().chain(fraction.bytes()).any(|b| b != b'0');

    Ok(ParsedAmount {
        negative: sign && nonzero,
        magnitude,
    })
}

/// Parse a decimal string into signed cents.
/// Example: "-12.34" -> -1234
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    parse_amount(input).map(ParsedAmount::cents)
}

/// Parse an amount exactly as the ledger stores it: unsigned digits, a dot,
/// and two fraction digits. Anything else, including values above
/// [`MAX_AMOUNT_CENTS`], is rejected.
pub fn parse_canonical_cents(input: &str) -> Option<Cents> {
    let (whole, fraction) = input.split_once('.')?;
    if whole.is_empty()
        || fraction.len() != 2
        || !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit())
    {
        return None;
    }
    parse_cents(input)
        .ok()
        .filter(|&cents| cents <= MAX_AMOUNT_CENTS)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    Empty,
    InvalidFormat,
    Overflow,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::Empty => write!(f, "empty amount"),
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::Overflow => write!(f, "amount out of range"),
        }
    }
}

impl std::error::Error for ParseCentsError {}
