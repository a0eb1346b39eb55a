use std::fmt;

/// Money is stored as integer minor units (cents) so that ledger math is
/// exact. A balance of zero is `0`, not "within epsilon of zero".
pub type Cents = i64;

/// Format cents for display: 12345 -> "123.45", -5 -> "-0.05".
pub fn format_money(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a user-supplied amount into cents.
///
/// Accepts whole units ("120"), one or two fraction digits ("120.5",
/// "120.50"). More than two fraction digits is rejected rather than
/// silently truncated.
pub fn parse_money(input: &str) -> Result<Cents, ParseMoneyError> {
    let trimmed = input.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    if digits.is_empty() {
        return Err(ParseMoneyError::Empty);
    }

    let (units_str, fraction_str) = match digits.find('.') {
        Some(pos) => (&digits[..pos], &digits[pos + 1..]),
        None => (digits, ""),
    };

    if fraction_str.contains('.') {
        return Err(ParseMoneyError::Invalid);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParseMoneyError::Invalid)?
    };

    let fraction: i64 = match fraction_str.len() {
        0 => 0,
        1 => {
            fraction_str
                .parse::<i64>()
                .map_err(|_| ParseMoneyError::Invalid)?
                * 10
        }
        2 => fraction_str.parse().map_err(|_| ParseMoneyError::Invalid)?,
        _ => return Err(ParseMoneyError::TooManyDecimals),
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or(ParseMoneyError::Invalid)?;

    Ok(if negative { -cents } else { cents })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseMoneyError {
    Empty,
    Invalid,
    TooManyDecimals,
}

impl fmt::Display for ParseMoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMoneyError::Empty => write!(f, "empty amount"),
            ParseMoneyError::Invalid => write!(f, "invalid amount format"),
            ParseMoneyError::TooManyDecimals => {
                write!(f, "amounts support at most two decimal places")
            }
        }
    }
}

impl std::error::Error for ParseMoneyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(12345), "123.45");
        assert_eq!(format_money(100), "1.00");
        assert_eq!(format_money(5), "0.05");
        assert_eq!(format_money(0), "0.00");
        assert_eq!(format_money(-12345), "-123.45");
        assert_eq!(format_money(-5), "-0.05");
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("120"), Ok(12000));
        assert_eq!(parse_money("120.5"), Ok(12050));
        assert_eq!(parse_money("120.50"), Ok(12050));
        assert_eq!(parse_money("0.05"), Ok(5));
        assert_eq!(parse_money(".75"), Ok(75));
        assert_eq!(parse_money("-40.25"), Ok(-4025));
        assert_eq!(parse_money("  15 "), Ok(1500));
    }

    #[test]
    fn test_parse_money_rejects_garbage() {
        assert!(parse_money("").is_err());
        assert!(parse_money("abc").is_err());
        assert!(parse_money("1.2.3").is_err());
        assert_eq!(parse_money("1.999"), Err(ParseMoneyError::TooManyDecimals));
    }

    #[test]
    fn test_parse_format_roundtrip() {
        for cents in [0, 1, 99, 100, 12345, -250] {
            assert_eq!(parse_money(&format_money(cents)), Ok(cents));
        }
    }
}
