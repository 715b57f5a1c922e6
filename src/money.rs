// Minor-unit money handling
// Amounts are signed integers in cents everywhere inside the ledger; this
// module is the only place a decimal string is taken apart or produced.
// Parsing is pure string/integer work so imported amounts never pass
// through a float.

use crate::error::{LedgerError, Result};

/// Parse a human or bank-export amount into signed minor units.
///
/// Tolerates currency symbols, plain and non-breaking spaces, thousands
/// separators, and either `.` or `,` as the decimal mark:
/// "12.34" → 1234, "-1 234,56 €" → -123456, "$1,234.56" → 123456.
pub fn parse_amount(raw: &str) -> Result<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '€' | '$' | '£' | '\'' | '\u{a0}' | '\u{202f}'))
        .collect();

    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return Err(LedgerError::validation(format!("unparseable amount: {raw:?}")));
    }

    let (int_digits, frac_digits) = split_decimal(body);
    if int_digits.is_empty() && frac_digits.is_empty() {
        return Err(LedgerError::validation(format!("unparseable amount: {raw:?}")));
    }

    let whole: i64 = if int_digits.is_empty() {
        0
    } else {
        int_digits
            .parse()
            .map_err(|_| LedgerError::validation(format!("amount out of range: {raw:?}")))?
    };

    // Fraction is padded or truncated to cents
    let mut frac = frac_digits;
    frac.truncate(2);
    while frac.len() < 2 {
        frac.push('0');
    }
    let cents: i64 = frac.parse().unwrap_or(0);

    let minor = whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(cents))
        .ok_or_else(|| LedgerError::validation(format!("amount out of range: {raw:?}")))?;

    Ok(if negative { -minor } else { minor })
}

/// Split a digit/separator string into integer digits and fraction digits.
///
/// When both `.` and `,` appear, the later one is the decimal mark. A lone
/// separator followed by three digits is read as a thousands mark.
fn split_decimal(body: &str) -> (String, String) {
    let last_dot = body.rfind('.');
    let last_comma = body.rfind(',');

    let decimal_pos = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(d.max(c)),
        (Some(p), None) | (None, Some(p)) => {
            let sep = body.as_bytes()[p] as char;
            let frac_len = body.len() - p - 1;
            let sep_count = body.matches(sep).count();
            if sep_count == 1 && frac_len <= 2 {
                Some(p)
            } else {
                None // thousands separators only
            }
        }
        (None, None) => None,
    };

    match decimal_pos {
        Some(p) => (
            body[..p].chars().filter(|c| c.is_ascii_digit()).collect(),
            body[p + 1..].chars().filter(|c| c.is_ascii_digit()).collect(),
        ),
        None => (body.chars().filter(|c| c.is_ascii_digit()).collect(), String::new()),
    }
}

/// Render minor units as a plain decimal string: -123456 → "-1234.56".
pub fn format_amount(minor: i64) -> String {
    let cents = minor.unsigned_abs();
    let sign = if minor < 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_decimal() {
        assert_eq!(parse_amount("12.34").unwrap(), 1234);
        assert_eq!(parse_amount("-12.34").unwrap(), -1234);
        assert_eq!(parse_amount("+45").unwrap(), 4500);
        assert_eq!(parse_amount("0.05").unwrap(), 5);
        assert_eq!(parse_amount("7").unwrap(), 700);
    }

    #[test]
    fn test_parse_comma_decimal() {
        assert_eq!(parse_amount("12,34").unwrap(), 1234);
        assert_eq!(parse_amount("-1 234,56 €").unwrap(), -123456);
        assert_eq!(parse_amount("0,5").unwrap(), 50);
    }

    #[test]
    fn test_parse_thousands_separators() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 123456);
        assert_eq!(parse_amount("1.234,56").unwrap(), 123456);
        assert_eq!(parse_amount("1,234").unwrap(), 123400);
        assert_eq!(parse_amount("1,234,567").unwrap(), 123456700);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("12.3.4,5x").is_err());
        assert!(parse_amount("€").is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234), "12.34");
        assert_eq!(format_amount(-123456), "-1234.56");
        assert_eq!(format_amount(0), "0.00");
        assert_eq!(format_amount(-5), "-0.05");
        assert_eq!(format_amount(100), "1.00");
    }

    #[test]
    fn test_parse_format_round_trip() {
        for minor in [0, 1, -1, 99, 100, -12345, 10_000_000] {
            assert_eq!(parse_amount(&format_amount(minor)).unwrap(), minor);
        }
    }
}
