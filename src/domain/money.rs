use thiserror::Error;

/// Money is stored as integer cents to keep aggregate arithmetic exact.
/// €50.00 = 5000. Balances are signed; transaction amounts are positive.
pub type Cents = i64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid amount: {0:?}")]
pub struct ParseAmountError(String);

/// Parse a decimal string into cents: "50" -> 5000, "12.5" -> 1250,
/// "-3.07" -> -307. Digits beyond two decimal places are truncated.
pub fn parse_amount(input: &str) -> Result<Cents, ParseAmountError> {
    let raw = input.trim();
    let err = || ParseAmountError(input.to_string());

    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    if digits.is_empty() || digits == "." {
        return Err(err());
    }

    let (units, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }

    let units: i64 = if units.is_empty() {
        0
    } else {
        units.parse().map_err(|_| err())?
    };
    let frac_cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| err())? * 10,
        _ => frac[..2].parse().map_err(|_| err())?,
    };

    let cents = units * 100 + frac_cents;
    Ok(if negative { -cents } else { cents })
}

/// Format cents as a decimal string: 5000 -> "50.00", -307 -> "-3.07".
pub fn format_amount(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!(parse_amount("50"), Ok(5000));
        assert_eq!(parse_amount("50.00"), Ok(5000));
        assert_eq!(parse_amount("12.5"), Ok(1250));
        assert_eq!(parse_amount(".25"), Ok(25));
        assert_eq!(parse_amount("0.01"), Ok(1));
        assert_eq!(parse_amount("-3.07"), Ok(-307));
        // Extra precision is truncated, not rounded.
        assert_eq!(parse_amount("1.999"), Ok(199));
    }

    #[test]
    fn rejects_malformed_amounts() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount(".").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("1.2.3").is_err());
        assert!(parse_amount("12,50").is_err());
    }

    #[test]
    fn formats_amounts() {
        assert_eq!(format_amount(5000), "50.00");
        assert_eq!(format_amount(1), "0.01");
        assert_eq!(format_amount(0), "0.00");
        assert_eq!(format_amount(-307), "-3.07");
    }

    #[test]
    fn parse_format_roundtrip() {
        for cents in [0, 1, 99, 100, 12345, -12345] {
            assert_eq!(parse_amount(&format_amount(cents)), Ok(cents));
        }
    }
}
