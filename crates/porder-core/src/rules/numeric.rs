//! Never-failing numeric normalization.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::grid::Cell;

/// Reduce arbitrary text to a parseable number string.
///
/// Strips everything except digits, `.` and `-`, collapses repeated `-` to a
/// single leading sign and repeated `.` to a single point. `"₹1,234.56"`
/// becomes `1234.56`, `"-12.3 kg"` becomes `-12.3`.
fn clean_number(raw: &str) -> String {
    let negative = raw.chars().find(|c| c.is_ascii_digit() || *c == '-') == Some('-');

    let mut out = String::with_capacity(raw.len());
    let mut seen_point = false;
    for c in raw.chars() {
        match c {
            '0'..='9' => out.push(c),
            '.' if !seen_point => {
                seen_point = true;
                out.push(c);
            }
            _ => {}
        }
    }

    if negative {
        format!("-{}", out)
    } else {
        out
    }
}

/// Parse a cell or free text as a float, defaulting to `0.0`.
pub fn normalize_number(raw: &str) -> f64 {
    let cleaned = clean_number(raw);
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Parse as [`Decimal`], defaulting to zero. Numeric cells pass through
/// without string round-trips where possible.
pub fn parse_decimal(cell: &Cell) -> Decimal {
    match cell {
        Cell::Number(n) => Decimal::try_from(*n).unwrap_or(Decimal::ZERO),
        Cell::Text(s) => {
            let cleaned = clean_number(s);
            Decimal::from_str(&cleaned).unwrap_or(Decimal::ZERO)
        }
        Cell::Empty => Decimal::ZERO,
    }
}

/// Parse a non-negative integer quantity, defaulting to `0`.
pub fn parse_quantity(cell: &Cell) -> u32 {
    let n = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => normalize_number(s),
        Cell::Empty => 0.0,
    };

    if n.is_finite() && n > 0.0 {
        n.trunc().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_currency_and_separators() {
        assert_eq!(normalize_number("₹1,234.56"), 1234.56);
        assert_eq!(normalize_number("1 234.56"), 1234.56);
    }

    #[test]
    fn test_empty_and_garbage_default_to_zero() {
        assert_eq!(normalize_number(""), 0.0);
        assert_eq!(normalize_number("abc"), 0.0);
        assert_eq!(normalize_number("--..--"), 0.0);
    }

    #[test]
    fn test_negative_with_unit_suffix() {
        assert_eq!(normalize_number("-12.3 kg"), -12.3);
    }

    #[test]
    fn test_repeated_points_collapse() {
        assert_eq!(normalize_number("1.2.3"), 1.23);
    }

    #[test]
    fn test_parse_decimal_from_cells() {
        assert_eq!(
            parse_decimal(&Cell::Text("₹500.00".into())),
            Decimal::new(50000, 2)
        );
        assert_eq!(parse_decimal(&Cell::Number(42.5)), Decimal::new(425, 1));
        assert_eq!(parse_decimal(&Cell::Empty), Decimal::ZERO);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(&Cell::Text("5".into())), 5);
        assert_eq!(parse_quantity(&Cell::Text("5 units".into())), 5);
        assert_eq!(parse_quantity(&Cell::Number(12.0)), 12);
        assert_eq!(parse_quantity(&Cell::Text("-3".into())), 0);
        assert_eq!(parse_quantity(&Cell::Empty), 0);
    }
}
