//! Compiled regex patterns shared across extraction stages.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Date-shaped token inside free text: `26/9/2025`, `15-01-24`, `08/Aug/2025`.
    pub static ref DATE_TOKEN: Regex =
        Regex::new(r"\b\d{1,4}[/\-](?:\d{1,2}|[A-Za-z]{3,9})[/\-]\d{1,4}\b").unwrap();

    /// PO number declared inline: `PO: 664155NW`, `P.O. Number: 12345`,
    /// `Purchase Order: 12345`.
    pub static ref PO_NUMBER_INLINE: Regex =
        Regex::new(r"(?i)\b(?:P\.?O\.?\s*(?:Number|No\.?|#)?|Purchase\s+Order)\s*[:\-]\s*([A-Z0-9][A-Z0-9/\-]*)").unwrap();

    /// PO number in the `PO-12345` style used by some marketplaces.
    pub static ref PO_NUMBER_DASHED: Regex = Regex::new(r"\bPO-(\d+)\b").unwrap();

    /// Numeric token (integer or decimal) inside a text line.
    pub static ref NUMERIC_TOKEN: Regex = Regex::new(r"\d+\.?\d*").unwrap();

    /// Declared total quantity in free text: `Total Quantity: 120`.
    pub static ref DECLARED_TOTAL_QUANTITY: Regex =
        Regex::new(r"(?i)Total\s+Quantity\s*[:\s]\s*(\d+)").unwrap();

    /// Declared total amount in free text: `Total Amount: 1,234.56`.
    pub static ref DECLARED_TOTAL_AMOUNT: Regex =
        Regex::new(r"(?i)Total\s+Amount\s*[:\s]\s*([\d,]+\.?\d*)").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_po_number_inline_variants() {
        for (text, expected) in [
            ("PO: 664155NW", "664155NW"),
            ("P.O. Number: 2172510", "2172510"),
            ("Purchase Order: 99", "99"),
            ("PO # : ABC-123", "ABC-123"),
        ] {
            let caps = PO_NUMBER_INLINE.captures(text).unwrap_or_else(|| {
                panic!("no match for {:?}", text);
            });
            assert_eq!(&caps[1], expected, "input {:?}", text);
        }
    }

    #[test]
    fn test_dashed_po_number() {
        let caps = PO_NUMBER_DASHED.captures("Purchase Order PO-12345").unwrap();
        assert_eq!(&caps[1], "12345");
    }

    #[test]
    fn test_declared_totals() {
        let caps = DECLARED_TOTAL_QUANTITY.captures("Total Quantity: 120").unwrap();
        assert_eq!(&caps[1], "120");

        let caps = DECLARED_TOTAL_AMOUNT.captures("Total Amount: 1,234.56").unwrap();
        assert_eq!(&caps[1], "1,234.56");
    }

    #[test]
    fn test_date_token_finds_range_parts() {
        let hits: Vec<_> = DATE_TOKEN
            .find_iter("26/9/2025 - 21/10/2025")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(hits, vec!["26/9/2025", "21/10/2025"]);
    }
}
