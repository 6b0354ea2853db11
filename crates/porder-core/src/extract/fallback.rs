//! Text-pattern fallback extraction for PDF-derived input.
//!
//! Three strategies run in order and short-circuit at the first that yields
//! any items: a pseudo-table scan between the header line and the summary
//! line, profile-authored full-row regexes over the joined text, and a
//! per-line heuristic keyed on an identifier-shaped code token.

use std::collections::BTreeMap;

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::grid::TextLines;
use crate::models::profile::{FallbackProfile, LineDefaults, VendorProfile};
use crate::models::record::{Diagnostic, LineItem};

pub const STAGE: &str = "text_fallback";

/// Extraction strategy that produced the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    TableScan,
    RowPattern,
    LineHeuristic,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::TableScan => "table_scan",
            Strategy::RowPattern => "row_pattern",
            Strategy::LineHeuristic => "line_heuristic",
        }
    }
}

/// Outcome of the strategy chain, including per-strategy counts so callers
/// can see what was attempted.
#[derive(Debug, Default)]
pub struct FallbackOutcome {
    pub items: Vec<LineItem>,
    pub strategy: Option<Strategy>,
    pub attempts: Vec<(Strategy, usize)>,
}

/// Run the strategy chain over PDF-derived text lines.
pub fn extract_items(
    lines: &TextLines,
    profile: &VendorProfile,
    diagnostics: &mut Vec<Diagnostic>,
) -> FallbackOutcome {
    let mut outcome = FallbackOutcome::default();

    let code_regex = match Regex::new(&profile.fallback.code_pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            diagnostics.push(Diagnostic::warning(
                STAGE,
                format!("invalid code pattern: {}", e),
            ));
            None
        }
    };

    if let Some(code_regex) = &code_regex {
        let items = table_scan(lines, code_regex, profile);
        outcome.attempts.push((Strategy::TableScan, items.len()));
        if !items.is_empty() {
            return finish(outcome, Strategy::TableScan, items, diagnostics);
        }
    }

    let items = row_patterns(lines, code_regex.as_ref(), profile, diagnostics);
    outcome.attempts.push((Strategy::RowPattern, items.len()));
    if !items.is_empty() {
        return finish(outcome, Strategy::RowPattern, items, diagnostics);
    }

    if let Some(code_regex) = &code_regex {
        let items = line_heuristic(lines, code_regex, profile);
        outcome.attempts.push((Strategy::LineHeuristic, items.len()));
        if !items.is_empty() {
            return finish(outcome, Strategy::LineHeuristic, items, diagnostics);
        }
    }

    debug!("all fallback strategies came up empty");
    outcome
}

fn finish(
    mut outcome: FallbackOutcome,
    strategy: Strategy,
    items: Vec<LineItem>,
    diagnostics: &mut Vec<Diagnostic>,
) -> FallbackOutcome {
    diagnostics.push(Diagnostic::info(
        STAGE,
        format!("{} item(s) via {} strategy", items.len(), strategy.name()),
    ));
    outcome.items = items;
    outcome.strategy = Some(strategy);
    outcome
}

/// Strategy 1: find the column-header line via the mandatory keyword
/// combination, then parse every line until the summary line.
fn table_scan(lines: &TextLines, code_regex: &Regex, profile: &VendorProfile) -> Vec<LineItem> {
    if profile.mandatory_header_keywords.is_empty() {
        return Vec::new();
    }

    let header_idx = lines.iter().position(|line| {
        let norm = line.to_lowercase();
        profile
            .mandatory_header_keywords
            .iter()
            .all(|group| group.iter().any(|kw| norm.contains(kw)))
    });
    let Some(header_idx) = header_idx else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for line in lines.iter().skip(header_idx + 1) {
        let norm = line.to_lowercase();
        if profile.summary_keywords.iter().any(|kw| norm.starts_with(kw)) {
            break;
        }
        if let Some(item) = parse_item_line(line, code_regex, profile, items.len() as u32 + 1) {
            items.push(item);
        }
    }
    items
}

/// Strategy 2: profile-authored row regexes over the joined document text.
/// Capture groups are classified by shape rather than position, so profiles
/// can order their groups to match the vendor layout.
fn row_patterns(
    lines: &TextLines,
    code_regex: Option<&Regex>,
    profile: &VendorProfile,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<LineItem> {
    // Group classification needs the code shape; without it no capture can
    // be trusted as an item code.
    let Some(code_regex) = code_regex else {
        return Vec::new();
    };
    let joined = lines.joined();

    for pattern in &profile.fallback.row_patterns {
        let regex = match Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                diagnostics.push(Diagnostic::warning(
                    STAGE,
                    format!("invalid row pattern: {}", e),
                ));
                continue;
            }
        };

        let mut items = Vec::new();
        for caps in regex.captures_iter(&joined).take(profile.fallback.max_matches) {
            if let Some(item) = item_from_captures(&caps, code_regex, profile, items.len() as u32 + 1)
            {
                items.push(item);
            }
        }
        if !items.is_empty() {
            return items;
        }
    }

    Vec::new()
}

/// Strategy 3: any line carrying a code token plus enough numeric tokens is
/// treated as an item row.
fn line_heuristic(lines: &TextLines, code_regex: &Regex, profile: &VendorProfile) -> Vec<LineItem> {
    let mut items = Vec::new();
    for line in lines.iter() {
        if items.len() >= profile.fallback.max_matches {
            break;
        }
        if let Some(item) = parse_item_line(line, code_regex, profile, items.len() as u32 + 1) {
            items.push(item);
        }
    }
    items
}

fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn is_numeric_token(token: &str) -> bool {
    !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && token.bytes().filter(|b| *b == b'.').count() <= 1
        && token.bytes().any(|b| b.is_ascii_digit())
}

fn is_hsn_shaped(token: &str) -> bool {
    token.len() == 8 && is_digits(token)
}

fn is_upc_shaped(token: &str) -> bool {
    (10..=15).contains(&token.len()) && is_digits(token)
}

/// Parse one text line as an item row.
///
/// Token walk mirrors the PDF row shape: code, then optional HSN and UPC
/// tokens, then description words up to the first pure-numeric token, then
/// the numeric tail. Lines whose tail is shorter than the profile minimum
/// are not item rows.
fn parse_item_line(
    line: &str,
    code_regex: &Regex,
    profile: &VendorProfile,
    line_number: u32,
) -> Option<LineItem> {
    let code_match = code_regex.find(line)?;
    let code = code_match.as_str().to_string();
    let rest = &line[code_match.end()..];

    let mut hsn_code = String::new();
    let mut upc = String::new();
    let mut description_words: Vec<&str> = Vec::new();
    let mut numbers: Vec<Decimal> = Vec::new();

    for token in rest.split_whitespace() {
        if !numbers.is_empty() {
            // Once the numeric tail starts, everything else is numbers.
            if is_numeric_token(token) {
                if let Ok(n) = token.parse::<Decimal>() {
                    numbers.push(n);
                }
            }
            continue;
        }

        if hsn_code.is_empty() && description_words.is_empty() && is_hsn_shaped(token) {
            hsn_code = token.to_string();
        } else if upc.is_empty() && description_words.is_empty() && is_upc_shaped(token) {
            upc = token.to_string();
        } else if is_numeric_token(token) {
            if let Ok(n) = token.parse::<Decimal>() {
                numbers.push(n);
            }
        } else {
            description_words.push(token);
        }
    }

    if numbers.len() < profile.fallback.min_numeric_tokens {
        return None;
    }

    let mut item = LineItem {
        line_number,
        item_code: code,
        hsn_code,
        upc,
        description: description_words.join(" "),
        ..Default::default()
    };
    fill_amounts(&mut item, &numbers, &profile.fallback, &profile.defaults);
    Some(item)
}

/// Build an item from a row-pattern capture, classifying each group by shape.
fn item_from_captures(
    caps: &regex::Captures<'_>,
    code_regex: &Regex,
    profile: &VendorProfile,
    line_number: u32,
) -> Option<LineItem> {
    let mut item = LineItem {
        line_number,
        ..Default::default()
    };
    let mut numbers: Vec<Decimal> = Vec::new();

    for group in caps.iter().skip(1).flatten() {
        let text = group.as_str().trim();
        if text.is_empty() {
            continue;
        }

        if item.item_code.is_empty()
            && code_regex.find(text).map(|m| m.as_str() == text).unwrap_or(false)
        {
            item.item_code = text.to_string();
        } else if item.hsn_code.is_empty() && is_hsn_shaped(text) {
            item.hsn_code = text.to_string();
        } else if item.upc.is_empty() && is_upc_shaped(text) {
            item.upc = text.to_string();
        } else if is_digits(text) && text.len() <= 4 {
            // Serial column; already tracked by line_number.
        } else if text.split_whitespace().all(is_numeric_token) {
            numbers.extend(
                text.split_whitespace()
                    .filter_map(|t| t.parse::<Decimal>().ok()),
            );
        } else if item.description.is_empty() {
            item.description = text.to_string();
        }
    }

    if item.item_code.is_empty() {
        return None;
    }
    fill_amounts(&mut item, &numbers, &profile.fallback, &profile.defaults);
    Some(item)
}

/// Interpret the numeric tail of a parsed row.
///
/// The first number is the unit cost, the quantity is the first
/// point-free integer inside the plausible-quantity bounds, and the line
/// total is the largest number above the amount floor. Costs are printed
/// with decimal places (`40.00`) and quantities without (`12`), so the
/// parse scale distinguishes them even when the cost is a whole number.
fn fill_amounts(
    item: &mut LineItem,
    numbers: &[Decimal],
    fallback: &FallbackProfile,
    defaults: &LineDefaults,
) {
    let qty_min = Decimal::from(fallback.quantity_min);
    let qty_max = Decimal::from(fallback.quantity_max);

    item.unit_cost = numbers.first().copied().unwrap_or(Decimal::ZERO);
    item.quantity = numbers
        .iter()
        .find(|n| n.scale() == 0 && **n >= qty_min && **n <= qty_max)
        .and_then(|n| n.to_u32())
        .unwrap_or(0);
    item.total_amount = numbers
        .iter()
        .filter(|n| **n > fallback.amount_floor)
        .max()
        .copied()
        .unwrap_or(Decimal::ZERO);

    item.tax_rate = defaults.tax_rate;
    if !defaults.margin_percent.is_zero() {
        let mut ext = BTreeMap::new();
        ext.insert("margin_percent".to_string(), defaults.margin_percent.to_string());
        item.extensions = ext;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn blinkit_lines() -> TextLines {
        // Code, HSN, UPC, description, then the numeric tail the PDF tables
        // flatten into: basic cost, igst, cess, landing, mrp, margin, qty,
        // total.
        TextLines::from_text(
            "PURCHASE ORDER\n\
             P.O. Number: 2172510\n\
             10123456 09109100 8901030865278 Amul Butter 500g 40.00 5.0 0.0 42.00 99.00 57.5 12 504.00\n\
             10123457 09109200 8901030865285 Tata Salt 1kg 20.00 5.0 0.0 21.00 28.00 25.0 24 504.00\n\
             Total Quantity: 36",
        )
    }

    #[test]
    fn test_line_heuristic_parses_item_rows() {
        let profile = VendorProfile::blinkit();
        let mut d = Vec::new();
        let outcome = extract_items(&blinkit_lines(), &profile, &mut d);

        assert_eq!(outcome.items.len(), 2);
        let first = &outcome.items[0];
        assert_eq!(first.item_code, "10123456");
        assert_eq!(first.hsn_code, "09109100");
        assert_eq!(first.upc, "8901030865278");
        assert_eq!(first.description, "Amul Butter 500g");
        assert_eq!(first.quantity, 12);
        assert_eq!(first.unit_cost, Decimal::new(4000, 2));
        assert_eq!(first.total_amount, Decimal::new(50400, 2));
        assert_eq!(first.tax_rate, Decimal::new(5, 0));
    }

    #[test]
    fn test_table_scan_wins_when_header_line_present() {
        let profile = VendorProfile::blinkit();
        let text = "Item Code HSN Code Product UPC Basic Cost MRP Qty Total\n\
                    10123456 09109100 8901030865278 Amul Butter 500g 40.00 5.0 0.0 42.00 99.00 57.5 12 504.00\n\
                    Total Quantity: 12";
        let mut d = Vec::new();
        let outcome = extract_items(&TextLines::from_text(text), &profile, &mut d);

        assert_eq!(outcome.strategy, Some(Strategy::TableScan));
        assert_eq!(outcome.items.len(), 1);
        // Chain short-circuits: later strategies never ran.
        assert_eq!(outcome.attempts, vec![(Strategy::TableScan, 1)]);
    }

    #[test]
    fn test_short_circuit_order_without_header_line() {
        let profile = VendorProfile::blinkit();
        let mut d = Vec::new();
        let outcome = extract_items(&blinkit_lines(), &profile, &mut d);

        // No header line and the row patterns expect a tighter layout, so
        // the chain falls through to the line heuristic.
        assert_eq!(outcome.strategy, Some(Strategy::LineHeuristic));
        assert_eq!(outcome.attempts.len(), 3);
        assert_eq!(outcome.attempts[0].1, 0);
        assert_eq!(outcome.attempts[1].1, 0);
    }

    #[test]
    fn test_lines_with_few_numbers_are_not_items() {
        let profile = VendorProfile::blinkit();
        let text = "Vendor No: 10123456\n10123457 looks like a code 1.0 2.0";
        let mut d = Vec::new();
        let outcome = extract_items(&TextLines::from_text(text), &profile, &mut d);

        assert!(outcome.items.is_empty());
        assert_eq!(outcome.strategy, None);
    }

    #[test]
    fn test_invalid_code_pattern_is_nonfatal() {
        let mut profile = VendorProfile::blinkit();
        profile.fallback.code_pattern = "(unclosed".to_string();
        profile.fallback.row_patterns = vec![r"ITEM (\d{7}) QTY (\d+)".to_string()];

        let mut d = Vec::new();
        let outcome = extract_items(
            &TextLines::from_text("ITEM 1012345 QTY 5"),
            &profile,
            &mut d,
        );

        assert!(outcome.items.is_empty());
        assert!(d.iter().any(|diag| diag.message.contains("invalid code pattern")));
    }

    #[test]
    fn test_match_cap_bounds_output() {
        let mut profile = VendorProfile::blinkit();
        profile.fallback.max_matches = 3;

        let row = "10123456 09109100 8901030865278 Amul Butter 500g 40.00 5.0 0.0 42.00 99.00 57.5 12 504.00";
        let text = vec![row; 10].join("\n");
        let mut d = Vec::new();
        let outcome = extract_items(&TextLines::from_text(&text), &profile, &mut d);

        assert_eq!(outcome.items.len(), 3);
    }

    #[test]
    fn test_quantity_bounds_reject_large_integers() {
        let profile = VendorProfile::blinkit();
        // 2024 would be picked as quantity without the upper bound.
        let line = "10123456 Amul Butter 2024 40.00 5.00 0.25 99.00 12 504.00";
        let mut d = Vec::new();
        let outcome = extract_items(&TextLines::from_text(line), &profile, &mut d);

        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].quantity, 12);
    }
}
