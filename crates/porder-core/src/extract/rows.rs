//! Row extraction and validation below the located table header.

use rust_decimal::Decimal;
use tracing::debug;

use crate::grid::{Cell, RawGrid};
use crate::models::profile::VendorProfile;
use crate::models::record::{fields, Diagnostic, LineItem};
use crate::rules::numeric::{parse_decimal, parse_quantity};

use super::table::ColumnMapping;

pub const STAGE: &str = "row_scan";

fn is_blank(row: &[Cell]) -> bool {
    row.iter().all(Cell::is_empty)
}

/// Summary rows announce themselves in their first populated cell
/// ("Total", "Grand Total", "Subtotal").
fn is_summary(row: &[Cell], profile: &VendorProfile) -> bool {
    row.iter()
        .find(|c| !c.is_empty())
        .map(|cell| {
            let norm = cell.normalized();
            profile.summary_keywords.iter().any(|kw| norm.starts_with(kw))
        })
        .unwrap_or(false)
}

fn mapped_text(row: &[Cell], mapping: &ColumnMapping, field: &str) -> String {
    mapping
        .get(field)
        .and_then(|col| row.get(col))
        .map(|c| c.as_text().trim().to_string())
        .unwrap_or_default()
}

fn mapped_cell<'a>(row: &'a [Cell], mapping: &ColumnMapping, field: &str) -> &'a Cell {
    static EMPTY: Cell = Cell::Empty;
    mapping
        .get(field)
        .and_then(|col| row.get(col))
        .unwrap_or(&EMPTY)
}

fn build_item(
    row: &[Cell],
    mapping: &ColumnMapping,
    profile: &VendorProfile,
    line_number: u32,
) -> LineItem {
    let quantity = parse_quantity(mapped_cell(row, mapping, fields::QUANTITY));
    let unit_cost = parse_decimal(mapped_cell(row, mapping, fields::UNIT_COST));

    // Tax rate falls back to the vendor default only when the document has
    // no tax column at all; an explicit zero in a mapped column stands.
    let tax_rate = if mapping.contains(fields::TAX_RATE) {
        parse_decimal(mapped_cell(row, mapping, fields::TAX_RATE))
    } else {
        profile.defaults.tax_rate
    };

    let mut total_amount = parse_decimal(mapped_cell(row, mapping, fields::LINE_TOTAL));
    if total_amount.is_zero() && !unit_cost.is_zero() && quantity > 0 {
        total_amount = unit_cost * Decimal::from(quantity);
    }

    LineItem {
        line_number,
        item_code: mapped_text(row, mapping, fields::ITEM_CODE),
        sku: mapped_text(row, mapping, fields::SKU),
        asin: mapped_text(row, mapping, fields::ASIN),
        article_id: mapped_text(row, mapping, fields::ARTICLE_ID),
        hsn_code: mapped_text(row, mapping, fields::HSN_CODE),
        upc: mapped_text(row, mapping, fields::UPC),
        description: mapped_text(row, mapping, fields::DESCRIPTION),
        quantity,
        unit_cost,
        tax_rate,
        tax_amount: parse_decimal(mapped_cell(row, mapping, fields::TAX_AMOUNT)),
        mrp: parse_decimal(mapped_cell(row, mapping, fields::MRP)),
        total_amount,
        extensions: Default::default(),
    }
}

/// Walk the rows below the table header and turn data rows into line items.
///
/// Blank rows are skipped, not treated as end-of-table (merged-cell exports
/// interleave them with data). Summary rows either terminate the scan or are
/// skipped, per the profile. When the profile declares a serial column, rows
/// without a numeric value there are section labels or continuations and are
/// skipped too.
pub fn extract_rows(
    grid: &RawGrid,
    header_row: usize,
    mapping: &ColumnMapping,
    profile: &VendorProfile,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<LineItem> {
    let mut items = Vec::new();
    let mut rejected = 0usize;

    for row_idx in (header_row + 1)..grid.row_count() {
        let Some(row) = grid.row(row_idx) else { break };

        if is_blank(row) {
            continue;
        }
        if is_summary(row, profile) {
            if profile.stop_at_summary {
                debug!(row = row_idx, "summary row terminates scan");
                break;
            }
            continue;
        }
        if let Some(serial_col) = profile.serial_column {
            let numeric_serial = row.get(serial_col).and_then(Cell::as_number).is_some();
            if !numeric_serial {
                debug!(row = row_idx, "non-numeric serial, skipping");
                continue;
            }
        }

        let item = build_item(row, mapping, profile, items.len() as u32 + 1);
        if item.has_identifier() {
            items.push(item);
        } else {
            rejected += 1;
        }
    }

    if rejected > 0 {
        diagnostics.push(Diagnostic::warning(
            STAGE,
            format!("{} row(s) rejected: no item identifier", rejected),
        ));
    }
    debug!(accepted = items.len(), rejected, "row scan complete");

    items
}
