//! Header field locator.
//!
//! Scans a bounded window of leading rows for labeled fields. Two matching
//! modes are tried per cell: a label cell whose value lives at a fixed column
//! of the same row, and an inline `Label: value` cell. First successful match
//! per field wins; anchors flagged `append` concatenate every match instead.
//!
//! This stage never fails. Unmatched fields simply stay absent and downstream
//! consumers tolerate the gaps.

use std::collections::HashMap;

use tracing::debug;

use crate::grid::{Cell, RawGrid, TextLines};
use crate::models::profile::{AnchorLocation, ValueKind, VendorProfile};
use crate::models::record::{fields, Diagnostic, FieldValue, HeaderFieldSet};
use crate::rules::patterns::{
    DECLARED_TOTAL_AMOUNT, DECLARED_TOTAL_QUANTITY, PO_NUMBER_DASHED, PO_NUMBER_INLINE,
};
use crate::rules::{dates, numeric};

pub const STAGE: &str = "header_scan";

/// Scan the grid's header region and collect every anchored field.
pub fn locate_header_fields(
    grid: &RawGrid,
    profile: &VendorProfile,
    diagnostics: &mut Vec<Diagnostic>,
) -> HeaderFieldSet {
    let mut header = HeaderFieldSet::new();
    let window = grid.row_count().min(profile.scan_window_rows);

    // Ordinal disambiguation: the Nth occurrence of a label feeds the Nth
    // anchor declaring it, in profile order. Counted separately per mode so
    // an inline `GST:` does not consume a label-cell `GST` slot.
    let mut column_hits: HashMap<String, usize> = HashMap::new();
    let mut inline_hits: HashMap<String, usize> = HashMap::new();

    for row_idx in 0..window {
        let Some(row) = grid.row(row_idx) else { break };

        for cell in row {
            if cell.is_empty() {
                continue;
            }

            // Merged spreadsheet cells arrive with embedded newlines; treat
            // each visual line separately.
            let text = cell.as_text();
            for line in text.split('\n') {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match_label_cell(
                    grid, row_idx, line, profile, &mut header, &mut column_hits, diagnostics,
                );
                match_inline_cell(line, profile, &mut header, &mut inline_hits, diagnostics);
                sniff_po_number(line, &mut header);
            }
        }
    }

    debug!(
        fields = header.len(),
        window, "header scan complete"
    );
    header
}

/// Text-mode variant for PDF-derived input. Lines have no columns, so only
/// inline anchors and free-form sniffing apply. Document-declared totals are
/// captured as advisory fields; the aggregator overwrites them with values
/// recomputed from extracted lines.
pub fn locate_header_fields_text(
    lines: &TextLines,
    profile: &VendorProfile,
    diagnostics: &mut Vec<Diagnostic>,
) -> HeaderFieldSet {
    let mut header = HeaderFieldSet::new();
    let mut inline_hits: HashMap<String, usize> = HashMap::new();

    for line in lines.iter().take(profile.scan_window_rows) {
        match_inline_cell(line, profile, &mut header, &mut inline_hits, diagnostics);
        sniff_po_number(line, &mut header);
    }

    // Declared totals sit at the bottom of the document, past the window.
    for line in lines.iter() {
        if let Some(caps) = DECLARED_TOTAL_QUANTITY.captures(line) {
            header.set(
                fields::TOTAL_QUANTITY,
                FieldValue::Number(numeric::parse_decimal(&Cell::from_text(&caps[1]))),
            );
        }
        if let Some(caps) = DECLARED_TOTAL_AMOUNT.captures(line) {
            header.set(
                fields::TOTAL_AMOUNT,
                FieldValue::Number(numeric::parse_decimal(&Cell::from_text(&caps[1]))),
            );
        }
    }

    debug!(fields = header.len(), "text header scan complete");
    header
}

/// Mode 1: the whole cell equals a known label; the value sits at a
/// profile-declared column of the same row.
fn match_label_cell(
    grid: &RawGrid,
    row_idx: usize,
    line: &str,
    profile: &VendorProfile,
    header: &mut HeaderFieldSet,
    hits: &mut HashMap<String, usize>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let norm = line.to_lowercase();

    let anchors: Vec<_> = profile
        .header_anchors
        .iter()
        .filter(|a| {
            matches!(a.location, AnchorLocation::Column(_))
                && a.labels.iter().any(|l| l.as_str() == norm)
        })
        .collect();
    if anchors.is_empty() {
        return;
    }

    let occurrence = hits.entry(norm).or_insert(0);
    let Some(anchor) = anchors.get(*occurrence).or_else(|| anchors.last()) else {
        return;
    };
    *occurrence += 1;

    let AnchorLocation::Column(col) = anchor.location else {
        return;
    };
    let value_cell = grid.cell(row_idx, col);
    if value_cell.is_empty() {
        return;
    }

    store(
        header,
        &anchor.field,
        line,
        value_cell,
        anchor.value_kind,
        anchor.append,
        profile,
        diagnostics,
    );
}

/// Mode 2: a single cell line carries `Label: value`.
fn match_inline_cell(
    line: &str,
    profile: &VendorProfile,
    header: &mut HeaderFieldSet,
    hits: &mut HashMap<String, usize>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let norm = line.to_lowercase();

    for anchor in &profile.header_anchors {
        if anchor.location != AnchorLocation::Inline {
            continue;
        }

        let Some(label) = anchor
            .labels
            .iter()
            .find(|l| matches_inline_label(&norm, l))
        else {
            continue;
        };

        // Same ordinal rule as label cells, per matched label text.
        let anchors_for_label: Vec<_> = profile
            .header_anchors
            .iter()
            .filter(|a| {
                a.location == AnchorLocation::Inline
                    && a.labels.iter().any(|l| l == label)
            })
            .collect();
        let occurrence = hits.entry(label.clone()).or_insert(0);
        let target = anchors_for_label
            .get(*occurrence)
            .copied()
            .unwrap_or(anchor);
        *occurrence += 1;

        let value = line[line.find(':').map(|i| i + 1).unwrap_or(0)..].trim();
        if value.is_empty() {
            return;
        }

        let label_as_typed = line[..line.find(':').unwrap_or(0)].trim();
        store(
            header,
            &target.field,
            label_as_typed,
            &Cell::from_text(value),
            target.value_kind,
            target.append,
            profile,
            diagnostics,
        );
        return;
    }
}

/// An inline label matches when the line starts with it and a colon follows
/// (possibly after whitespace).
fn matches_inline_label(norm_line: &str, label: &str) -> bool {
    let Some(rest) = norm_line.strip_prefix(label) else {
        return false;
    };
    rest.trim_start().starts_with(':')
}

/// Marketplace PO numbers show up in free-form header text (`PO: 664155NW`,
/// `Purchase Order PO-2172140`) without a clean label cell.
fn sniff_po_number(line: &str, header: &mut HeaderFieldSet) {
    if header.contains(fields::PO_NUMBER) {
        return;
    }

    if let Some(caps) = PO_NUMBER_INLINE.captures(line) {
        header.set(fields::PO_NUMBER, FieldValue::Text(caps[1].to_string()));
    } else if let Some(caps) = PO_NUMBER_DASHED.captures(line) {
        header.set(fields::PO_NUMBER, FieldValue::Text(caps[1].to_string()));
    }
}

#[allow(clippy::too_many_arguments)]
fn store(
    header: &mut HeaderFieldSet,
    field: &str,
    label_as_typed: &str,
    value_cell: &Cell,
    kind: ValueKind,
    append: bool,
    profile: &VendorProfile,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match kind {
        ValueKind::Date => {
            match dates::normalize_date(value_cell, &profile.date_format_hints) {
                Some(date) => {
                    header.set(field, FieldValue::Date(date));
                }
                None => {
                    diagnostics.push(Diagnostic::info(
                        STAGE,
                        format!(
                            "unparseable date {:?} for field {}",
                            value_cell.as_text(),
                            field
                        ),
                    ));
                }
            }
        }
        ValueKind::Number => {
            header.set(field, FieldValue::Number(numeric::parse_decimal(value_cell)));
        }
        ValueKind::Text => {
            let text = value_cell.as_text().trim().to_string();
            if text.is_empty() {
                return;
            }
            if append {
                header.append(field, &format!("{}: {}", label_as_typed, text));
            } else {
                header.set(field, FieldValue::Text(text));
            }
        }
    }
}
