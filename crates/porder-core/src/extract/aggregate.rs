//! Result assembly.
//!
//! Totals are always recomputed from the accepted lines. Documents declare
//! their own totals in headers and summary rows, but those lie often enough
//! (stale exports, rounding, partial tables) that the recomputed values
//! overwrite whatever the header scan picked up.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::record::{
    fields, Diagnostic, ExtractionResult, FieldValue, HeaderFieldSet, LineItem,
};

pub const STAGE: &str = "aggregate";

/// Assemble the final result from header fields and accepted lines.
pub fn finalize(
    mut header: HeaderFieldSet,
    lines: Vec<LineItem>,
    mut diagnostics: Vec<Diagnostic>,
) -> ExtractionResult {
    let total_quantity: u64 = lines.iter().map(|l| u64::from(l.quantity)).sum();
    let total_amount: Decimal = lines.iter().map(|l| l.total_amount).sum();

    let declared = header.get_number(fields::TOTAL_AMOUNT);
    if let Some(declared) = declared {
        if declared != total_amount {
            diagnostics.push(Diagnostic::info(
                STAGE,
                format!(
                    "declared total {} replaced by computed total {}",
                    declared, total_amount
                ),
            ));
        }
    }

    header.overwrite(fields::TOTAL_QUANTITY, FieldValue::Number(total_quantity.into()));
    header.overwrite(fields::TOTAL_AMOUNT, FieldValue::Number(total_amount));

    if !lines.is_empty() && total_amount.is_zero() {
        diagnostics.push(Diagnostic::warning(
            STAGE,
            "lines extracted but computed total amount is zero",
        ));
    }

    let mut hsn_codes: Vec<String> = lines
        .iter()
        .filter(|l| !l.hsn_code.is_empty())
        .map(|l| l.hsn_code.clone())
        .collect();
    hsn_codes.sort();
    hsn_codes.dedup();

    debug!(
        items = lines.len(),
        total_quantity,
        %total_amount,
        "aggregation complete"
    );

    ExtractionResult {
        total_items: lines.len(),
        total_quantity,
        total_amount,
        hsn_codes,
        header,
        lines,
        diagnostics,
    }
}
