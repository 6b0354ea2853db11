//! The extraction engine.
//!
//! One pipeline for every vendor: scan the header region, locate the
//! line-item table, map its columns, extract rows, aggregate. PDF-derived
//! text input replaces the table stages with the pattern fallback chain.
//! Vendor differences live entirely in [`VendorProfile`] data.

pub mod aggregate;
pub mod fallback;
pub mod header;
pub mod rows;
pub mod table;

use tracing::{debug, info};

use crate::error::{ExtractError, Result};
use crate::grid::{DocumentInput, RawGrid, TextLines};
use crate::models::profile::VendorProfile;
use crate::models::record::{Diagnostic, ExtractionResult};

pub use fallback::{FallbackOutcome, Strategy};
pub use table::{ColumnMapping, LocatePass, TableLocation};

/// Profile-driven purchase-order extractor.
///
/// Stateless across documents; one extractor can process any number of
/// inputs, so the same bytes always produce the same result.
#[derive(Debug, Clone)]
pub struct Extractor {
    profile: VendorProfile,
}

impl Extractor {
    pub fn new(profile: VendorProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &VendorProfile {
        &self.profile
    }

    /// Run the full pipeline on one document.
    pub fn extract(&self, input: &DocumentInput) -> Result<ExtractionResult> {
        match input {
            DocumentInput::Grid(grid) => self.extract_grid(grid),
            DocumentInput::Text(lines) => self.extract_text(lines),
        }
    }

    fn extract_grid(&self, grid: &RawGrid) -> Result<ExtractionResult> {
        if grid.is_empty() {
            return Err(ExtractError::MalformedInput("empty grid".to_string()));
        }

        let mut diagnostics = Vec::new();
        let header = header::locate_header_fields(grid, &self.profile, &mut diagnostics);
        note_missing_po(&header, &mut diagnostics);

        let location = table::locate_item_table(grid, &self.profile)?;
        let pass = match location.pass {
            LocatePass::Mandatory => "mandatory keywords".to_string(),
            LocatePass::Generic(score) => format!("generic score {}", score),
        };
        diagnostics.push(Diagnostic::info(
            table::STAGE,
            format!("item table header at row {} ({})", location.row, pass),
        ));

        let header_row = grid
            .row(location.row)
            .ok_or(ExtractError::StructureNotFound {
                stage: table::STAGE,
                scanned: location.row,
            })?;
        let mapping = table::map_columns(header_row, &self.profile);
        debug!(columns = mapping.len(), "columns mapped");

        let lines = rows::extract_rows(grid, location.row, &mapping, &self.profile, &mut diagnostics);
        if lines.is_empty() {
            return Err(ExtractError::NoValidLineItems);
        }

        let result = aggregate::finalize(header, lines, diagnostics);
        info!(
            profile = %self.profile.name,
            items = result.total_items,
            "grid extraction complete"
        );
        Ok(result)
    }

    fn extract_text(&self, lines: &TextLines) -> Result<ExtractionResult> {
        if lines.is_empty() {
            return Err(ExtractError::MalformedInput("empty text".to_string()));
        }

        let mut diagnostics = Vec::new();
        let header = header::locate_header_fields_text(lines, &self.profile, &mut diagnostics);
        note_missing_po(&header, &mut diagnostics);

        let outcome = fallback::extract_items(lines, &self.profile, &mut diagnostics);
        if outcome.items.is_empty() {
            return Err(ExtractError::NoValidLineItems);
        }

        let result = aggregate::finalize(header, outcome.items, diagnostics);
        info!(
            profile = %self.profile.name,
            items = result.total_items,
            strategy = outcome.strategy.map(|s| s.name()).unwrap_or("none"),
            "text extraction complete"
        );
        Ok(result)
    }
}

/// A missing PO number stays absent (never a synthesized placeholder), but
/// it is worth surfacing to the operator.
fn note_missing_po(header: &crate::models::record::HeaderFieldSet, diagnostics: &mut Vec<Diagnostic>) {
    if !header.contains(crate::models::record::fields::PO_NUMBER) {
        diagnostics.push(Diagnostic::warning(
            header::STAGE,
            "po_number not found in header region",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::fields;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn amazon_grid() -> RawGrid {
        RawGrid::from_strings(vec![
            vec!["Vendor", "", "", "0M7KK"],
            vec!["Ship to location", "", "", "DEL5"],
            vec!["PO: 664155NW"],
            vec![],
            vec!["#", "ASIN", "External Id", "Title", "Quantity Requested", "Unit Cost", "Total Amount"],
            vec!["1", "B000X1", "SKU1", "Widget", "5", "100.00", "500.00"],
            vec!["2", "B000X2", "SKU2", "Gadget", "3", "50.00", "150.00"],
            vec!["", "", "", "", "Total", "", "999.99"],
        ])
    }

    #[test]
    fn test_grid_pipeline_end_to_end() {
        let extractor = Extractor::new(VendorProfile::amazon());
        let result = extractor
            .extract(&DocumentInput::Grid(amazon_grid()))
            .unwrap();

        assert_eq!(result.header.get_text(fields::PO_NUMBER), Some("664155NW".into()));
        assert_eq!(result.header.get_text(fields::VENDOR_CODE), Some("0M7KK".into()));
        assert_eq!(result.header.get_text(fields::SHIP_TO_LOCATION), Some("DEL5".into()));

        assert_eq!(result.total_items, 2);
        assert_eq!(result.total_quantity, 8);
        assert_eq!(result.total_amount, Decimal::new(65000, 2));
        assert_eq!(result.lines[0].asin, "B000X1");
        assert_eq!(result.lines[0].sku, "SKU1");
        assert_eq!(result.lines[1].description, "Gadget");
        assert!(result.validate().is_empty());
    }

    #[test]
    fn test_declared_summary_never_trusted() {
        // The sheet declares 999.99; the engine reports the line sum.
        let extractor = Extractor::new(VendorProfile::amazon());
        let result = extractor
            .extract(&DocumentInput::Grid(amazon_grid()))
            .unwrap();
        assert_eq!(
            result.header.get_number(fields::TOTAL_AMOUNT),
            Some(Decimal::new(65000, 2))
        );
    }

    #[test]
    fn test_column_order_is_irrelevant() {
        let extractor = Extractor::new(VendorProfile::amazon());

        let a = extractor
            .extract(&DocumentInput::Grid(RawGrid::from_strings(vec![
                vec!["ASIN", "Title", "Quantity", "Total Amount"],
                vec!["B000X1", "Widget", "5", "500.00"],
            ])))
            .unwrap();
        let b = extractor
            .extract(&DocumentInput::Grid(RawGrid::from_strings(vec![
                vec!["Total Amount", "Quantity", "ASIN", "Title"],
                vec!["500.00", "5", "B000X1", "Widget"],
            ])))
            .unwrap();

        assert_eq!(a.lines, b.lines);
        assert_eq!(a.total_amount, b.total_amount);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = Extractor::new(VendorProfile::amazon());
        let input = DocumentInput::Grid(amazon_grid());

        let first = extractor.extract(&input).unwrap();
        let second = extractor.extract(&input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_po_number_yields_warning() {
        let extractor = Extractor::new(VendorProfile::amazon());
        let result = extractor
            .extract(&DocumentInput::Grid(RawGrid::from_strings(vec![
                vec!["ASIN", "Quantity"],
                vec!["B000X1", "5"],
            ])))
            .unwrap();

        assert!(result.header.get_text(fields::PO_NUMBER).is_none());
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("po_number not found")));
    }

    #[test]
    fn test_empty_grid_is_malformed_input() {
        let extractor = Extractor::new(VendorProfile::generic());
        let err = extractor
            .extract(&DocumentInput::Grid(RawGrid::normalize(Vec::new())))
            .unwrap_err();
        assert!(matches!(err, ExtractError::MalformedInput(_)));
    }

    #[test]
    fn test_table_without_data_rows() {
        let extractor = Extractor::new(VendorProfile::amazon());
        let err = extractor
            .extract(&DocumentInput::Grid(RawGrid::from_strings(vec![vec![
                "ASIN", "Title", "Quantity",
            ]])))
            .unwrap_err();
        assert!(matches!(err, ExtractError::NoValidLineItems));
    }

    #[test]
    fn test_no_table_is_structure_not_found() {
        let extractor = Extractor::new(VendorProfile::amazon());
        let err = extractor
            .extract(&DocumentInput::Grid(RawGrid::from_strings(vec![
                vec!["just", "a", "letter"],
                vec!["to", "our", "suppliers"],
            ])))
            .unwrap_err();
        assert!(matches!(err, ExtractError::StructureNotFound { .. }));
    }

    #[test]
    fn test_text_pipeline_end_to_end() {
        let text = "P.O. Number: 2172510\n\
                    Date: 15/01/2024\n\
                    10123456 09109100 8901030865278 Amul Butter 500g 40.00 5.0 0.0 42.00 99.00 57.5 12 504.00\n\
                    10123457 09109200 8901030865285 Tata Salt 1kg 20.00 5.0 0.0 21.00 28.00 25.0 24 504.00\n\
                    Total Quantity: 99";

        let extractor = Extractor::new(VendorProfile::blinkit());
        let result = extractor
            .extract(&DocumentInput::Text(TextLines::from_text(text)))
            .unwrap();

        assert_eq!(result.header.get_text(fields::PO_NUMBER), Some("2172510".into()));
        assert_eq!(result.total_items, 2);
        // Declared 99 is ignored; quantity comes from the parsed rows.
        assert_eq!(result.total_quantity, 36);
        assert_eq!(result.total_amount, Decimal::new(100800, 2));
        assert_eq!(result.hsn_codes, vec!["09109100", "09109200"]);
    }

    #[test]
    fn test_text_without_items() {
        let extractor = Extractor::new(VendorProfile::blinkit());
        let err = extractor
            .extract(&DocumentInput::Text(TextLines::from_text(
                "P.O. Number: 2172510\nno items here",
            )))
            .unwrap_err();
        assert!(matches!(err, ExtractError::NoValidLineItems));
    }
}
