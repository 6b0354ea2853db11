//! Canonical purchase-order records produced by the extraction engine.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical field names shared between profiles and the engine.
///
/// Header and line-item fields live in one namespace; profiles reference
/// these names in anchor rules and column synonym tables.
pub mod fields {
    // Header fields.
    pub const PO_NUMBER: &str = "po_number";
    pub const PO_DATE: &str = "po_date";
    pub const DELIVERY_DATE: &str = "delivery_date";
    pub const EXPIRY_DATE: &str = "expiry_date";
    pub const VENDOR_NAME: &str = "vendor_name";
    pub const VENDOR_CODE: &str = "vendor_code";
    pub const VENDOR_GSTIN: &str = "vendor_gstin";
    pub const BUYER_NAME: &str = "buyer_name";
    pub const BUYER_GSTIN: &str = "buyer_gstin";
    pub const SHIP_TO_LOCATION: &str = "ship_to_location";
    pub const SHIP_TO_ADDRESS: &str = "ship_to_address";
    pub const CURRENCY: &str = "currency";
    pub const STATUS: &str = "status";
    pub const NOTES: &str = "notes";
    pub const TOTAL_AMOUNT: &str = "total_amount";
    pub const TOTAL_QUANTITY: &str = "total_quantity";

    // Line-item fields.
    pub const SERIAL: &str = "serial";
    pub const ITEM_CODE: &str = "item_code";
    pub const SKU: &str = "sku";
    pub const ASIN: &str = "asin";
    pub const ARTICLE_ID: &str = "article_id";
    pub const HSN_CODE: &str = "hsn_code";
    pub const UPC: &str = "upc";
    pub const DESCRIPTION: &str = "description";
    pub const QUANTITY: &str = "quantity";
    pub const UNIT_COST: &str = "unit_cost";
    pub const TAX_RATE: &str = "tax_rate";
    pub const TAX_AMOUNT: &str = "tax_amount";
    pub const MRP: &str = "mrp";
    pub const LINE_TOTAL: &str = "line_total";
}

/// A normalized scalar value stored in a [`HeaderFieldSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => d.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// Header fields discovered during scanning, keyed by canonical name.
///
/// Writes follow a first-match-wins policy: once a field is populated,
/// later matches are ignored. Fields flagged repeatable in the profile are
/// appended through [`HeaderFieldSet::append`]; totals, which the Aggregator
/// owns, go through [`HeaderFieldSet::overwrite`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderFieldSet {
    values: BTreeMap<String, FieldValue>,
}

impl HeaderFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value unless the field is already populated.
    /// Returns true when the write took effect.
    pub fn set(&mut self, field: &str, value: FieldValue) -> bool {
        if self.values.contains_key(field) {
            return false;
        }
        self.values.insert(field.to_string(), value);
        true
    }

    /// Append text to a repeatable field, separated by `". "`.
    pub fn append(&mut self, field: &str, text: &str) {
        match self.values.get_mut(field) {
            Some(FieldValue::Text(existing)) => {
                existing.push_str(". ");
                existing.push_str(text);
            }
            Some(other) => {
                let joined = format!("{}. {}", other.as_text(), text);
                *other = FieldValue::Text(joined);
            }
            None => {
                self.values
                    .insert(field.to_string(), FieldValue::Text(text.to_string()));
            }
        }
    }

    /// Unconditional write, used by the Aggregator for recomputed totals.
    pub fn overwrite(&mut self, field: &str, value: FieldValue) {
        self.values.insert(field.to_string(), value);
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn get_text(&self, field: &str) -> Option<String> {
        self.values.get(field).map(FieldValue::as_text)
    }

    pub fn get_date(&self, field: &str) -> Option<NaiveDate> {
        self.values.get(field).and_then(FieldValue::as_date)
    }

    pub fn get_number(&self, field: &str) -> Option<Decimal> {
        self.values.get(field).and_then(FieldValue::as_number)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }
}

/// A single canonical line item. Never mutated after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Sequential number within the extracted order (1-based).
    pub line_number: u32,

    /// Vendor item/material code.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub item_code: String,

    /// Stock keeping unit.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sku: String,

    /// Amazon standard identification number.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub asin: String,

    /// Marketplace article identifier.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub article_id: String,

    /// HSN tax classification code.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hsn_code: String,

    /// Universal product code / EAN.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub upc: String,

    /// Product name or description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Ordered quantity.
    pub quantity: u32,

    /// Cost per unit.
    pub unit_cost: Decimal,

    /// Tax rate percentage applied to the line.
    pub tax_rate: Decimal,

    /// Tax amount for the line.
    pub tax_amount: Decimal,

    /// Maximum retail price, where the vendor declares one.
    pub mrp: Decimal,

    /// Total amount for the line.
    pub total_amount: Decimal,

    /// Vendor-specific fields with no canonical slot.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, String>,
}

impl LineItem {
    /// Acceptance policy: a row must resolve at least one identifier
    /// (code/SKU/ASIN/article-id) or a product name.
    pub fn has_identifier(&self) -> bool {
        !self.item_code.is_empty()
            || !self.sku.is_empty()
            || !self.asin.is_empty()
            || !self.article_id.is_empty()
            || !self.description.is_empty()
    }
}

/// Severity of a non-fatal extraction event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

/// A structured extraction event, attached to the result instead of being
/// interleaved with log output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Engine stage that produced the event.
    pub stage: String,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn info(stage: &str, message: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(stage: &str, message: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Terminal artifact of an extraction, handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Discovered header fields (PO metadata plus recomputed totals).
    pub header: HeaderFieldSet,

    /// Accepted line items, in document order.
    pub lines: Vec<LineItem>,

    /// Always equals `lines.len()`.
    pub total_items: usize,

    /// Sum of line quantities.
    pub total_quantity: u64,

    /// Sum of line totals; always derived from lines, never from
    /// document-declared summary text.
    pub total_amount: Decimal,

    /// Distinct HSN codes across all lines, sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hsn_codes: Vec<String>,

    /// Non-fatal events recorded during extraction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ExtractionResult {
    /// Check the result invariants; returns human-readable issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.total_items != self.lines.len() {
            issues.push(format!(
                "total_items ({}) differs from line count ({})",
                self.total_items,
                self.lines.len()
            ));
        }

        let quantity_sum: u64 = self.lines.iter().map(|l| u64::from(l.quantity)).sum();
        if self.total_quantity != quantity_sum {
            issues.push(format!(
                "total_quantity ({}) differs from line quantity sum ({})",
                self.total_quantity, quantity_sum
            ));
        }

        let amount_sum: Decimal = self.lines.iter().map(|l| l.total_amount).sum();
        if !self.lines.is_empty() && self.total_amount != amount_sum {
            issues.push(format!(
                "total_amount ({}) differs from line total sum ({})",
                self.total_amount, amount_sum
            ));
        }

        for line in &self.lines {
            if !line.has_identifier() {
                issues.push(format!("line {} has no identifier", line.line_number));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_match_wins() {
        let mut set = HeaderFieldSet::new();
        assert!(set.set(fields::PO_NUMBER, FieldValue::Text("PO-1".into())));
        assert!(!set.set(fields::PO_NUMBER, FieldValue::Text("PO-2".into())));
        assert_eq!(set.get_text(fields::PO_NUMBER), Some("PO-1".to_string()));
    }

    #[test]
    fn test_append_concatenates() {
        let mut set = HeaderFieldSet::new();
        set.append(fields::NOTES, "Payment Terms: NET 30");
        set.append(fields::NOTES, "Freight Terms: Collect");
        assert_eq!(
            set.get_text(fields::NOTES),
            Some("Payment Terms: NET 30. Freight Terms: Collect".to_string())
        );
    }

    #[test]
    fn test_overwrite_replaces() {
        let mut set = HeaderFieldSet::new();
        set.set(fields::TOTAL_AMOUNT, FieldValue::Number(Decimal::new(100, 0)));
        set.overwrite(fields::TOTAL_AMOUNT, FieldValue::Number(Decimal::new(250, 0)));
        assert_eq!(
            set.get_number(fields::TOTAL_AMOUNT),
            Some(Decimal::new(250, 0))
        );
    }

    #[test]
    fn test_line_identifier_policy() {
        let mut line = LineItem::default();
        assert!(!line.has_identifier());
        line.hsn_code = "09109100".to_string();
        assert!(!line.has_identifier());
        line.sku = "SKU1".to_string();
        assert!(line.has_identifier());
    }

    #[test]
    fn test_validate_flags_total_mismatch() {
        let result = ExtractionResult {
            header: HeaderFieldSet::new(),
            lines: vec![LineItem {
                line_number: 1,
                sku: "A".into(),
                quantity: 5,
                ..Default::default()
            }],
            total_items: 1,
            total_quantity: 4,
            total_amount: Decimal::ZERO,
            hsn_codes: Vec::new(),
            diagnostics: Vec::new(),
        };

        let issues = result.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("total_quantity"));
    }
}
