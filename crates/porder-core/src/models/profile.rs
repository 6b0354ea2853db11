//! Declarative vendor profiles.
//!
//! A profile is data, not code: it tells the engine how to locate and map one
//! vendor's document layout. New vendors are onboarded by authoring a profile
//! (in code here, or via a JSON file), never by adding engine code paths.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};

/// How a synonym variant matches a header cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Case-insensitive equality after trimming.
    Exact,
    /// Case-insensitive containment.
    Substring,
}

/// One acceptable header-text variant for a canonical column field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub text: String,
    pub match_kind: MatchKind,
}

impl Variant {
    pub fn exact(text: &str) -> Self {
        Self {
            text: text.to_string(),
            match_kind: MatchKind::Exact,
        }
    }

    pub fn substring(text: &str) -> Self {
        Self {
            text: text.to_string(),
            match_kind: MatchKind::Substring,
        }
    }
}

/// Synonym table entry: canonical line-item field → acceptable header texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRule {
    pub field: String,
    pub variants: Vec<Variant>,
}

impl ColumnRule {
    pub fn new(field: &str, variants: Vec<Variant>) -> Self {
        Self {
            field: field.to_string(),
            variants,
        }
    }
}

/// Where the value for an anchored header field lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorLocation {
    /// Value in a fixed column of the same row as the label cell.
    Column(usize),
    /// Label and value share one cell, separated by a colon
    /// (`"PO Number: 12345"`).
    Inline,
}

/// Declared type of an anchored header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Number,
    Date,
}

/// A labeled header field to look for in the scan window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorRule {
    /// Canonical header field this anchor populates.
    pub field: String,

    /// Acceptable label texts (case-insensitive, trimmed).
    pub labels: Vec<String>,

    pub location: AnchorLocation,

    pub value_kind: ValueKind,

    /// Repeatable-append fields concatenate every match (with the label as a
    /// prefix) instead of keeping only the first.
    #[serde(default)]
    pub append: bool,
}

impl AnchorRule {
    pub fn column(field: &str, labels: &[&str], col: usize, value_kind: ValueKind) -> Self {
        Self {
            field: field.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            location: AnchorLocation::Column(col),
            value_kind,
            append: false,
        }
    }

    pub fn inline(field: &str, labels: &[&str], value_kind: ValueKind) -> Self {
        Self {
            field: field.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            location: AnchorLocation::Inline,
            value_kind,
            append: false,
        }
    }

    pub fn appending(mut self) -> Self {
        self.append = true;
        self
    }
}

/// Vendor-domain numeric defaults. The original per-vendor parsers buried
/// these inline; here they are named profile data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineDefaults {
    /// Tax rate assumed when a line declares none (percent).
    pub tax_rate: Decimal,
    /// Margin assumed when a line declares none (percent).
    pub margin_percent: Decimal,
}

impl Default for LineDefaults {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::ZERO,
            margin_percent: Decimal::ZERO,
        }
    }
}

/// Configuration for the text-pattern fallback extractor (PDF input).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackProfile {
    /// Regex for an identifier-shaped item-code token.
    pub code_pattern: String,

    /// Ordered full-row regexes tried against the joined document text.
    pub row_patterns: Vec<String>,

    /// Minimum numeric tokens beside the code for the line-by-line strategy.
    pub min_numeric_tokens: usize,

    /// Inclusive bounds for a plausible quantity token.
    pub quantity_min: u32,
    pub quantity_max: u32,

    /// Amounts below this are never picked as a line total.
    pub amount_floor: Decimal,

    /// Hard cap on regex matches, bounding pathological backtracking.
    pub max_matches: usize,
}

impl Default for FallbackProfile {
    fn default() -> Self {
        Self {
            code_pattern: r"\b\d{6,9}\b".to_string(),
            row_patterns: Vec::new(),
            min_numeric_tokens: 5,
            quantity_min: 1,
            quantity_max: 999,
            amount_floor: Decimal::new(50, 0),
            max_matches: 20,
        }
    }
}

/// Declarative bundle describing one retail platform's PO layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorProfile {
    pub name: String,

    /// Bounded number of leading rows scanned for header fields and the
    /// line-item table start.
    pub scan_window_rows: usize,

    /// CNF keyword groups identifying the line-item header row: the row must
    /// hit at least one keyword in every group.
    pub mandatory_header_keywords: Vec<Vec<String>>,

    /// Broad vocabulary for the generic-score fallback pass.
    pub generic_keyword_vocabulary: Vec<String>,

    /// Minimum generic score to accept a header row in the fallback pass.
    pub min_generic_score: usize,

    /// Canonical line-item field → acceptable column header texts.
    pub column_synonyms: Vec<ColumnRule>,

    /// Labeled header fields to scan for.
    pub header_anchors: Vec<AnchorRule>,

    /// First-cell keywords marking a summary/total row.
    pub summary_keywords: Vec<String>,

    /// Stop row scanning at the first summary row instead of skipping it.
    pub stop_at_summary: bool,

    /// Column expected to hold a numeric serial; non-numeric values there
    /// mark a non-data row.
    pub serial_column: Option<usize>,

    /// chrono format strings tried by the date normalizer before generic
    /// parsing.
    pub date_format_hints: Vec<String>,

    pub defaults: LineDefaults,

    pub fallback: FallbackProfile,
}

impl Default for VendorProfile {
    fn default() -> Self {
        Self {
            name: "generic".to_string(),
            scan_window_rows: 50,
            mandatory_header_keywords: Vec::new(),
            generic_keyword_vocabulary: generic_vocabulary(),
            min_generic_score: 4,
            column_synonyms: generic_synonyms(),
            header_anchors: Vec::new(),
            summary_keywords: vec![
                "total".to_string(),
                "grand".to_string(),
                "subtotal".to_string(),
            ],
            stop_at_summary: false,
            serial_column: None,
            date_format_hints: vec![
                "%d/%m/%Y".to_string(),
                "%d-%m-%Y".to_string(),
                "%Y-%m-%d".to_string(),
                "%d/%b/%Y".to_string(),
                "%d-%b-%Y".to_string(),
            ],
            defaults: LineDefaults::default(),
            fallback: FallbackProfile::default(),
        }
    }
}

fn generic_vocabulary() -> Vec<String> {
    [
        "asin", "sku", "product", "item", "description", "quantity", "price", "amount", "unit",
        "total", "line", "part", "catalog", "model", "external", "hsn", "mrp",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn generic_synonyms() -> Vec<ColumnRule> {
    vec![
        ColumnRule::new(
            super::record::fields::ITEM_CODE,
            vec![Variant::exact("item code"), Variant::substring("item code")],
        ),
        ColumnRule::new(
            super::record::fields::SKU,
            vec![Variant::exact("sku"), Variant::substring("sku code")],
        ),
        ColumnRule::new(super::record::fields::ASIN, vec![Variant::exact("asin")]),
        ColumnRule::new(
            super::record::fields::HSN_CODE,
            vec![Variant::substring("hsn")],
        ),
        ColumnRule::new(
            super::record::fields::UPC,
            vec![Variant::substring("upc"), Variant::substring("ean")],
        ),
        ColumnRule::new(
            super::record::fields::DESCRIPTION,
            vec![
                Variant::exact("description"),
                Variant::exact("title"),
                Variant::substring("product name"),
                Variant::substring("item name"),
            ],
        ),
        ColumnRule::new(
            super::record::fields::QUANTITY,
            vec![Variant::exact("qty"), Variant::substring("quantity")],
        ),
        ColumnRule::new(
            super::record::fields::UNIT_COST,
            vec![
                Variant::substring("unit cost"),
                Variant::substring("unit price"),
                Variant::substring("basic cost"),
            ],
        ),
        ColumnRule::new(
            super::record::fields::TAX_RATE,
            vec![Variant::substring("tax %"), Variant::substring("igst")],
        ),
        ColumnRule::new(
            super::record::fields::TAX_AMOUNT,
            vec![Variant::exact("tax amount")],
        ),
        ColumnRule::new(super::record::fields::MRP, vec![Variant::exact("mrp")]),
        ColumnRule::new(
            super::record::fields::LINE_TOTAL,
            vec![
                Variant::exact("total"),
                Variant::exact("amount"),
                Variant::substring("total amount"),
                Variant::substring("line total"),
                Variant::substring("total cost"),
                Variant::substring("total value"),
            ],
        ),
    ]
}

impl VendorProfile {
    /// Profile for the given built-in vendor name, if one exists.
    pub fn builtin(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "generic" => Some(Self::generic()),
            "amazon" => Some(Self::amazon()),
            "citymall" => Some(Self::citymall()),
            "blinkit" => Some(Self::blinkit()),
            "bigbasket" => Some(Self::bigbasket()),
            "flipkart" => Some(Self::flipkart()),
            _ => None,
        }
    }

    pub fn builtin_names() -> &'static [&'static str] {
        &["generic", "amazon", "citymall", "blinkit", "bigbasket", "flipkart"]
    }

    /// Load a profile from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ExtractError::Profile(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content).map_err(|e| ExtractError::Profile(e.to_string()))
    }

    /// Save a profile to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ExtractError::Profile(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| ExtractError::Profile(format!("{}: {}", path.display(), e)))
    }

    /// Schema-agnostic profile relying on the generic keyword score.
    pub fn generic() -> Self {
        Self::default()
    }

    /// Amazon retail POs: labels in column A with values in column D, items
    /// headed by an ASIN column.
    pub fn amazon() -> Self {
        use super::record::fields as f;

        let mut synonyms = generic_synonyms();
        synonyms.insert(
            0,
            ColumnRule::new(f::SKU, vec![Variant::exact("external id")]),
        );
        synonyms.push(ColumnRule::new(
            f::DESCRIPTION,
            vec![Variant::exact("title")],
        ));
        synonyms.push(ColumnRule::new(
            f::QUANTITY,
            vec![Variant::substring("quantity requested")],
        ));

        Self {
            name: "amazon".to_string(),
            mandatory_header_keywords: vec![vec!["asin".to_string()]],
            column_synonyms: synonyms,
            header_anchors: vec![
                AnchorRule::inline(f::PO_NUMBER, &["po"], ValueKind::Text),
                AnchorRule::column(f::VENDOR_CODE, &["vendor"], 3, ValueKind::Text),
                AnchorRule::column(
                    f::SHIP_TO_LOCATION,
                    &["ship to location"],
                    3,
                    ValueKind::Text,
                ),
                AnchorRule::inline(f::SHIP_TO_ADDRESS, &["delivery address"], ValueKind::Text),
                AnchorRule::column(f::PO_DATE, &["ordered on"], 3, ValueKind::Date),
                AnchorRule::column(f::DELIVERY_DATE, &["ship window"], 3, ValueKind::Date),
                AnchorRule::column(f::BUYER_NAME, &["purchasing entity"], 3, ValueKind::Text),
                AnchorRule::column(f::STATUS, &["status"], 3, ValueKind::Text),
                AnchorRule::column(
                    f::NOTES,
                    &["payment terms", "freight terms", "payment method"],
                    3,
                    ValueKind::Text,
                )
                .appending(),
            ],
            ..Self::default()
        }
    }

    /// CityMall POs: buyer block up top (values in column C), vendor block
    /// below (values in column E), serial-numbered item table.
    pub fn citymall() -> Self {
        use super::record::fields as f;

        let mut synonyms = generic_synonyms();
        synonyms.insert(
            0,
            ColumnRule::new(
                f::ARTICLE_ID,
                vec![Variant::exact("article id"), Variant::substring("article id")],
            ),
        );
        synonyms.push(ColumnRule::new(
            f::DESCRIPTION,
            vec![Variant::substring("article name")],
        ));

        Self {
            name: "citymall".to_string(),
            mandatory_header_keywords: vec![
                vec![
                    "s.no".to_string(),
                    "sr no".to_string(),
                    "s no".to_string(),
                    "serial".to_string(),
                ],
                vec![
                    "article".to_string(),
                    "product".to_string(),
                    "item".to_string(),
                ],
            ],
            header_anchors: vec![
                // Buyer block rows come first in the sheet; the second "gst"
                // occurrence belongs to the vendor block (ordinal rule).
                AnchorRule::column(f::BUYER_NAME, &["name"], 2, ValueKind::Text),
                AnchorRule::column(f::BUYER_GSTIN, &["gst"], 2, ValueKind::Text),
                AnchorRule::column(f::SHIP_TO_ADDRESS, &["billing address"], 2, ValueKind::Text),
                AnchorRule::column(f::VENDOR_NAME, &["issued to"], 4, ValueKind::Text),
                AnchorRule::column(f::VENDOR_CODE, &["vendor code"], 4, ValueKind::Text),
                AnchorRule::column(f::VENDOR_GSTIN, &["gst"], 4, ValueKind::Text),
                AnchorRule::inline(f::PO_NUMBER, &["po number", "po#", "po"], ValueKind::Text),
                AnchorRule::inline(
                    f::PO_DATE,
                    &["purchase order date", "po date"],
                    ValueKind::Date,
                ),
                AnchorRule::inline(
                    f::EXPIRY_DATE,
                    &["expiry date", "valid until"],
                    ValueKind::Date,
                ),
            ],
            column_synonyms: synonyms,
            serial_column: Some(0),
            ..Self::default()
        }
    }

    /// Blinkit POs arrive as PDFs; the grid rules cover the converted form and
    /// the fallback profile drives text extraction.
    pub fn blinkit() -> Self {
        use super::record::fields as f;

        Self {
            name: "blinkit".to_string(),
            mandatory_header_keywords: vec![
                vec!["item code".to_string(), "hsn".to_string()],
                vec![
                    "basic cost".to_string(),
                    "mrp".to_string(),
                    "margin".to_string(),
                ],
            ],
            header_anchors: vec![
                AnchorRule::inline(
                    f::PO_NUMBER,
                    &["p.o. number", "po number", "purchase order"],
                    ValueKind::Text,
                ),
                AnchorRule::inline(f::PO_DATE, &["date"], ValueKind::Date),
                AnchorRule::inline(f::EXPIRY_DATE, &["expiry date"], ValueKind::Date),
                AnchorRule::inline(f::DELIVERY_DATE, &["delivery date"], ValueKind::Date),
                AnchorRule::inline(f::VENDOR_CODE, &["vendor no"], ValueKind::Text),
                AnchorRule::inline(f::CURRENCY, &["currency"], ValueKind::Text),
                AnchorRule::inline(f::NOTES, &["payment terms"], ValueKind::Text).appending(),
            ],
            defaults: LineDefaults {
                tax_rate: Decimal::new(5, 0),
                margin_percent: Decimal::new(60, 0),
            },
            fallback: FallbackProfile {
                code_pattern: r"\b10\d{6,7}\b".to_string(),
                row_patterns: vec![
                    // line# itemCode HSN UPC description ...numbers
                    r"(\d+)\s+(10\d{6,7})\s+(\d{8})\s+(\d{10,15})\s+([A-Za-z][^0-9]+?)\s+((?:\d+\.?\d*\s*){10,})"
                        .to_string(),
                    // itemCode HSN UPC description ...numbers
                    r"(10\d{6,7})\s+(\d{8})\s+(\d{10,15})\s+([A-Za-z][^0-9]+?)\s+((?:\d+\.?\d*\s*){8,})"
                        .to_string(),
                ],
                ..FallbackProfile::default()
            },
            ..Self::default()
        }
    }

    /// BigBasket POs: serial + HSN headed table, GSTIN in the supplier block.
    pub fn bigbasket() -> Self {
        use super::record::fields as f;

        let mut synonyms = generic_synonyms();
        synonyms.push(ColumnRule::new(
            f::SKU,
            vec![Variant::substring("sku code")],
        ));
        synonyms.push(ColumnRule::new(
            f::UPC,
            vec![Variant::substring("ean/upc"), Variant::substring("ean")],
        ));

        Self {
            name: "bigbasket".to_string(),
            mandatory_header_keywords: vec![
                vec!["s.no".to_string(), "s no".to_string()],
                vec!["hsn".to_string()],
            ],
            header_anchors: vec![
                AnchorRule::inline(f::PO_NUMBER, &["po number"], ValueKind::Text),
                AnchorRule::inline(f::PO_DATE, &["po date"], ValueKind::Date),
                AnchorRule::inline(f::EXPIRY_DATE, &["po expiry date"], ValueKind::Date),
                AnchorRule::inline(f::VENDOR_GSTIN, &["gstin no"], ValueKind::Text),
            ],
            column_synonyms: synonyms,
            serial_column: Some(0),
            ..Self::default()
        }
    }

    /// Flipkart grid layouts: FSN identifier plus a first-row header table.
    pub fn flipkart() -> Self {
        use super::record::fields as f;

        let mut synonyms = generic_synonyms();
        synonyms.insert(0, ColumnRule::new(f::SKU, vec![Variant::exact("fsn")]));
        synonyms.push(ColumnRule::new(
            f::DESCRIPTION,
            vec![Variant::substring("product title")],
        ));

        Self {
            name: "flipkart".to_string(),
            mandatory_header_keywords: vec![vec!["fsn".to_string()]],
            header_anchors: vec![
                AnchorRule::inline(f::PO_NUMBER, &["po number", "po"], ValueKind::Text),
                AnchorRule::inline(f::PO_DATE, &["po date", "order date"], ValueKind::Date),
            ],
            column_synonyms: synonyms,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_lookup() {
        assert!(VendorProfile::builtin("amazon").is_some());
        assert!(VendorProfile::builtin("AMAZON").is_some());
        assert!(VendorProfile::builtin("nosuch").is_none());

        for name in VendorProfile::builtin_names() {
            assert!(VendorProfile::builtin(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_profile_json_round_trip() {
        let profile = VendorProfile::blinkit();
        let json = serde_json::to_string(&profile).unwrap();
        let back: VendorProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(profile, back);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let profile: VendorProfile =
            serde_json::from_str(r#"{"name": "acme", "min_generic_score": 3}"#).unwrap();
        assert_eq!(profile.name, "acme");
        assert_eq!(profile.min_generic_score, 3);
        assert_eq!(profile.scan_window_rows, 50);
        assert!(!profile.column_synonyms.is_empty());
    }

    #[test]
    fn test_defaults_are_named_not_inline() {
        let blinkit = VendorProfile::blinkit();
        assert_eq!(blinkit.defaults.tax_rate, Decimal::new(5, 0));
        assert_eq!(blinkit.defaults.margin_percent, Decimal::new(60, 0));
    }
}
