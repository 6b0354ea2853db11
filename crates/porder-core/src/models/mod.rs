//! Data models: canonical records and vendor profiles.

pub mod profile;
pub mod record;

pub use profile::{
    AnchorLocation, AnchorRule, ColumnRule, FallbackProfile, LineDefaults, MatchKind, Variant,
    VendorProfile,
};
pub use record::{
    fields, Diagnostic, ExtractionResult, FieldValue, HeaderFieldSet, LineItem, Severity,
};
