//! Error types for the porder-core library.

use thiserror::Error;

/// Main error type for purchase-order extraction.
///
/// Only structural failures surface here. Scalar-level problems (bad dates,
/// bad numbers, unreadable cells) degrade to defaults and are recorded as
/// diagnostics on the result instead.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The input buffer decoded to nothing usable. Raised before any scanning.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Header fields or the line-item table could not be located within the
    /// scan window. Carries the stage that failed to aid profile debugging.
    #[error("structure not found during {stage} (scanned {scanned} rows)")]
    StructureNotFound { stage: &'static str, scanned: usize },

    /// A line-item table was located but zero rows survived validation.
    /// Distinct from `StructureNotFound`: this points at a column-mapping or
    /// threshold problem in the profile, not a missing table.
    #[error("no valid line items found")]
    NoValidLineItems,

    /// Vendor profile could not be loaded or is inconsistent.
    #[error("profile error: {0}")]
    Profile(String),
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
