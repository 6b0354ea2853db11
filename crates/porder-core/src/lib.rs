//! Core library for heterogeneous purchase-order extraction.
//!
//! This crate provides:
//! - Input normalization (spreadsheet/CSV grids, PDF-derived text lines)
//! - Declarative vendor profiles (scan windows, keyword sets, synonyms)
//! - The extraction pipeline: header scan, table location, column mapping,
//!   row extraction, text-pattern fallback, aggregation
//! - Canonical purchase-order records with recomputed totals

pub mod error;
pub mod extract;
pub mod grid;
pub mod models;
pub mod rules;

pub use error::{ExtractError, Result};
pub use extract::{ColumnMapping, Extractor, FallbackOutcome, Strategy};
pub use grid::{Cell, DocumentInput, RawGrid, TextLines};
pub use models::{
    fields, Diagnostic, ExtractionResult, FieldValue, HeaderFieldSet, LineItem, Severity,
    VendorProfile,
};
