//! Line-item table locator and column synonym mapper.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::grid::{Cell, RawGrid};
use crate::models::profile::{MatchKind, VendorProfile};

pub const STAGE: &str = "table_scan";

/// Which pass accepted the header row, kept for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatePass {
    /// The row satisfied the profile's mandatory keyword combination.
    Mandatory,
    /// The row met the generic-score threshold (score recorded).
    Generic(usize),
}

/// Located line-item table header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLocation {
    /// Row index of the column-header row.
    pub row: usize,
    pub pass: LocatePass,
}

fn row_has_keyword(row: &[Cell], keyword: &str) -> bool {
    row.iter()
        .any(|cell| !cell.is_empty() && cell.normalized().contains(keyword))
}

/// A row satisfies the mandatory combination when every keyword group has at
/// least one hit.
fn satisfies_mandatory(row: &[Cell], groups: &[Vec<String>]) -> bool {
    !groups.is_empty()
        && groups
            .iter()
            .all(|group| group.iter().any(|kw| row_has_keyword(row, kw)))
}

fn generic_score(row: &[Cell], vocabulary: &[String]) -> usize {
    vocabulary
        .iter()
        .filter(|kw| row_has_keyword(row, kw))
        .count()
}

/// Find the row carrying the line-item table's column headers.
///
/// Two passes over the scan window, in order:
/// 1. mandatory keyword combination — immune to promotional/legal rows that
///    happen to contain a few generic keywords;
/// 2. generic keyword score against the broad vocabulary, for layouts that
///    lack the mandatory set.
///
/// The second pass only runs when the first finds nothing anywhere in the
/// window, so a high-scoring early row can never pre-empt a later row that
/// satisfies the mandatory combination.
pub fn locate_item_table(grid: &RawGrid, profile: &VendorProfile) -> Result<TableLocation> {
    let window = grid.row_count().min(profile.scan_window_rows);

    for row_idx in 0..window {
        let Some(row) = grid.row(row_idx) else { break };
        if satisfies_mandatory(row, &profile.mandatory_header_keywords) {
            debug!(row = row_idx, "item table header via mandatory combination");
            return Ok(TableLocation {
                row: row_idx,
                pass: LocatePass::Mandatory,
            });
        }
    }

    for row_idx in 0..window {
        let Some(row) = grid.row(row_idx) else { break };
        let score = generic_score(row, &profile.generic_keyword_vocabulary);
        if score >= profile.min_generic_score {
            debug!(row = row_idx, score, "item table header via generic score");
            return Ok(TableLocation {
                row: row_idx,
                pass: LocatePass::Generic(score),
            });
        }
    }

    Err(ExtractError::StructureNotFound {
        stage: STAGE,
        scanned: window,
    })
}

/// Mapping canonical line-item field name → column index. Built once from the
/// located header row, read-only during row extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnMapping(BTreeMap<String, usize>);

impl ColumnMapping {
    pub fn get(&self, field: &str) -> Option<usize> {
        self.0.get(field).copied()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, usize)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }
}

/// Map header-row cells to canonical fields through the profile's synonym
/// table.
///
/// Precedence: an exact variant beats a substring variant for the same field,
/// so a generic substring like `"tax"` cannot pre-empt a more specific exact
/// header. Within a tier the leftmost matching column wins. Fields with no
/// matching column stay unmapped; row extraction treats them as absent.
pub fn map_columns(header_row: &[Cell], profile: &VendorProfile) -> ColumnMapping {
    let normalized: Vec<String> = header_row.iter().map(Cell::normalized).collect();

    // Profiles may carry several rules for one field (vendor additions on
    // top of the generic table); merge their variants in declaration order.
    let mut merged: Vec<(&str, Vec<&crate::models::profile::Variant>)> = Vec::new();
    for rule in &profile.column_synonyms {
        if let Some(entry) = merged.iter_mut().find(|(f, _)| *f == rule.field.as_str()) {
            entry.1.extend(rule.variants.iter());
        } else {
            merged.push((rule.field.as_str(), rule.variants.iter().collect()));
        }
    }

    let mut mapping = BTreeMap::new();
    for (field, variants) in merged {
        let exact = variants
            .iter()
            .filter(|v| v.match_kind == MatchKind::Exact)
            .collect::<Vec<_>>();
        let substring = variants
            .iter()
            .filter(|v| v.match_kind == MatchKind::Substring)
            .collect::<Vec<_>>();

        let col = normalized
            .iter()
            .position(|cell| !cell.is_empty() && exact.iter().any(|v| cell == &v.text.to_lowercase()))
            .or_else(|| {
                normalized.iter().position(|cell| {
                    !cell.is_empty()
                        && substring.iter().any(|v| cell.contains(&v.text.to_lowercase()))
                })
            });

        if let Some(col) = col {
            mapping.insert(field.to_string(), col);
        }
    }

    debug!(mapped = mapping.len(), "column mapping built");
    ColumnMapping(mapping)
}
