//! Input types for the extraction engine.
//!
//! Decoding bytes into cells is the job of external collaborators (XLSX/CSV
//! readers, PDF text extractors). The engine only ever sees a [`RawGrid`] or
//! a [`TextLines`] sequence.

use serde::{Deserialize, Serialize};

/// A single scalar cell value from a decoded spreadsheet or CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing or blank cell.
    Empty,
    /// Numeric cell. Spreadsheet decoders report dates as numbers too
    /// (serial values), which the date normalizer handles downstream.
    Number(f64),
    /// Any other value, trimmed.
    Text(String),
}

impl Cell {
    /// Build a cell from decoder-provided text, trimming and mapping blank
    /// strings to [`Cell::Empty`].
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Cell content as display text. Numbers are rendered the way spreadsheet
    /// decoders render them; empties become "".
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Cell::Text(s) => s.clone(),
        }
    }

    /// Numeric view of the cell, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            Cell::Empty => None,
        }
    }

    /// Lowercased, whitespace-normalized text used for keyword matching.
    pub fn normalized(&self) -> String {
        self.as_text().to_lowercase().trim().to_string()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Empty
    }
}

/// A uniform rectangular grid of scalar cells.
///
/// Source of truth for spreadsheet/CSV input. Produced once by
/// [`RawGrid::normalize`] and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGrid {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl RawGrid {
    /// Normalize a decoder-provided 2D array into a rectangular grid.
    ///
    /// Short rows are padded with trailing empties; text cells are trimmed.
    /// This operation always succeeds: garbage in becomes empty cells.
    pub fn normalize(raw: Vec<Vec<Cell>>) -> Self {
        let width = raw.iter().map(Vec::len).max().unwrap_or(0);
        let rows = raw
            .into_iter()
            .map(|mut row| {
                for cell in &mut row {
                    if let Cell::Text(s) = cell {
                        let trimmed = s.trim();
                        if trimmed.is_empty() {
                            *cell = Cell::Empty;
                        } else if trimmed.len() != s.len() {
                            *cell = Cell::Text(trimmed.to_string());
                        }
                    }
                }
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        Self { rows, width }
    }

    /// Convenience constructor from plain strings, mostly for tests and CSV
    /// input where every cell arrives as text.
    pub fn from_strings(raw: Vec<Vec<&str>>) -> Self {
        Self::normalize(
            raw.into_iter()
                .map(|row| row.iter().map(|s| Cell::from_text(s)).collect())
                .collect(),
        )
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Cell at (row, col); out-of-range reads are empty, never a panic.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY)
    }
}

/// Ordered text lines from PDF-derived input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLines(Vec<String>);

impl TextLines {
    pub fn new(lines: Vec<String>) -> Self {
        Self(lines)
    }

    /// Split raw extracted text into trimmed lines, dropping blanks.
    pub fn from_text(text: &str) -> Self {
        Self(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// All lines joined with single spaces, for whole-text regex strategies.
    pub fn joined(&self) -> String {
        self.0.join(" ")
    }
}

/// Input handed to the engine by the decoding collaborator.
#[derive(Debug, Clone)]
pub enum DocumentInput {
    /// Decoded spreadsheet or CSV.
    Grid(RawGrid),
    /// PDF-derived text, one entry per visually-extracted line.
    Text(TextLines),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_pads_short_rows() {
        let grid = RawGrid::normalize(vec![
            vec![Cell::from_text("a"), Cell::from_text("b"), Cell::from_text("c")],
            vec![Cell::from_text("d")],
        ]);

        assert_eq!(grid.width(), 3);
        assert_eq!(grid.cell(1, 0), &Cell::Text("d".to_string()));
        assert_eq!(grid.cell(1, 2), &Cell::Empty);
    }

    #[test]
    fn test_normalize_trims_text_and_blanks() {
        let grid = RawGrid::normalize(vec![vec![
            Cell::Text("  padded  ".to_string()),
            Cell::Text("   ".to_string()),
        ]]);

        assert_eq!(grid.cell(0, 0), &Cell::Text("padded".to_string()));
        assert!(grid.cell(0, 1).is_empty());
    }

    #[test]
    fn test_numbers_stay_numeric() {
        let grid = RawGrid::normalize(vec![vec![Cell::Number(45123.0)]]);
        assert_eq!(grid.cell(0, 0).as_number(), Some(45123.0));
        assert_eq!(grid.cell(0, 0).as_text(), "45123");
    }

    #[test]
    fn test_out_of_range_cell_is_empty() {
        let grid = RawGrid::from_strings(vec![vec!["x"]]);
        assert!(grid.cell(10, 10).is_empty());
    }

    #[test]
    fn test_text_lines_from_text() {
        let lines = TextLines::from_text("first\n\n  second  \n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.iter().next(), Some("first"));
    }
}
