//! Cell types for the logical table grid

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a parsed cell: its origin at parse time.
///
/// Structural operations move cells around the grid, but the id keeps
/// pointing at the position the cell had in the loaded table, so corrections
/// can be traced back to the extraction that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId {
    pub row: usize,
    pub col: usize,
}

impl CellId {
    pub fn new(row: usize, col: usize) -> Self {
        CellId { row, col }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}c{}", self.row, self.col)
    }
}

/// Represents a single table cell with span and origin info
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Inner markup of the cell (inline formatting preserved)
    pub text: String,
    /// Whether this cell was a `<th>` in the source markup
    pub is_header: bool,
    /// Number of rows this cell spans
    pub row_span: usize,
    /// Number of columns this cell spans
    pub col_span: usize,
    /// Top-left grid row this cell occupies
    pub origin_row: usize,
    /// Top-left grid column this cell occupies
    pub origin_col: usize,
    /// Parse-time identity; `None` for cells created by editing
    pub id: Option<CellId>,
}

impl Cell {
    /// Create a 1x1 data cell at the given origin
    pub fn new(text: impl Into<String>, origin_row: usize, origin_col: usize) -> Self {
        Cell {
            text: text.into(),
            is_header: false,
            row_span: 1,
            col_span: 1,
            origin_row,
            origin_col,
            id: None,
        }
    }

    /// Create an empty 1x1 data cell
    pub fn empty(origin_row: usize, origin_col: usize) -> Self {
        Cell::new(String::new(), origin_row, origin_col)
    }

    pub fn header(mut self, is_header: bool) -> Self {
        self.is_header = is_header;
        self
    }

    pub fn with_spans(mut self, row_span: usize, col_span: usize) -> Self {
        self.row_span = row_span.max(1);
        self.col_span = col_span.max(1);
        self
    }

    pub fn with_id(mut self, id: CellId) -> Self {
        self.id = Some(id);
        self
    }

    /// One past the last row this cell occupies
    pub fn end_row(&self) -> usize {
        self.origin_row + self.row_span
    }

    /// One past the last column this cell occupies
    pub fn end_col(&self) -> usize {
        self.origin_col + self.col_span
    }

    /// Whether the occupied rectangle contains `(row, col)`
    pub fn covers(&self, row: usize, col: usize) -> bool {
        row >= self.origin_row && row < self.end_row() && col >= self.origin_col && col < self.end_col()
    }

    pub fn is_spanning(&self) -> bool {
        self.row_span > 1 || self.col_span > 1
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Tag name used when serializing this cell
    pub fn tag(&self) -> &'static str {
        if self.is_header {
            "th"
        } else {
            "td"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covers_spanned_rectangle() {
        let cell = Cell::new("x", 1, 2).with_spans(2, 3);
        assert!(cell.covers(1, 2));
        assert!(cell.covers(2, 4));
        assert!(!cell.covers(3, 2));
        assert!(!cell.covers(1, 5));
        assert!(!cell.covers(0, 2));
    }

    #[test]
    fn test_spans_never_zero() {
        let cell = Cell::empty(0, 0).with_spans(0, 0);
        assert_eq!((cell.row_span, cell.col_span), (1, 1));
        assert!(!cell.is_spanning());
    }

    #[test]
    fn test_cell_id_display() {
        assert_eq!(CellId::new(3, 4).to_string(), "r3c4");
    }
}
