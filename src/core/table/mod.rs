//! Table Grid System
//!
//! Parses HTML table fragments into an addressable logical grid, edits the
//! grid, and serializes it back into minimal HTML.
//!
//! This module handles:
//! - Repair of doubled `<table>` openings and missing closing tags
//! - Row and column spans, with coverage tracking across rows
//! - Ragged rows and omitted end tags
//! - Tables nested inside cells (kept as cell markup)
//!
//! # Architecture
//!
//! ```text
//! Raw HTML -> Repair -> Tag Scanner -> Grid Builder -> Grid -> Ops -> Serializer -> HTML
//! ```
//!
//! # Example
//!
//! ```
//! use tablemend::core::table::{parse_table, serialize_table};
//!
//! let mut grid = parse_table("<table><tr><td>a</td><td>b</td></tr></table>").unwrap();
//! grid.merge_cells(&[(0, 0), (0, 1)]).unwrap();
//! assert_eq!(
//!     serialize_table(&grid),
//!     "<table border=\"1\"><tr><td colspan=\"2\">a b</td></tr></table>"
//! );
//! ```

mod cell;
mod grid;
mod ops;
mod parser;
mod repair;
mod serializer;


// Re-export public API
pub use cell::{Cell, CellId};
pub use grid::{Grid, Slot};
pub use ops::{ColumnPosition, RowPosition};
pub use parser::{
    parse_span, parse_table, parse_table_with_report, scan_rows, GridBuilder, RawCell,
    MAX_COLSPAN, MAX_ROWSPAN,
};
pub use repair::{repair_table_html, RepairReport};
pub use serializer::{serialize_table, serialize_table_with_options, total_columns, HtmlOptions};
