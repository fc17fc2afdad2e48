//! # tablemend
//!
//! Correction engine for machine-extracted HTML tables.
//!
//! ## Features
//!
//! - **Tolerant Parsing**: repairs doubled `<table>` openings and unbalanced closings,
//!   accepts ragged rows and omitted end tags
//! - **Span-Aware Grid**: rowspan/colspan coverage tracked on a logical grid
//! - **Structural Edits**: insert/delete rows and columns, merge and split cells
//! - **Linear Undo**: full snapshots after every committed edit
//! - **Minimal Output**: rectangular, balanced HTML that round-trips through further edits
//! - **Correction Trail**: per-cell annotations persisted next to each image
//!
//! ## Usage Examples
//!
//! ### Normalizing a Table
//!
//! ```rust
//! use tablemend::normalize_table_html;
//!
//! let html = normalize_table_html("<table><table border=\"1\"><tr><td>a<td>b").unwrap();
//! assert_eq!(html, "<table border=\"1\"><tr><td>a</td><td>b</td></tr></table>");
//! ```
//!
//! ### Editing a Grid
//!
//! ```rust
//! use tablemend::{parse_table, serialize_table, RowPosition};
//!
//! let mut grid = parse_table("<table><tr><td>1</td><td>2</td></tr></table>").unwrap();
//! grid.insert_row(0, RowPosition::Below).unwrap();
//! grid.edit_cell(1, 0, "3").unwrap();
//! assert_eq!(
//!     serialize_table(&grid),
//!     "<table border=\"1\"><tr><td>1</td><td>2</td></tr><tr><td>3</td><td></td></tr></table>"
//! );
//! ```

/// Core editing modules
pub mod core;

/// Utility modules
pub mod utils;

// Re-export the table core
pub use core::history::History;
pub use core::table::{
    parse_table, parse_table_with_report, repair_table_html, serialize_table,
    serialize_table_with_options, Cell, CellId, ColumnPosition, Grid, HtmlOptions, RepairReport,
    RowPosition, Slot,
};

// Re-export the editor
pub use core::editor::{
    Annotation, AnnotationExport, AnnotationFile, EditCommand, EditOutcome, EditorOptions,
    LoadState, SaveStatus, TableEditor,
};

// Re-export utilities
pub use utils::catalog::{CatalogStatus, FileCatalog, FileEntry, FilePage};
pub use utils::error::{EditorError, EditorResult, StoreError};
pub use utils::store::{AnnotationStore, Artifact, DirStore, MemoryStore, Revision};

/// Summary of a parsed table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub rows: usize,
    pub columns: usize,
    pub cells: usize,
    /// Cells with a row or column span above one
    pub spanning: usize,
    pub header_cells: usize,
    /// Grid positions no cell occupies
    pub holes: usize,
    pub repairs: RepairReport,
}

/// Repair, parse and re-serialize a table fragment
pub fn normalize_table_html(input: &str) -> EditorResult<String> {
    normalize_table_html_with_options(input, &HtmlOptions::default())
}

/// Repair, parse and re-serialize a table fragment with custom output options
pub fn normalize_table_html_with_options(
    input: &str,
    options: &HtmlOptions,
) -> EditorResult<String> {
    let mut grid = parse_table(input)?;
    grid.fill_holes();
    Ok(serialize_table_with_options(&grid, options))
}

/// Parse a table fragment and summarize its shape
pub fn inspect_table(input: &str) -> EditorResult<TableReport> {
    let (grid, repairs) = parse_table_with_report(input)?;
    Ok(TableReport {
        rows: grid.height(),
        columns: grid.width(),
        cells: grid.cell_count(),
        spanning: grid.cells().iter().filter(|c| c.is_spanning()).count(),
        header_cells: grid.cells().iter().filter(|c| c.is_header).count(),
        holes: grid.holes().len(),
        repairs,
    })
}
