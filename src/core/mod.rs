//! Core editing modules
//!
//! This module contains the table editing engine:
//! - `table`: HTML table parsing, grid operations and serialization
//! - `history`: linear snapshot undo
//! - `editor`: the controller tying grid, history and storage together

pub mod editor;
pub mod history;
pub mod table;

// Re-export main types from table
pub use table::{
    parse_table, serialize_table, Cell, CellId, ColumnPosition, Grid, HtmlOptions, RowPosition,
};

// Re-export main types from editor
pub use editor::{
    Annotation, EditCommand, EditOutcome, EditorOptions, LoadState, SaveStatus, TableEditor,
};
pub use history::History;
