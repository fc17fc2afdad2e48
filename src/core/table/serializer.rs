//! HTML table serializer
//!
//! Emits one `<tr>` per grid row and one `<th>`/`<td>` per cell origin, in
//! column order. Positions no cell occupies are written as empty `<td>`
//! cells where they sit, so the output is rectangular even when edits left
//! ragged rows and every cell keeps its column on re-parse. Cell markup is
//! emitted verbatim.

use serde::Deserialize;
use std::fmt::Write;

use super::cell::Cell;
use super::grid::{Grid, Slot};

/// Serializer output options
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HtmlOptions {
    /// Value of the `border` attribute on `<table>`, omitted when `None`
    pub border: Option<String>,
    /// Put every row on its own line
    pub pretty: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            border: Some("1".to_string()),
            pretty: false,
        }
    }
}

impl HtmlOptions {
    /// Line-per-row output for human inspection
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Default::default()
        }
    }
}

/// Total column count of the serialized table
///
/// Every row is written out to the furthest column any cell reaches, so a
/// hole inside a row still counts toward the width.
pub fn total_columns(grid: &Grid) -> usize {
    grid.width()
}

/// Serialize a grid with default options
pub fn serialize_table(grid: &Grid) -> String {
    serialize_table_with_options(grid, &HtmlOptions::default())
}

/// Serialize a grid into an HTML table fragment
pub fn serialize_table_with_options(grid: &Grid, options: &HtmlOptions) -> String {
    let total = total_columns(grid);
    let newline = if options.pretty { "\n" } else { "" };
    let mut output = String::new();

    match &options.border {
        Some(border) => {
            let _ = write!(output, "<table border=\"{}\">{}", border, newline);
        }
        None => {
            let _ = write!(output, "<table>{}", newline);
        }
    }

    let cells = grid.cells();
    for slots in grid.occupancy() {
        output.push_str("<tr>");

        for slot in slots {
            match slot {
                Slot::Origin(idx) => write_cell(&mut output, &cells[idx]),
                Slot::Covered(_) => {}
                // Row completion, also in the middle of a row
                Slot::Hole => output.push_str("<td></td>"),
            }
        }

        output.push_str("</tr>");
        output.push_str(newline);
    }

    output.push_str("</table>");

    tracing::debug!(rows = grid.height(), cols = total, "serialized table");
    output
}

fn write_cell(output: &mut String, cell: &Cell) {
    let tag = cell.tag();
    output.push('<');
    output.push_str(tag);
    if cell.row_span > 1 {
        let _ = write!(output, " rowspan=\"{}\"", cell.row_span);
    }
    if cell.col_span > 1 {
        let _ = write!(output, " colspan=\"{}\"", cell.col_span);
    }
    output.push('>');
    output.push_str(&cell.text);
    let _ = write!(output, "</{}>", tag);
}
