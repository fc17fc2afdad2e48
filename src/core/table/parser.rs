//! State-aware HTML table parser
//!
//! Parsing happens in two passes: a tag scanner cuts the first table of the
//! fragment into rows of raw cells (inner markup plus span attributes), then
//! a [`GridBuilder`] places the raw cells on the logical grid while tracking
//! which columns are still covered by row spans from above.

use lazy_static::lazy_static;
use regex::Regex;

use super::cell::{Cell, CellId};
use super::grid::Grid;
use super::repair::{repair_table_html, RepairReport};
use crate::utils::error::{EditorError, EditorResult};

/// HTML caps a column span at 1000
pub const MAX_COLSPAN: usize = 1000;
/// HTML caps a row span at 65534
pub const MAX_ROWSPAN: usize = 65534;

lazy_static! {
    /// Comments, or a start/end tag with its raw attribute text
    static ref TAG: Regex = Regex::new(
        r#"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#
    )
    .unwrap();

    static ref SPAN_ATTR: Regex = Regex::new(
        r#"(?i)(?:^|\s)(rowspan|colspan)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#
    )
    .unwrap();
}

/// A cell as found in the markup, before grid placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCell {
    /// Trimmed inner markup
    pub content: String,
    pub is_header: bool,
    pub rowspan: usize,
    pub colspan: usize,
}

impl RawCell {
    fn from_markup(content: &str, is_header: bool, attrs: &str) -> Self {
        let mut rowspan = 1;
        let mut colspan = 1;
        for caps in SPAN_ATTR.captures_iter(attrs) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str());
            if caps[1].eq_ignore_ascii_case("rowspan") {
                rowspan = parse_span(value, MAX_ROWSPAN);
            } else {
                colspan = parse_span(value, MAX_COLSPAN);
            }
        }
        RawCell {
            content: content.trim().to_string(),
            is_header,
            rowspan,
            colspan,
        }
    }
}

/// Read a span attribute the way browsers do: leading digits after
/// whitespace, anything missing, non-numeric or non-positive becomes 1
pub fn parse_span(value: Option<&str>, max: usize) -> usize {
    let digits: String = value
        .unwrap_or("")
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return 1;
    }
    match digits.parse::<usize>() {
        Ok(0) => 1,
        Ok(n) => n.min(max),
        Err(_) => max,
    }
}

struct Tag<'a> {
    start: usize,
    end: usize,
    closing: bool,
    name: String,
    attrs: &'a str,
}

fn tags(html: &str) -> impl Iterator<Item = Tag<'_>> {
    TAG.captures_iter(html).filter_map(|caps| {
        let whole = caps.get(0)?;
        let name = caps.get(2)?;
        Some(Tag {
            start: whole.start(),
            end: whole.end(),
            closing: !caps[1].is_empty(),
            name: name.as_str().to_ascii_lowercase(),
            attrs: caps.get(3).map_or("", |m| m.as_str()),
        })
    })
}

/// Row scanner state for the first table of a fragment
#[derive(Default)]
struct RowScanner<'a> {
    rows: Vec<Vec<RawCell>>,
    current_row: Option<Vec<RawCell>>,
    /// (is_header, attrs, content start)
    open_cell: Option<(bool, &'a str, usize)>,
}

impl<'a> RowScanner<'a> {
    fn close_cell(&mut self, html: &str, end: usize) {
        if let Some((is_header, attrs, start)) = self.open_cell.take() {
            let cell = RawCell::from_markup(&html[start..end], is_header, attrs);
            self.current_row.get_or_insert_with(Vec::new).push(cell);
        }
    }

    fn close_row(&mut self, html: &str, end: usize) {
        self.close_cell(html, end);
        if let Some(row) = self.current_row.take() {
            self.rows.push(row);
        }
    }
}

/// Split the first `<table>` of a (repaired) fragment into rows of raw cells
///
/// Rows of tables nested inside cells stay part of that cell's markup.
/// Omitted end tags are tolerated: a cell also ends at the next cell, row,
/// section or table boundary at the same nesting depth.
pub fn scan_rows(html: &str) -> EditorResult<Vec<Vec<RawCell>>> {
    let mut iter = tags(html);
    iter.by_ref()
        .find(|t| t.name == "table" && !t.closing)
        .ok_or_else(EditorError::no_table)?;

    let mut scanner = RowScanner::default();
    let mut depth = 0usize;
    let mut table_end = html.len();

    for tag in iter {
        if tag.name == "table" {
            if !tag.closing {
                depth += 1;
            } else if depth > 0 {
                depth -= 1;
            } else {
                table_end = tag.start;
                break;
            }
            continue;
        }
        if depth > 0 {
            continue;
        }

        match (tag.name.as_str(), tag.closing) {
            ("tr", false) => {
                scanner.close_row(html, tag.start);
                scanner.current_row = Some(Vec::new());
            }
            ("tr", true) | ("thead" | "tbody" | "tfoot", _) => {
                scanner.close_row(html, tag.start);
            }
            ("td" | "th", false) => {
                scanner.close_cell(html, tag.start);
                scanner.current_row.get_or_insert_with(Vec::new);
                scanner.open_cell = Some((tag.name == "th", tag.attrs, tag.end));
            }
            ("td" | "th", true) => {
                scanner.close_cell(html, tag.start);
            }
            _ => {}
        }
    }

    scanner.close_row(html, table_end);
    Ok(scanner.rows)
}

/// Places raw rows on the logical grid
///
/// Maintains a virtual coverage state so that cells are never placed on a
/// position already claimed by a row span from an earlier row.
pub struct GridBuilder {
    /// Remaining rows (including the current one) each column is covered for
    col_coverage: Vec<usize>,
    /// Total number of rows, used to clamp row spans
    total_rows: usize,
    current_row: usize,
    cells: Vec<Cell>,
}

impl GridBuilder {
    pub fn new(total_rows: usize) -> Self {
        GridBuilder {
            col_coverage: Vec::new(),
            total_rows,
            current_row: 0,
            cells: Vec::new(),
        }
    }

    fn is_covered(&self, col: usize) -> bool {
        self.col_coverage.get(col).is_some_and(|&n| n > 0)
    }

    /// Place one row of raw cells
    pub fn process_row(&mut self, raw_cells: Vec<RawCell>) {
        let row = self.current_row;
        let mut col = 0;

        for raw in raw_cells {
            // Skip columns consumed by row spans from above
            while self.is_covered(col) {
                col += 1;
            }

            // A column span may not run into a covered column
            let mut col_span = 1;
            while col_span < raw.colspan && !self.is_covered(col + col_span) {
                col_span += 1;
            }
            let row_span = raw.rowspan.min(self.total_rows.saturating_sub(row)).max(1);

            if col + col_span > self.col_coverage.len() {
                self.col_coverage.resize(col + col_span, 0);
            }
            for c in col..col + col_span {
                self.col_coverage[c] = row_span;
            }

            self.cells.push(Cell {
                text: raw.content,
                is_header: raw.is_header,
                row_span,
                col_span,
                origin_row: row,
                origin_col: col,
                id: Some(CellId::new(row, col)),
            });
            col += col_span;
        }

        for remaining in self.col_coverage.iter_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        self.current_row += 1;
    }

    pub fn finish(self) -> Grid {
        Grid::from_cells(self.total_rows.max(self.current_row), self.cells)
    }
}

/// Parse an HTML fragment into a grid, reporting any repairs applied
pub fn parse_table_with_report(html: &str) -> EditorResult<(Grid, RepairReport)> {
    let (repaired, report) = repair_table_html(html);
    let rows = scan_rows(&repaired)?;

    let mut builder = GridBuilder::new(rows.len());
    for row in rows {
        builder.process_row(row);
    }
    let grid = builder.finish();

    tracing::debug!(
        rows = grid.height(),
        cols = grid.width(),
        cells = grid.cell_count(),
        "parsed table"
    );
    Ok((grid, report))
}

/// Parse an HTML fragment into a grid
pub fn parse_table(html: &str) -> EditorResult<Grid> {
    parse_table_with_report(html).map(|(grid, _)| grid)
}
