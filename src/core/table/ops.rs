//! Grid mutation operations
//!
//! Every operation returns `Ok(true)` when the grid changed and `Ok(false)`
//! for a no-op, so callers know whether a history entry is due. Structural
//! operations leave the grid free of holes.

use std::collections::BTreeSet;

use super::cell::Cell;
use super::grid::Grid;
use crate::utils::error::{EditorError, EditorResult};

/// Where a new row goes relative to the template row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPosition {
    Above,
    Below,
}

/// Where a new column goes relative to the template column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPosition {
    Left,
    Right,
}

impl Grid {
    fn check_row(&self, row: usize) -> EditorResult<()> {
        if row < self.height() {
            Ok(())
        } else {
            Err(EditorError::row_out_of_range(row, self.height()))
        }
    }

    fn check_column(&self, col: usize) -> EditorResult<()> {
        let width = self.width();
        if col < width {
            Ok(())
        } else {
            Err(EditorError::column_out_of_range(col, width))
        }
    }

    fn restart(&mut self) {
        self.cells_mut().clear();
        self.set_height(1);
        self.push(Cell::empty(0, 0));
    }

    /// Replace the text of the cell covering `(row, col)`
    ///
    /// Editing a hole creates a 1x1 cell there.
    pub fn edit_cell(&mut self, row: usize, col: usize, text: &str) -> EditorResult<bool> {
        self.check_row(row)?;
        self.check_column(col)?;

        match self.index_at(row, col) {
            Some(idx) => {
                let cell = &mut self.cells_mut()[idx];
                if cell.text == text {
                    return Ok(false);
                }
                cell.text = text.to_string();
                Ok(true)
            }
            None if text.is_empty() => Ok(false),
            None => {
                self.push(Cell::new(text, row, col));
                self.sort_cells();
                Ok(true)
            }
        }
    }

    /// Insert an empty row above or below `index`
    ///
    /// Row spans crossing the new row are left as they are: they now cover
    /// the inserted row and give up their last row, which is refilled with
    /// empty cells.
    ///
    /// On a grid with no rows left, index 0 starts it over with a single
    /// empty cell.
    pub fn insert_row(&mut self, index: usize, position: RowPosition) -> EditorResult<bool> {
        if self.height() == 0 && index == 0 {
            self.restart();
            tracing::debug!("inserted row into empty grid");
            return Ok(true);
        }
        self.check_row(index)?;
        let new_row = match position {
            RowPosition::Above => index,
            RowPosition::Below => index + 1,
        };
        let width = self.width();

        for cell in self.cells_mut().iter_mut() {
            if cell.origin_row >= new_row {
                cell.origin_row += 1;
            }
        }
        self.set_height(self.height() + 1);

        for col in 0..width {
            if self.index_at(new_row, col).is_none() {
                self.push(Cell::empty(new_row, col));
            }
        }
        self.sort_cells();
        self.fill_holes();

        tracing::debug!(row = new_row, "inserted row");
        Ok(true)
    }

    /// Delete row `index`
    ///
    /// Cells whose origin is on the row are discarded together with their
    /// content, even when they span further rows. Spans crossing the row
    /// from above shrink by one.
    pub fn delete_row(&mut self, index: usize) -> EditorResult<bool> {
        self.check_row(index)?;

        let lost: Vec<String> = self
            .row_cells(index)
            .filter(|c| c.row_span > 1 && !c.is_empty())
            .map(|c| c.text.clone())
            .collect();
        if !lost.is_empty() {
            tracing::debug!(row = index, lost = ?lost, "deleting row drops spanning cells");
        }

        let cells = self.cells_mut();
        cells.retain(|c| c.origin_row != index);
        for cell in cells.iter_mut() {
            if cell.origin_row > index {
                cell.origin_row -= 1;
            } else if cell.end_row() > index {
                cell.row_span -= 1;
            }
        }
        self.set_height(self.height() - 1);
        self.fill_holes();

        tracing::debug!(row = index, "deleted row");
        Ok(true)
    }

    /// Insert an empty column left or right of `index`
    ///
    /// Each new cell takes its header flag from the template column's cell
    /// in the same row.
    ///
    /// On a grid with no columns left, index 0 gives every row one empty cell.
    pub fn insert_column(&mut self, index: usize, position: ColumnPosition) -> EditorResult<bool> {
        if self.width() == 0 && index == 0 {
            if self.height() == 0 {
                self.restart();
            } else {
                for row in 0..self.height() {
                    self.push(Cell::empty(row, 0));
                }
                self.sort_cells();
            }
            tracing::debug!("inserted column into empty grid");
            return Ok(true);
        }
        self.check_column(index)?;
        let new_col = match position {
            ColumnPosition::Left => index,
            ColumnPosition::Right => index + 1,
        };

        let headers: Vec<bool> = (0..self.height())
            .map(|row| self.cell_at(row, index).is_some_and(|c| c.is_header))
            .collect();

        for cell in self.cells_mut().iter_mut() {
            if cell.origin_col >= new_col {
                cell.origin_col += 1;
            }
        }

        for (row, is_header) in headers.into_iter().enumerate() {
            if self.index_at(row, new_col).is_none() {
                self.push(Cell::empty(row, new_col).header(is_header));
            }
        }
        self.sort_cells();
        self.fill_holes();

        tracing::debug!(col = new_col, "inserted column");
        Ok(true)
    }

    /// Delete column `index`
    ///
    /// Cells whose origin is in the column are discarded; spans crossing it
    /// from the left shrink by one.
    pub fn delete_column(&mut self, index: usize) -> EditorResult<bool> {
        self.check_column(index)?;

        let cells = self.cells_mut();
        cells.retain(|c| c.origin_col != index);
        for cell in cells.iter_mut() {
            if cell.origin_col > index {
                cell.origin_col -= 1;
            } else if cell.end_col() > index {
                cell.col_span -= 1;
            }
        }
        self.fill_holes();

        tracing::debug!(col = index, "deleted column");
        Ok(true)
    }

    /// Merge the cells covering the selected coordinates into one
    ///
    /// Each coordinate stands for the whole cell covering it. The union of
    /// those cells must be an exact rectangle. The top-left cell survives
    /// with the non-empty texts of all merged cells joined by a space, in
    /// row-major order.
    pub fn merge_cells(&mut self, selection: &[(usize, usize)]) -> EditorResult<bool> {
        let (height, width) = (self.height(), self.width());
        let mut positions = BTreeSet::new();
        let mut members = BTreeSet::new();

        for &(row, col) in selection {
            if row >= height || col >= width {
                return Err(EditorError::selection(format!(
                    "({}, {}) is outside the {}x{} table",
                    row, col, height, width
                )));
            }
            match self.index_at(row, col) {
                Some(idx) => {
                    members.insert(idx);
                    let cell = &self.cells()[idx];
                    for r in cell.origin_row..cell.end_row().min(height) {
                        for c in cell.origin_col..cell.end_col() {
                            positions.insert((r, c));
                        }
                    }
                }
                None => {
                    positions.insert((row, col));
                }
            }
        }

        let (Some(&(min_row, _)), Some(&(max_row, _))) = (positions.first(), positions.last())
        else {
            return Ok(false);
        };
        let min_col = positions.iter().map(|p| p.1).min().unwrap_or(0);
        let max_col = positions.iter().map(|p| p.1).max().unwrap_or(0);
        let (row_span, col_span) = (max_row - min_row + 1, max_col - min_col + 1);

        if positions.len() != row_span * col_span {
            return Err(EditorError::selection(format!(
                "{} positions do not fill a {}x{} rectangle",
                positions.len(),
                row_span,
                col_span
            )));
        }

        let top_left = self
            .index_at(min_row, min_col)
            .filter(|idx| members.contains(idx));
        if let Some(idx) = top_left {
            let cell = &self.cells()[idx];
            if cell.row_span == row_span && cell.col_span == col_span {
                return Ok(false);
            }
        }

        // Cells are kept sorted by origin, so index order is row-major order
        let merged_text = members
            .iter()
            .map(|&idx| self.cells()[idx].text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let mut survivor = top_left
            .map(|idx| self.cells()[idx].clone())
            .unwrap_or_else(|| Cell::empty(min_row, min_col));
        survivor.text = merged_text;
        survivor.row_span = row_span;
        survivor.col_span = col_span;

        let mut idx = 0;
        self.cells_mut().retain(|_| {
            let keep = !members.contains(&idx);
            idx += 1;
            keep
        });
        self.push(survivor);
        self.sort_cells();

        tracing::debug!(
            row = min_row,
            col = min_col,
            row_span,
            col_span,
            merged = members.len(),
            "merged cells"
        );
        Ok(true)
    }

    /// Split the spanning cell covering `(row, col)` back into 1x1 cells
    ///
    /// The origin keeps the text; every other position gets an empty cell
    /// with the same header flag.
    pub fn split_cell(&mut self, row: usize, col: usize) -> EditorResult<bool> {
        self.check_row(row)?;
        self.check_column(col)?;

        let height = self.height();
        let Some(cell) = self.cell_at_mut(row, col) else {
            return Ok(false);
        };
        if !cell.is_spanning() {
            return Ok(false);
        }

        let (origin_row, origin_col) = (cell.origin_row, cell.origin_col);
        let (end_row, end_col) = (cell.end_row().min(height), cell.end_col());
        let is_header = cell.is_header;
        cell.row_span = 1;
        cell.col_span = 1;

        for r in origin_row..end_row {
            for c in origin_col..end_col {
                if (r, c) != (origin_row, origin_col) {
                    self.push(Cell::empty(r, c).header(is_header));
                }
            }
        }
        self.sort_cells();

        tracing::debug!(row = origin_row, col = origin_col, "split cell");
        Ok(true)
    }
}
