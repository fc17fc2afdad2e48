//! Logical table grid
//!
//! The grid stores cells by origin and derives coverage from spans. Every
//! grid position is either the origin of a cell, covered by a spanning cell
//! whose origin lies elsewhere, or a hole. Holes only exist transiently and
//! in freshly parsed ragged tables; [`Grid::fill_holes`] removes them.

use super::cell::{Cell, CellId};

/// What occupies a single grid position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The top-left position of the cell at this index
    Origin(usize),
    /// Covered by the spanning cell at this index
    Covered(usize),
    /// Not occupied by any cell
    Hole,
}

impl Slot {
    /// Index of the occupying cell, if any
    pub fn cell(self) -> Option<usize> {
        match self {
            Slot::Origin(i) | Slot::Covered(i) => Some(i),
            Slot::Hole => None,
        }
    }
}

/// Logical grid: cells kept in row-major order of their origins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Cell>,
    rows: usize,
}

impl Grid {
    /// Create an empty grid with the given number of rows
    pub fn new(rows: usize) -> Self {
        Grid {
            cells: Vec::new(),
            rows,
        }
    }

    /// Build a grid from cells; the height grows to fit every origin
    pub fn from_cells(rows: usize, cells: Vec<Cell>) -> Self {
        let rows = cells
            .iter()
            .map(|c| c.origin_row + 1)
            .max()
            .unwrap_or(0)
            .max(rows);
        let mut grid = Grid { cells, rows };
        grid.sort_cells();
        grid
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.rows
    }

    /// Number of columns: the furthest column any cell reaches
    pub fn width(&self) -> usize {
        self.cells.iter().map(Cell::end_col).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cells whose origin lies in `row`, in ascending column order
    pub fn row_cells(&self, row: usize) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(move |c| c.origin_row == row)
    }

    /// Index of the cell whose occupied rectangle contains `(row, col)`
    pub fn index_at(&self, row: usize, col: usize) -> Option<usize> {
        self.cells.iter().position(|c| c.covers(row, col))
    }

    /// The cell whose occupied rectangle contains `(row, col)`
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index_at(row, col).map(|i| &self.cells[i])
    }

    pub fn cell_at_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.index_at(row, col).map(move |i| &mut self.cells[i])
    }

    /// Find a parsed cell by its stable id
    pub fn find_by_id(&self, id: CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == Some(id))
    }

    /// Occupancy matrix of `height x width` slots
    pub fn occupancy(&self) -> Vec<Vec<Slot>> {
        let width = self.width();
        let mut matrix = vec![vec![Slot::Hole; width]; self.rows];
        for (idx, cell) in self.cells.iter().enumerate() {
            for r in cell.origin_row..cell.end_row().min(self.rows) {
                for c in cell.origin_col..cell.end_col() {
                    matrix[r][c] = if r == cell.origin_row && c == cell.origin_col {
                        Slot::Origin(idx)
                    } else {
                        Slot::Covered(idx)
                    };
                }
            }
        }
        matrix
    }

    /// Number of occupied columns in `row`, counting positions covered from above
    pub fn row_width(&self, row: usize) -> usize {
        self.cells
            .iter()
            .filter(|c| row >= c.origin_row && row < c.end_row())
            .map(|c| c.col_span)
            .sum()
    }

    /// Positions that no cell occupies
    pub fn holes(&self) -> Vec<(usize, usize)> {
        let mut holes = Vec::new();
        for (r, row) in self.occupancy().iter().enumerate() {
            for (c, slot) in row.iter().enumerate() {
                if *slot == Slot::Hole {
                    holes.push((r, c));
                }
            }
        }
        holes
    }

    /// Whether every row occupies the full width with no holes
    pub fn is_rectangular(&self) -> bool {
        self.holes().is_empty()
    }

    /// Whether any two cells claim the same position
    pub fn has_overlap(&self) -> bool {
        let width = self.width();
        let mut seen = vec![vec![false; width]; self.rows];
        for cell in &self.cells {
            for r in cell.origin_row..cell.end_row().min(self.rows) {
                for c in cell.origin_col..cell.end_col() {
                    if seen[r][c] {
                        return true;
                    }
                    seen[r][c] = true;
                }
            }
        }
        false
    }

    /// Place an empty data cell at every hole
    pub fn fill_holes(&mut self) -> usize {
        let holes = self.holes();
        let count = holes.len();
        for (r, c) in holes {
            self.cells.push(Cell::empty(r, c));
        }
        if count > 0 {
            self.sort_cells();
        }
        count
    }

    pub(crate) fn cells_mut(&mut self) -> &mut Vec<Cell> {
        &mut self.cells
    }

    pub(crate) fn set_height(&mut self, rows: usize) {
        self.rows = rows;
    }

    pub(crate) fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    pub(crate) fn sort_cells(&mut self) {
        self.cells.sort_by_key(|c| (c.origin_row, c.origin_col));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Grid {
        // A B
        // 1 [2 spans two rows]
        // 3
        Grid::from_cells(
            3,
            vec![
                Cell::new("A", 0, 0).header(true),
                Cell::new("B", 0, 1).header(true),
                Cell::new("1", 1, 0),
                Cell::new("2", 1, 1).with_spans(2, 1),
                Cell::new("3", 2, 0),
            ],
        )
    }

    #[test]
    fn test_dimensions() {
        let grid = sample();
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 2);
        assert!(grid.is_rectangular());
        assert!(!grid.has_overlap());
    }

    #[test]
    fn test_covered_lookup() {
        let grid = sample();
        assert_eq!(grid.cell_at(2, 1).map(|c| c.text.as_str()), Some("2"));
        let occupancy = grid.occupancy();
        assert!(matches!(occupancy[2][1], Slot::Covered(_)));
        assert!(matches!(occupancy[1][1], Slot::Origin(_)));
        assert_eq!(grid.row_cells(2).count(), 1);
        assert_eq!(grid.row_width(2), 2);
    }

    #[test]
    fn test_fill_holes() {
        let mut grid = Grid::from_cells(
            2,
            vec![
                Cell::new("a", 0, 0),
                Cell::new("b", 0, 1),
                Cell::new("c", 1, 0),
            ],
        );
        assert_eq!(grid.holes(), vec![(1, 1)]);
        assert_eq!(grid.fill_holes(), 1);
        assert!(grid.is_rectangular());
        assert_eq!(grid.cell_at(1, 1).map(|c| c.text.as_str()), Some(""));
    }

    #[test]
    fn test_overlap_detection() {
        let grid = Grid::from_cells(
            2,
            vec![Cell::new("a", 0, 0).with_spans(2, 1), Cell::new("b", 1, 0)],
        );
        assert!(grid.has_overlap());
    }
}
