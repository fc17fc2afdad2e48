//! Linear undo history
//!
//! Every committed mutation pushes a full snapshot of the grid. Undo moves a
//! cursor back through the snapshots; committing after an undo discards
//! everything past the cursor.

use crate::core::table::Grid;

/// Snapshot stack with a cursor on the live entry
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<Grid>,
    cursor: usize,
    /// Maximum number of snapshots kept, oldest dropped first
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `limit` snapshots (at least one)
    pub fn with_limit(limit: Option<usize>) -> Self {
        History {
            limit: limit.map(|n| n.max(1)),
            ..Self::default()
        }
    }

    /// Record a snapshot of `grid` as the new live entry
    pub fn commit(&mut self, grid: &Grid) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(grid.clone());

        if let Some(limit) = self.limit {
            if self.entries.len() > limit {
                let excess = self.entries.len() - limit;
                self.entries.drain(..excess);
                tracing::debug!(dropped = excess, "history limit reached");
            }
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one entry and return the grid that is now live
    ///
    /// Returns `None` at the first entry.
    pub fn undo(&mut self) -> Option<Grid> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// The live entry
    pub fn current(&self) -> Option<&Grid> {
        self.entries.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
