//! Editor controller
//!
//! `TableEditor` owns one open file at a time: its artifact, the grid of the
//! table being edited, the undo history and the corrections made during the
//! session. Every committed mutation is snapshotted and, with auto-save on,
//! serialized and written back through the store. A failed write never
//! rolls back the in-memory edit.

use fxhash::FxHashMap;
use indexmap::IndexMap;

use super::annotation::Annotation;
use super::command::EditCommand;
use super::options::EditorOptions;
use crate::core::history::History;
use crate::core::table::{
    parse_table_with_report, serialize_table_with_options, CellId, ColumnPosition, Grid,
    RowPosition,
};
use crate::utils::error::{EditorError, EditorResult, StoreError};
use crate::utils::store::{AnnotationStore, Artifact, Revision};

/// Result of opening a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// A table was parsed and is ready for editing
    Ready,
    /// The artifact holds no editable table
    NoTable,
}

/// What happened to the artifact after a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    /// Nothing changed, or auto-save is off
    Skipped,
    /// The write failed; the edit is kept in memory
    Failed(String),
    /// The artifact changed externally and was reloaded, local edits are gone
    Reloaded,
}

/// Outcome of a mutation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    /// Whether the grid changed and a history entry was recorded
    pub changed: bool,
    pub save: SaveStatus,
}

impl EditOutcome {
    fn unchanged() -> Self {
        EditOutcome {
            changed: false,
            save: SaveStatus::Skipped,
        }
    }

    fn changed(save: SaveStatus) -> Self {
        EditOutcome {
            changed: true,
            save,
        }
    }
}

#[derive(Debug, Clone)]
struct EditBuffer {
    row: usize,
    col: usize,
    text: String,
}

/// State of one open file
#[derive(Debug)]
struct Session {
    file_id: String,
    table_index: usize,
    artifact: Artifact,
    /// Revision of the artifact as last read or written
    revision: Revision,
    grid: Grid,
    history: History,
    /// Cell texts as loaded, by parse-time id
    loaded: FxHashMap<CellId, String>,
    annotations: IndexMap<CellId, Annotation>,
    edit_buffer: Option<EditBuffer>,
    dirty: bool,
}

/// Table editing controller over an annotation store
pub struct TableEditor<S: AnnotationStore> {
    store: S,
    options: EditorOptions,
    session: Option<Session>,
}

impl<S: AnnotationStore> TableEditor<S> {
    pub fn new(store: S) -> Self {
        Self::with_options(store, EditorOptions::default())
    }

    pub fn with_options(store: S, options: EditorOptions) -> Self {
        TableEditor {
            store,
            options,
            session: None,
        }
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // ========================================================================
    // File lifecycle
    // ========================================================================

    /// Open the first table of a file
    pub fn open(&mut self, file_id: &str) -> EditorResult<LoadState> {
        self.open_table(file_id, 0)
    }

    /// Open one table of a file, discarding any current session
    pub fn open_table(&mut self, file_id: &str, table_index: usize) -> EditorResult<LoadState> {
        self.session = None;

        let (artifact, revision) = self
            .store
            .read_artifact(file_id)
            .map_err(|e| EditorError::from_store(file_id, e))?;

        let count = artifact.table_count();
        if count == 0 {
            tracing::info!(file_id, "artifact has no tables");
            return Ok(LoadState::NoTable);
        }
        let markup = artifact.table(table_index).ok_or(EditorError::OutOfRange {
            what: "table",
            index: table_index,
            len: count,
        })?;

        let grid = match parse_table_with_report(markup) {
            Ok((grid, report)) => {
                if !report.is_clean() {
                    tracing::debug!(file_id, ?report, "repaired table markup on load");
                }
                grid
            }
            Err(EditorError::Parse { message }) => {
                tracing::info!(file_id, %message, "no editable table");
                return Ok(LoadState::NoTable);
            }
            Err(err) => return Err(err),
        };

        let mut loaded: FxHashMap<CellId, String> = grid
            .cells()
            .iter()
            .filter_map(|c| c.id.map(|id| (id, c.text.clone())))
            .collect();
        let annotations = self.restore_corrections(file_id, &grid, &mut loaded);
        let mut history = History::with_limit(self.options.history_limit);
        history.commit(&grid);

        tracing::info!(
            file_id,
            table = table_index,
            rows = grid.height(),
            cols = grid.width(),
            "opened table"
        );
        self.session = Some(Session {
            file_id: file_id.to_string(),
            table_index,
            artifact,
            revision,
            grid,
            history,
            loaded,
            annotations,
            edit_buffer: None,
            dirty: false,
        });
        Ok(LoadState::Ready)
    }

    /// Corrections of earlier sessions that the loaded table still shows
    ///
    /// The latest stored correction of each cell counts when the cell's text
    /// still equals its corrected text. For those cells the loaded text is
    /// replaced by the originally extracted text, so later edits are
    /// recorded against the extraction.
    fn restore_corrections(
        &self,
        file_id: &str,
        grid: &Grid,
        loaded: &mut FxHashMap<CellId, String>,
    ) -> IndexMap<CellId, Annotation> {
        let stored = match self.store.read_annotations(file_id) {
            Ok(stored) => stored,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(err) => {
                tracing::warn!(file_id, error = %err, "could not read stored corrections");
                Vec::new()
            }
        };

        let mut latest: IndexMap<CellId, Annotation> = IndexMap::new();
        for annotation in stored {
            latest.insert(annotation.cell_id, annotation);
        }
        latest.retain(|id, annotation| {
            annotation.original_text != annotation.corrected_text
                && grid
                    .find_by_id(*id)
                    .is_some_and(|cell| cell.text == annotation.corrected_text)
        });
        for (id, annotation) in &latest {
            loaded.insert(*id, annotation.original_text.clone());
        }

        if !latest.is_empty() {
            tracing::debug!(file_id, corrections = latest.len(), "restored corrections");
        }
        latest
    }

    /// Discard the current session
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            if session.dirty {
                tracing::warn!(file_id = %session.file_id, "closing with unsaved edits");
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn file_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.file_id.as_str())
    }

    pub fn table_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.table_index)
    }

    /// The live grid
    pub fn grid(&self) -> Option<&Grid> {
        self.session.as_ref().map(|s| &s.grid)
    }

    /// The live grid serialized with the configured options
    pub fn html(&self) -> Option<String> {
        self.session
            .as_ref()
            .map(|s| serialize_table_with_options(&s.grid, &self.options.html))
    }

    /// Whether there are edits not yet written to the store
    pub fn is_dirty(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.dirty)
    }

    fn session_mut(&mut self) -> EditorResult<&mut Session> {
        self.session.as_mut().ok_or(EditorError::NoSession)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Run a grid operation, snapshot the result and persist it
    fn mutate<F>(&mut self, op: F) -> EditorResult<EditOutcome>
    where
        F: FnOnce(&mut Grid) -> EditorResult<bool>,
    {
        let session = self.session_mut()?;
        if !op(&mut session.grid)? {
            return Ok(EditOutcome::unchanged());
        }
        session.edit_buffer = None;
        session.history.commit(&session.grid);
        session.dirty = true;
        Ok(EditOutcome::changed(self.auto_save()))
    }

    /// Replace the text of the cell covering `(row, col)`
    pub fn edit_cell(&mut self, row: usize, col: usize, text: &str) -> EditorResult<EditOutcome> {
        let session = self.session_mut()?;
        if !session.grid.edit_cell(row, col, text)? {
            return Ok(EditOutcome::unchanged());
        }
        session.edit_buffer = None;
        session.history.commit(&session.grid);
        session.dirty = true;

        if self.options.record_annotations {
            self.record_correction(row, col);
        }
        Ok(EditOutcome::changed(self.auto_save()))
    }

    pub fn insert_row(&mut self, index: usize, position: RowPosition) -> EditorResult<EditOutcome> {
        self.mutate(|grid| grid.insert_row(index, position))
    }

    /// Delete a row; spanning cells that start on it are lost
    pub fn delete_row(&mut self, index: usize) -> EditorResult<EditOutcome> {
        self.mutate(|grid| grid.delete_row(index))
    }

    pub fn insert_column(
        &mut self,
        index: usize,
        position: ColumnPosition,
    ) -> EditorResult<EditOutcome> {
        self.mutate(|grid| grid.insert_column(index, position))
    }

    /// Delete a column; spanning cells that start in it are lost
    pub fn delete_column(&mut self, index: usize) -> EditorResult<EditOutcome> {
        self.mutate(|grid| grid.delete_column(index))
    }

    pub fn merge_cells(&mut self, selection: &[(usize, usize)]) -> EditorResult<EditOutcome> {
        self.mutate(|grid| grid.merge_cells(selection))
    }

    pub fn split_cell(&mut self, row: usize, col: usize) -> EditorResult<EditOutcome> {
        self.mutate(|grid| grid.split_cell(row, col))
    }

    /// Step back to the previous snapshot
    pub fn undo(&mut self) -> EditorResult<EditOutcome> {
        let session = self.session_mut()?;
        let Some(grid) = session.history.undo() else {
            return Ok(EditOutcome::unchanged());
        };
        session.grid = grid;
        session.edit_buffer = None;
        session.dirty = true;

        // Corrections that the undo reverted no longer apply
        let (live, loaded) = (&session.grid, &session.loaded);
        session.annotations.retain(|id, _| {
            live.find_by_id(*id)
                .is_some_and(|cell| loaded.get(id) != Some(&cell.text))
        });

        tracing::debug!(cursor = session.history.cursor(), "undo");
        Ok(EditOutcome::changed(self.auto_save()))
    }

    pub fn can_undo(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.history.can_undo())
    }

    /// Run one edit command
    pub fn apply(&mut self, command: &EditCommand) -> EditorResult<EditOutcome> {
        tracing::debug!(%command, "apply");
        match command {
            EditCommand::Edit { row, col, text } => self.edit_cell(*row, *col, text),
            EditCommand::InsertRow { index, position } => self.insert_row(*index, *position),
            EditCommand::DeleteRow { index } => self.delete_row(*index),
            EditCommand::InsertColumn { index, position } => self.insert_column(*index, *position),
            EditCommand::DeleteColumn { index } => self.delete_column(*index),
            EditCommand::Merge { cells } => self.merge_cells(cells),
            EditCommand::Split { row, col } => self.split_cell(*row, *col),
            EditCommand::Undo => self.undo(),
        }
    }

    // ========================================================================
    // Edit buffer
    // ========================================================================

    /// Start editing the cell covering `(row, col)` and return its text
    pub fn begin_edit(&mut self, row: usize, col: usize) -> EditorResult<String> {
        let session = self.session_mut()?;
        let (height, width) = (session.grid.height(), session.grid.width());
        if row >= height {
            return Err(EditorError::row_out_of_range(row, height));
        }
        if col >= width {
            return Err(EditorError::column_out_of_range(col, width));
        }

        let text = session
            .grid
            .cell_at(row, col)
            .map(|c| c.text.clone())
            .unwrap_or_default();
        session.edit_buffer = Some(EditBuffer {
            row,
            col,
            text: text.clone(),
        });
        Ok(text)
    }

    /// Replace the uncommitted text; false when no edit is in progress
    pub fn update_edit_buffer(&mut self, text: &str) -> bool {
        match self.session.as_mut().and_then(|s| s.edit_buffer.as_mut()) {
            Some(buffer) => {
                buffer.text = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Commit the edit buffer as a cell edit
    pub fn commit_edit(&mut self) -> EditorResult<EditOutcome> {
        let buffer = self.session_mut()?.edit_buffer.take();
        match buffer {
            Some(EditBuffer { row, col, text }) => self.edit_cell(row, col, &text),
            None => Ok(EditOutcome::unchanged()),
        }
    }

    /// Drop the edit buffer without touching the grid or history
    pub fn cancel_edit(&mut self) -> bool {
        self.session
            .as_mut()
            .and_then(|s| s.edit_buffer.take())
            .is_some()
    }

    /// Whether a cell is being edited (front ends suppress navigation keys)
    pub fn is_editing(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.edit_buffer.is_some())
    }

    pub fn edit_buffer(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|s| s.edit_buffer.as_ref())
            .map(|b| b.text.as_str())
    }

    // ========================================================================
    // Corrections
    // ========================================================================

    /// Corrections the open table shows, stored ones first, then in order of
    /// first edit
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.session
            .iter()
            .flat_map(|s| s.annotations.values())
    }

    /// Whether the cell covering `(row, col)` differs from its extracted text
    pub fn is_corrected(&self, row: usize, col: usize) -> bool {
        self.session.as_ref().is_some_and(|s| {
            s.grid
                .cell_at(row, col)
                .and_then(|cell| cell.id)
                .is_some_and(|id| s.annotations.contains_key(&id))
        })
    }

    /// Corrections recorded for the open file in the store, across sessions
    pub fn stored_annotations(&self) -> EditorResult<Vec<Annotation>> {
        let session = self.session.as_ref().ok_or(EditorError::NoSession)?;
        self.store
            .read_annotations(&session.file_id)
            .map_err(|e| EditorError::from_store(&session.file_id, e))
    }

    fn record_correction(&mut self, row: usize, col: usize) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(cell) = session.grid.cell_at(row, col) else {
            return;
        };
        // Cells created by structural edits have no loaded text to correct
        let Some(id) = cell.id else {
            return;
        };
        let corrected = cell.text.clone();
        let original = session.loaded.get(&id).cloned().unwrap_or_default();

        if corrected == original {
            if session.annotations.shift_remove(&id).is_some() {
                tracing::debug!(cell = %id, "correction reverted");
            }
            return;
        }

        let annotation = Annotation::new(id, original, corrected);
        session.annotations.insert(id, annotation.clone());
        let file_id = session.file_id.clone();

        if let Err(err) = self.store.append_annotation(&file_id, &annotation) {
            tracing::warn!(file_id = %file_id, cell = %id, error = %err, "could not record correction");
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    fn auto_save(&mut self) -> SaveStatus {
        if self.options.auto_save {
            self.persist()
        } else {
            SaveStatus::Skipped
        }
    }

    /// Write the live grid now, regardless of auto-save
    pub fn save(&mut self) -> EditorResult<SaveStatus> {
        if self.session.is_none() {
            return Err(EditorError::NoSession);
        }
        Ok(self.persist())
    }

    fn persist(&mut self) -> SaveStatus {
        let Some(session) = self.session.as_mut() else {
            return SaveStatus::Skipped;
        };

        let html = serialize_table_with_options(&session.grid, &self.options.html);
        let Some(artifact) = session.artifact.with_table(session.table_index, html) else {
            return SaveStatus::Failed(format!("table {} is gone", session.table_index));
        };

        match self
            .store
            .write_artifact(&session.file_id, &artifact, Some(session.revision))
        {
            Ok(revision) => {
                session.artifact = artifact;
                session.revision = revision;
                session.dirty = false;
                tracing::info!(file_id = %session.file_id, %revision, "saved");
                SaveStatus::Saved
            }
            Err(StoreError::Conflict(_)) if self.options.reload_on_conflict => {
                let (file_id, table_index) = (session.file_id.clone(), session.table_index);
                tracing::warn!(
                    file_id = %file_id,
                    "artifact modified externally, reloading and discarding local edits"
                );
                match self.open_table(&file_id, table_index) {
                    Ok(_) => SaveStatus::Reloaded,
                    Err(err) => {
                        tracing::warn!(file_id = %file_id, error = %err, "reload failed");
                        SaveStatus::Failed(err.to_string())
                    }
                }
            }
            Err(err) => {
                let err = EditorError::from_store(&session.file_id, err);
                tracing::warn!(error = %err, "save failed, edit kept in memory");
                SaveStatus::Failed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::store::MemoryStore;

    const TABLE: &str = "<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></table>";

    fn editor() -> TableEditor<MemoryStore> {
        let mut editor = TableEditor::new(MemoryStore::new().with_html("t", TABLE));
        assert_eq!(editor.open("t").unwrap(), LoadState::Ready);
        editor
    }

    #[test]
    fn test_mutation_without_session() {
        let mut editor = TableEditor::new(MemoryStore::new());
        assert_eq!(editor.insert_row(0, RowPosition::Below), Err(EditorError::NoSession));
        assert!(!editor.can_undo());
        assert!(editor.html().is_none());
    }

    #[test]
    fn test_edit_saves_and_records() {
        let mut editor = editor();
        let outcome = editor.edit_cell(1, 0, "one").unwrap();
        assert_eq!(outcome, EditOutcome::changed(SaveStatus::Saved));
        assert!(!editor.is_dirty());

        let saved = editor.store().artifact("t").unwrap().table(0).unwrap().to_string();
        assert!(saved.contains("<td>one</td>"));

        let annotations: Vec<_> = editor.annotations().collect();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].cell_id, CellId::new(1, 0));
        assert_eq!(annotations[0].original_text, "1");
        assert_eq!(editor.store().annotation_file("t").unwrap().corrections.len(), 1);
    }

    #[test]
    fn test_noop_edit_has_no_history() {
        let mut editor = editor();
        assert_eq!(editor.edit_cell(0, 0, "A").unwrap(), EditOutcome::unchanged());
        assert!(!editor.can_undo());
        assert_eq!(editor.store().write_count(), 0);
    }

    #[test]
    fn test_edit_back_to_loaded_text_drops_annotation() {
        let mut editor = editor();
        editor.edit_cell(1, 1, "two").unwrap();
        editor.edit_cell(1, 1, "2").unwrap();
        assert_eq!(editor.annotations().count(), 0);
    }

    #[test]
    fn test_undo_restores_and_saves() {
        let mut editor = editor();
        editor.edit_cell(1, 1, "two").unwrap();
        let outcome = editor.undo().unwrap();
        assert_eq!(outcome.save, SaveStatus::Saved);
        assert_eq!(editor.grid().unwrap().cell_at(1, 1).unwrap().text, "2");
        assert_eq!(editor.annotations().count(), 0);
        assert_eq!(editor.undo().unwrap(), EditOutcome::unchanged());
    }

    #[test]
    fn test_failed_save_keeps_edit() {
        let mut editor = editor();
        editor.store_mut().set_fail_writes(true);
        let outcome = editor.insert_row(0, RowPosition::Below).unwrap();
        assert!(outcome.changed);
        assert!(matches!(outcome.save, SaveStatus::Failed(_)));
        assert_eq!(editor.grid().unwrap().height(), 3);
        assert!(editor.is_dirty());

        editor.store_mut().set_fail_writes(false);
        assert_eq!(editor.save().unwrap(), SaveStatus::Saved);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_conflict_reloads() {
        let mut editor = editor();
        editor.store_mut().tamper(
            "t",
            Artifact::Html("<table><tr><td>fresh</td></tr></table>".into()),
        );
        let outcome = editor.edit_cell(0, 0, "mine").unwrap();
        assert_eq!(outcome.save, SaveStatus::Reloaded);
        assert_eq!(editor.grid().unwrap().cell_at(0, 0).unwrap().text, "fresh");
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_conflict_without_reload() {
        let store = MemoryStore::new().with_html("t", TABLE);
        let options = EditorOptions {
            reload_on_conflict: false,
            ..EditorOptions::default()
        };
        let mut editor = TableEditor::with_options(store, options);
        editor.open("t").unwrap();
        editor
            .store_mut()
            .tamper("t", Artifact::Html("<table></table>".into()));

        let outcome = editor.delete_row(0).unwrap();
        assert!(matches!(outcome.save, SaveStatus::Failed(ref m) if m.contains("modified externally")));
        assert_eq!(editor.grid().unwrap().height(), 1);
    }

    #[test]
    fn test_edit_buffer_lifecycle() {
        let mut editor = editor();
        assert_eq!(editor.begin_edit(1, 0).unwrap(), "1");
        assert!(editor.is_editing());
        assert!(editor.update_edit_buffer("ten"));
        assert_eq!(editor.edit_buffer(), Some("ten"));

        assert!(editor.cancel_edit());
        assert!(!editor.is_editing());
        assert_eq!(editor.grid().unwrap().cell_at(1, 0).unwrap().text, "1");
        assert!(!editor.can_undo());

        editor.begin_edit(1, 0).unwrap();
        editor.update_edit_buffer("ten");
        assert!(editor.commit_edit().unwrap().changed);
        assert!(!editor.is_editing());
        assert_eq!(editor.grid().unwrap().cell_at(1, 0).unwrap().text, "ten");
    }

    #[test]
    fn test_edit_in_ragged_row_survives_reopen() {
        let store = MemoryStore::new().with_html(
            "r",
            "<table><tr><td>a</td><td>b</td><td>c</td></tr><tr><td>d</td></tr></table>",
        );
        let mut editor = TableEditor::new(store);
        editor.open("r").unwrap();
        assert_eq!(editor.edit_cell(1, 2, "X").unwrap().save, SaveStatus::Saved);

        editor.open("r").unwrap();
        let grid = editor.grid().unwrap();
        assert_eq!(grid.cell_at(1, 2).unwrap().text, "X");
        assert_eq!(grid.cell_at(1, 1).unwrap().text, "");
        assert_eq!(grid.cell_at(1, 0).unwrap().text, "d");
    }

    #[test]
    fn test_reopen_restores_corrections() {
        let mut editor = editor();
        editor.edit_cell(1, 0, "one").unwrap();
        editor.edit_cell(1, 1, "two").unwrap();
        editor.edit_cell(1, 1, "2").unwrap();

        let mut editor = TableEditor::new(editor.into_store());
        editor.open("t").unwrap();
        assert!(editor.is_corrected(1, 0));
        assert!(!editor.is_corrected(1, 1));
        assert!(!editor.is_corrected(0, 0));
        assert_eq!(editor.annotations().count(), 1);

        // A further edit is still recorded against the extracted text
        editor.edit_cell(1, 0, "uno").unwrap();
        let annotation = editor.annotations().next().unwrap();
        assert_eq!(annotation.original_text, "1");
        assert_eq!(annotation.corrected_text, "uno");

        editor.edit_cell(1, 0, "1").unwrap();
        assert!(!editor.is_corrected(1, 0));
    }

    #[test]
    fn test_no_table() {
        let store = MemoryStore::new().with_html("blank", "<p>nothing extracted</p>");
        let mut editor = TableEditor::new(store);
        assert_eq!(editor.open("blank").unwrap(), LoadState::NoTable);
        assert!(!editor.is_open());
    }

    #[test]
    fn test_invalid_merge_leaves_state() {
        let mut editor = editor();
        let before = editor.html();
        let err = editor.merge_cells(&[(0, 0), (1, 1)]).unwrap_err();
        assert!(matches!(err, EditorError::InvalidSelection { .. }));
        assert_eq!(editor.html(), before);
        assert!(!editor.can_undo());
    }
}
