//! Integration tests for Tablemend table correction

use pretty_assertions::assert_eq;
use tablemend::{
    normalize_table_html, parse_table, serialize_table, Artifact, AnnotationStore, CellId,
    ColumnPosition, DirStore, EditCommand, EditorError, EditorOptions, FileCatalog, Grid, History,
    LoadState, MemoryStore, RowPosition, SaveStatus, TableEditor,
};

const HEADER_TABLE: &str = "<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td rowspan=\"2\">2</td></tr><tr><td>3</td></tr></table>";

fn reparse(grid: &Grid) -> Grid {
    parse_table(&serialize_table(grid)).unwrap()
}

// ============================================================================
// Parsing Tests
// ============================================================================

mod parsing {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extraction_output_with_sections() {
        let html = r#"<table border="1">
            <thead><tr><th>Year</th><th colspan="2">Revenue</th></tr></thead>
            <tbody>
              <tr><td>2022</td><td>1.2</td><td>EUR</td></tr>
              <tr><td>2023</td><td>1.5<br>(est.)</td><td>EUR</td></tr>
            </tbody>
            <tfoot><tr><td colspan="3">Source: annual report</td></tr></tfoot>
        </table>"#;
        let grid = parse_table(html).unwrap();
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.cell_at(0, 2).unwrap().text, "Revenue");
        assert_eq!(grid.cell_at(2, 1).unwrap().text, "1.5<br>(est.)");
        assert!(grid.is_rectangular());
    }

    #[test]
    fn test_text_outside_table_is_ignored() {
        let grid = parse_table("Table 3: results <table><tr><td>x</td></tr></table> see text").unwrap();
        assert_eq!(grid.cell_count(), 1);
    }

    #[test]
    fn test_only_first_table_is_used() {
        let grid = parse_table(
            "<table><tr><td>first</td></tr></table><table><tr><td>second</td><td>x</td></tr></table>",
        )
        .unwrap();
        assert_eq!(grid.width(), 1);
        assert_eq!(grid.cell_at(0, 0).unwrap().text, "first");
    }

    #[test]
    fn test_normalize_is_stable() {
        let once = normalize_table_html(HEADER_TABLE).unwrap();
        let twice = normalize_table_html(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parse_error_signal() {
        let err = parse_table("").unwrap_err();
        assert!(err.to_string().contains("no table found"));
    }
}

// ============================================================================
// Grid Operation Tests
// ============================================================================

mod grid_ops {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_operation_sequence_round_trips() {
        let mut grid = parse_table(HEADER_TABLE).unwrap();
        grid.insert_column(1, ColumnPosition::Right).unwrap();
        grid.edit_cell(0, 2, "C").unwrap();
        grid.insert_row(2, RowPosition::Below).unwrap();
        grid.merge_cells(&[(3, 0), (3, 1)]).unwrap();
        grid.delete_column(0).unwrap();

        assert!(!grid.has_overlap());
        assert!(grid.is_rectangular());

        let reparsed = reparse(&grid);
        assert_eq!(reparsed.height(), grid.height());
        assert_eq!(reparsed.width(), grid.width());
        assert_eq!(serialize_table(&reparsed), serialize_table(&grid));
    }

    #[test]
    fn test_new_column_header_flags() {
        let mut grid = parse_table(HEADER_TABLE).unwrap();
        grid.insert_column(0, ColumnPosition::Left).unwrap();
        let html = serialize_table(&grid);
        assert!(html.starts_with("<table border=\"1\"><tr><th></th><th>A</th><th>B</th></tr>"));
        assert!(html.contains("<tr><td></td><td>1</td><td rowspan=\"2\">2</td></tr>"));
    }

    #[test]
    fn test_delete_column_with_origin_of_colspan() {
        let mut grid =
            parse_table("<table><tr><td colspan=\"2\">wide</td></tr><tr><td>a</td><td>b</td></tr></table>")
                .unwrap();
        grid.delete_column(0).unwrap();
        assert_eq!(
            serialize_table(&grid),
            "<table border=\"1\"><tr><td></td></tr><tr><td>b</td></tr></table>"
        );
    }

    #[test]
    fn test_merge_over_existing_span() {
        let mut grid = parse_table(HEADER_TABLE).unwrap();
        // (2,1) is covered by the rowspan cell, which is pulled in whole
        grid.merge_cells(&[(1, 0), (2, 0), (2, 1)]).unwrap();
        let cell = grid.cell_at(2, 0).unwrap();
        assert_eq!((cell.row_span, cell.col_span), (2, 2));
        assert_eq!(cell.text, "1 2 3");
        assert_eq!(grid.cell_count(), 3);
    }

    #[test]
    fn test_merge_rejects_span_sticking_out() {
        let mut grid = parse_table(HEADER_TABLE).unwrap();
        // The rowspan cell reaches row 2, which the rest of the selection does not
        let err = grid.merge_cells(&[(0, 0), (0, 1), (1, 0), (1, 1)]).unwrap_err();
        assert!(matches!(err, EditorError::InvalidSelection { .. }));
    }
}

// ============================================================================
// History Tests
// ============================================================================

mod history {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_undo_after_n_commits() {
        let mut grid = parse_table(HEADER_TABLE).unwrap();
        let initial = grid.clone();
        let mut history = History::new();
        history.commit(&grid);

        grid.insert_row(0, RowPosition::Above).unwrap();
        history.commit(&grid);
        grid.merge_cells(&[(0, 0), (0, 1)]).unwrap();
        history.commit(&grid);
        grid.delete_column(1).unwrap();
        history.commit(&grid);

        let mut last = None;
        for _ in 0..3 {
            assert!(history.can_undo());
            last = history.undo();
        }
        assert_eq!(last, Some(initial));
        assert!(!history.can_undo());
        assert_eq!(history.undo(), None);
    }
}

// ============================================================================
// Editor Session Tests
// ============================================================================

mod editor_session {
    use super::*;
    use pretty_assertions::assert_eq;

    fn open(store: MemoryStore, options: EditorOptions) -> TableEditor<MemoryStore> {
        let mut editor = TableEditor::with_options(store, options);
        assert_eq!(editor.open("scan").unwrap(), LoadState::Ready);
        editor
    }

    #[test]
    fn test_commands_drive_editor() {
        let store = MemoryStore::new().with_html("scan", HEADER_TABLE);
        let mut editor = open(store, EditorOptions::default());

        for line in ["edit 2 0 three", "delete-row 0", "undo"] {
            let command: EditCommand = line.parse().unwrap();
            editor.apply(&command).unwrap();
        }

        let saved = editor.store().artifact("scan").unwrap().table(0).unwrap().to_string();
        assert_eq!(saved, editor.html().unwrap());
        assert!(saved.contains("<td>three</td>"));
        assert!(saved.starts_with("<table border=\"1\"><tr><th>A</th><th>B</th></tr>"));
    }

    #[test]
    fn test_manual_mode_writes_on_save() {
        let store = MemoryStore::new().with_html("scan", HEADER_TABLE);
        let mut editor = open(store, EditorOptions::manual());

        let outcome = editor.edit_cell(1, 0, "one").unwrap();
        assert_eq!(outcome.save, SaveStatus::Skipped);
        assert!(editor.is_dirty());
        assert_eq!(editor.store().write_count(), 0);

        assert_eq!(editor.save().unwrap(), SaveStatus::Saved);
        assert_eq!(editor.store().write_count(), 1);
    }

    #[test]
    fn test_audit_free_records_nothing() {
        let store = MemoryStore::new().with_html("scan", HEADER_TABLE);
        let mut editor = open(store, EditorOptions::audit_free());
        editor.edit_cell(1, 0, "one").unwrap();
        assert_eq!(editor.annotations().count(), 0);
        assert!(editor.store().annotation_file("scan").is_none());
    }

    #[test]
    fn test_annotation_follows_moved_cell() {
        let store = MemoryStore::new().with_html("scan", HEADER_TABLE);
        let mut editor = open(store, EditorOptions::default());

        editor.insert_row(0, RowPosition::Above).unwrap();
        // The "3" cell loaded at (2, 0) now sits at (3, 0)
        editor.edit_cell(3, 0, "8").unwrap();

        let annotation = editor.annotations().next().unwrap().clone();
        assert_eq!(annotation.cell_id, CellId::new(2, 0));
        assert_eq!(annotation.original_text, "3");
        assert_eq!(annotation.corrected_text, "8");
    }

    #[test]
    fn test_edits_on_new_cells_are_not_annotated() {
        let store = MemoryStore::new().with_html("scan", HEADER_TABLE);
        let mut editor = open(store, EditorOptions::default());
        editor.insert_row(2, RowPosition::Below).unwrap();
        assert!(editor.edit_cell(3, 0, "new").unwrap().changed);
        assert_eq!(editor.annotations().count(), 0);
    }

    #[test]
    fn test_bundle_keeps_other_tables() {
        let mut store = MemoryStore::new();
        store.insert(
            "scan",
            Artifact::Bundle {
                outside_text: "Figure 2".into(),
                tables: vec![
                    "<table><tr><td>first</td></tr></table>".into(),
                    "<table><tr><td>second</td></tr></table>".into(),
                ],
            },
        );
        let mut editor = TableEditor::new(store);
        assert_eq!(editor.open_table("scan", 1).unwrap(), LoadState::Ready);
        editor.edit_cell(0, 0, "2nd").unwrap();

        match editor.store().artifact("scan").unwrap() {
            Artifact::Bundle {
                outside_text,
                tables,
            } => {
                assert_eq!(outside_text, "Figure 2");
                assert_eq!(tables[0], "<table><tr><td>first</td></tr></table>");
                assert_eq!(tables[1], "<table border=\"1\"><tr><td>2nd</td></tr></table>");
            }
            other => panic!("unexpected artifact {:?}", other),
        }

        assert!(matches!(
            editor.open_table("scan", 2),
            Err(EditorError::OutOfRange { what: "table", .. })
        ));
        assert!(!editor.is_open());
    }

    #[test]
    fn test_missing_file() {
        let mut editor = TableEditor::new(MemoryStore::new());
        let err = editor.open("ghost").unwrap_err();
        assert!(err.is_persistence());
    }

    #[test]
    fn test_switching_files_discards_state() {
        let store = MemoryStore::new()
            .with_html("a", HEADER_TABLE)
            .with_html("b", "<table><tr><td>b</td></tr></table>");
        let mut editor = TableEditor::new(store);
        editor.open("a").unwrap();
        editor.edit_cell(0, 0, "changed").unwrap();
        editor.begin_edit(1, 0).unwrap();

        editor.open("b").unwrap();
        assert!(!editor.can_undo());
        assert!(!editor.is_editing());
        assert_eq!(editor.annotations().count(), 0);
        assert_eq!(editor.file_id(), Some("b"));
    }
}

// ============================================================================
// Directory Workflow Tests
// ============================================================================

mod directory {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_catalog_edit_and_exclude() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scan_01.png"), b"png").unwrap();
        std::fs::write(dir.path().join("scan_02.png"), b"png").unwrap();
        std::fs::write(dir.path().join("scan_01.html"), HEADER_TABLE).unwrap();

        let catalog = FileCatalog::new(dir.path());
        let page = catalog.list_files(1, 50).unwrap();
        assert_eq!(page.total_files, 2);
        assert!(page.files[0].has_html);
        assert!(!page.files[1].has_artifact());

        let mut editor = TableEditor::new(DirStore::new(dir.path()));
        editor.open("scan_01").unwrap();
        editor.edit_cell(1, 0, "one").unwrap();

        let written = std::fs::read_to_string(dir.path().join("scan_01.html")).unwrap();
        assert!(written.contains("<td>one</td>"));
        assert!(catalog.get_file("scan_01").unwrap().has_annotations);

        let trail = editor.store().read_annotations("scan_01").unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].original_text, "1");

        catalog.exclude("scan_01").unwrap();
        assert_eq!(catalog.list_files(1, 50).unwrap().total_files, 1);
        assert!(dir.path().join("excluded/scan_01.html").exists());
    }

    #[test]
    fn test_correction_round_trip_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scan.png"), b"png").unwrap();
        std::fs::write(
            dir.path().join("scan.html"),
            "<table><tr><td>a</td><td>b</td><td>c</td></tr><tr><td>d</td></tr></table>",
        )
        .unwrap();

        let mut editor = TableEditor::new(DirStore::new(dir.path()));
        editor.open("scan").unwrap();
        editor.edit_cell(0, 1, "B").unwrap();
        editor.edit_cell(1, 2, "f").unwrap();
        drop(editor);

        let mut editor = TableEditor::new(DirStore::new(dir.path()));
        editor.open("scan").unwrap();
        assert_eq!(editor.grid().unwrap().cell_at(1, 2).unwrap().text, "f");
        assert!(editor.is_corrected(0, 1));
        assert!(!editor.is_corrected(0, 0));

        let catalog = FileCatalog::new(dir.path());
        let html = editor.html().unwrap();
        let exported = catalog.export_corrected("scan", &html).unwrap();
        assert_eq!(std::fs::read_to_string(exported).unwrap(), html);

        let (path, export) = catalog.export_all_annotations().unwrap();
        assert!(path.exists());
        assert_eq!(export.files.len(), 1);
        assert_eq!(export.files[0].corrections[0].corrected_text, "B");

        let status = catalog.status().unwrap();
        assert_eq!((status.file_count, status.annotated_count), (1, 1));
    }

    #[test]
    fn test_external_change_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scan.html"), HEADER_TABLE).unwrap();

        let mut editor = TableEditor::new(DirStore::new(dir.path()));
        editor.open("scan").unwrap();
        std::fs::write(
            dir.path().join("scan.html"),
            "<table><tr><td>rewritten</td></tr></table>",
        )
        .unwrap();

        let outcome = editor.edit_cell(1, 0, "one").unwrap();
        assert_eq!(outcome.save, SaveStatus::Reloaded);
        assert_eq!(editor.grid().unwrap().cell_at(0, 0).unwrap().text, "rewritten");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("scan.html")).unwrap(),
            "<table><tr><td>rewritten</td></tr></table>"
        );
    }
}
