//! Table editor
//!
//! Ties the table core to an annotation store:
//!
//! ```text
//! store -> artifact -> parse -> Grid + History -> mutations -> serialize -> store
//! ```
//!
//! # Example
//!
//! ```
//! use tablemend::core::editor::{LoadState, SaveStatus, TableEditor};
//! use tablemend::utils::store::MemoryStore;
//!
//! let store = MemoryStore::new().with_html("scan_01", "<table><tr><td>1O</td></tr></table>");
//! let mut editor = TableEditor::new(store);
//! assert_eq!(editor.open("scan_01").unwrap(), LoadState::Ready);
//!
//! let outcome = editor.edit_cell(0, 0, "10").unwrap();
//! assert_eq!(outcome.save, SaveStatus::Saved);
//! assert_eq!(editor.annotations().count(), 1);
//! ```

mod annotation;
mod command;
mod controller;
mod options;

pub use annotation::{Annotation, AnnotationExport, AnnotationFile};
pub use command::EditCommand;
pub use controller::{EditOutcome, LoadState, SaveStatus, TableEditor};
pub use options::EditorOptions;
