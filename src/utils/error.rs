//! Error handling for Tablemend
//!
//! This module provides the error taxonomy shared by the table core, the
//! editor controller and the storage collaborators.

use std::fmt;

/// Editor error type
#[derive(Debug, Clone, PartialEq)]
pub enum EditorError {
    /// Parse error - no table could be located in the input
    Parse { message: String },
    /// A merge selection that does not form an exact rectangle
    InvalidSelection { reason: String },
    /// A row, column or coordinate outside the grid
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    /// The operation needs an open file
    NoSession,
    /// The artifact changed on disk since it was loaded
    PersistConflict { file_id: String },
    /// Generic save failure
    PersistFailure { file_id: String, message: String },
    /// An edit command that could not be understood
    InvalidCommand { message: String },
    /// Invalid configuration
    Config { message: String },
    /// IO error (for file operations)
    Io { message: String },
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::Parse { message } => write!(f, "Parse error: {}", message),
            EditorError::InvalidSelection { reason } => {
                write!(f, "Invalid selection: {}", reason)
            }
            EditorError::OutOfRange { what, index, len } => {
                write!(f, "{} {} out of range (table has {})", what, index, len)
            }
            EditorError::NoSession => write!(f, "No file is open"),
            EditorError::PersistConflict { file_id } => {
                write!(f, "Artifact '{}' was modified externally", file_id)
            }
            EditorError::PersistFailure { file_id, message } => {
                write!(f, "Could not save '{}': {}", file_id, message)
            }
            EditorError::InvalidCommand { message } => write!(f, "Invalid command: {}", message),
            EditorError::Config { message } => write!(f, "Configuration error: {}", message),
            EditorError::Io { message } => write!(f, "IO error: {}", message),
        }
    }
}

impl std::error::Error for EditorError {}

impl From<std::io::Error> for EditorError {
    fn from(err: std::io::Error) -> Self {
        EditorError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;

// Convenience constructors for errors
impl EditorError {
    pub fn parse(message: impl Into<String>) -> Self {
        EditorError::Parse {
            message: message.into(),
        }
    }

    pub fn no_table() -> Self {
        Self::parse("no table found")
    }

    pub fn selection(reason: impl Into<String>) -> Self {
        EditorError::InvalidSelection {
            reason: reason.into(),
        }
    }

    pub fn row_out_of_range(index: usize, len: usize) -> Self {
        EditorError::OutOfRange {
            what: "row",
            index,
            len,
        }
    }

    pub fn column_out_of_range(index: usize, len: usize) -> Self {
        EditorError::OutOfRange {
            what: "column",
            index,
            len,
        }
    }

    pub fn command(message: impl Into<String>) -> Self {
        EditorError::InvalidCommand {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        EditorError::Config {
            message: message.into(),
        }
    }

    /// Whether this error should be shown to the user as an actionable warning
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            EditorError::PersistConflict { .. } | EditorError::PersistFailure { .. }
        )
    }
}

/// Error type for the storage collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    NotFound(String),
    /// The stored artifact no longer matches the revision the caller read
    Conflict(String),
    Io(String),
    Malformed(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Not found: {}", id),
            StoreError::Conflict(id) => write!(f, "Modified externally: {}", id),
            StoreError::Io(msg) => write!(f, "IO error: {}", msg),
            StoreError::Malformed(msg) => write!(f, "Malformed data: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Malformed(err.to_string())
    }
}

impl EditorError {
    /// Attach a file id to a storage failure
    pub fn from_store(file_id: &str, err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => EditorError::PersistConflict {
                file_id: file_id.to_string(),
            },
            other => EditorError::PersistFailure {
                file_id: file_id.to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = EditorError::no_table();
        assert!(err.to_string().contains("Parse error"));
        assert!(err.to_string().contains("no table found"));
    }

    #[test]
    fn test_out_of_range_display() {
        let msg = EditorError::row_out_of_range(7, 3).to_string();
        assert!(msg.contains("row 7"));
        assert!(msg.contains("has 3"));
    }

    #[test]
    fn test_store_conflict_maps_to_persist_conflict() {
        let err = EditorError::from_store("doc1", StoreError::Conflict("doc1".into()));
        assert_eq!(
            err,
            EditorError::PersistConflict {
                file_id: "doc1".into()
            }
        );
        assert!(err.is_persistence());
    }

    #[test]
    fn test_store_io_maps_to_persist_failure() {
        let err = EditorError::from_store("doc1", StoreError::Io("disk full".into()));
        match err {
            EditorError::PersistFailure { file_id, message } => {
                assert_eq!(file_id, "doc1");
                assert!(message.contains("disk full"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_selection_is_not_persistence() {
        assert!(!EditorError::selection("L shape").is_persistence());
    }
}
