//! Cell correction records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::table::CellId;

/// One committed correction of a parsed cell's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Parse-time identity of the corrected cell
    #[serde(rename = "id")]
    pub cell_id: CellId,
    pub original_text: String,
    pub corrected_text: String,
    pub timestamp: DateTime<Utc>,
}

impl Annotation {
    /// Correction stamped with the current time
    pub fn new(
        cell_id: CellId,
        original_text: impl Into<String>,
        corrected_text: impl Into<String>,
    ) -> Self {
        Annotation {
            cell_id,
            original_text: original_text.into(),
            corrected_text: corrected_text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// On-disk correction trail of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationFile {
    pub table_id: String,
    /// Time of the last append
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub corrections: Vec<Annotation>,
}

impl AnnotationFile {
    pub fn new(table_id: impl Into<String>) -> Self {
        AnnotationFile {
            table_id: table_id.into(),
            timestamp: Utc::now(),
            corrections: Vec::new(),
        }
    }

    pub fn push(&mut self, annotation: Annotation) {
        self.timestamp = annotation.timestamp;
        self.corrections.push(annotation);
    }
}

/// Correction trails of a whole directory, collected for training data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationExport {
    pub timestamp: DateTime<Utc>,
    pub files: Vec<AnnotationFile>,
}

impl AnnotationExport {
    pub fn new(files: Vec<AnnotationFile>) -> Self {
        AnnotationExport {
            timestamp: Utc::now(),
            files,
        }
    }

    /// Number of corrections across all files
    pub fn correction_count(&self) -> usize {
        self.files.iter().map(|f| f.corrections.len()).sum()
    }
}
