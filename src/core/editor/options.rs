//! Editor configuration

use serde::Deserialize;
use std::path::Path;

use crate::core::table::HtmlOptions;
use crate::utils::error::{EditorError, EditorResult};

/// Controller behavior, loadable from TOML
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    /// Persist the artifact after every committed mutation and undo
    /// Default: true
    pub auto_save: bool,

    /// Record a correction for every committed cell text edit
    /// Default: true
    pub record_annotations: bool,

    /// Reload the artifact and drop local state when a save hits an
    /// externally modified artifact
    /// Default: true
    pub reload_on_conflict: bool,

    /// Maximum number of history snapshots, unbounded when unset
    /// Default: None
    pub history_limit: Option<usize>,

    /// Serializer output
    pub html: HtmlOptions,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            auto_save: true,
            record_annotations: true,
            reload_on_conflict: true,
            history_limit: None,
            html: HtmlOptions::default(),
        }
    }
}

impl EditorOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Edits stay in memory until `save` is called
    pub fn manual() -> Self {
        Self {
            auto_save: false,
            ..Self::default()
        }
    }

    /// Saves the table without keeping a correction trail
    pub fn audit_free() -> Self {
        Self {
            record_annotations: false,
            ..Self::default()
        }
    }

    /// Parse options from a TOML document; missing keys take their defaults
    pub fn from_toml_str(source: &str) -> EditorResult<Self> {
        toml::from_str(source).map_err(|e| EditorError::config(e.to_string()))
    }

    /// Load options from a TOML file
    pub fn load(path: impl AsRef<Path>) -> EditorResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| EditorError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }
}
