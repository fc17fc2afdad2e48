//! Artifact and annotation persistence
//!
//! The editor never touches the filesystem directly. It reads and writes
//! through the `AnnotationStore` trait, which has two implementations:
//! - `DirStore`: sidecar files next to the table images (CLI)
//! - `MemoryStore`: in-memory storage with failure injection (testing)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::editor::{Annotation, AnnotationFile};
use crate::utils::error::StoreError;

/// The persisted extraction of one image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// A single HTML table fragment
    Html(String),
    /// Text found outside the tables plus every extracted table
    Bundle {
        outside_text: String,
        tables: Vec<String>,
    },
}

impl Artifact {
    pub fn table_count(&self) -> usize {
        match self {
            Artifact::Html(_) => 1,
            Artifact::Bundle { tables, .. } => tables.len(),
        }
    }

    /// Markup of the table at `index`
    pub fn table(&self, index: usize) -> Option<&str> {
        match self {
            Artifact::Html(html) if index == 0 => Some(html),
            Artifact::Html(_) => None,
            Artifact::Bundle { tables, .. } => tables.get(index).map(String::as_str),
        }
    }

    /// Copy of the artifact with the table at `index` replaced
    pub fn with_table(&self, index: usize, html: String) -> Option<Artifact> {
        match self {
            Artifact::Html(_) if index == 0 => Some(Artifact::Html(html)),
            Artifact::Html(_) => None,
            Artifact::Bundle {
                outside_text,
                tables,
            } => {
                if index >= tables.len() {
                    return None;
                }
                let mut tables = tables.clone();
                tables[index] = html;
                Some(Artifact::Bundle {
                    outside_text: outside_text.clone(),
                    tables,
                })
            }
        }
    }

    pub fn revision(&self) -> Revision {
        Revision(fxhash::hash64(self))
    }
}

/// Content hash identifying one version of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Revision(pub u64);

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Persistence collaborator of the editor
pub trait AnnotationStore {
    /// Read the artifact of a file together with its current revision
    fn read_artifact(&self, file_id: &str) -> Result<(Artifact, Revision), StoreError>;

    /// Replace the artifact of a file
    ///
    /// With `expected` set, the write fails with `StoreError::Conflict` when
    /// the stored artifact is no longer at that revision.
    fn write_artifact(
        &mut self,
        file_id: &str,
        artifact: &Artifact,
        expected: Option<Revision>,
    ) -> Result<Revision, StoreError>;

    /// Corrections recorded so far, oldest first
    fn read_annotations(&self, file_id: &str) -> Result<Vec<Annotation>, StoreError>;

    /// Append one correction to the trail of a file
    fn append_annotation(&mut self, file_id: &str, annotation: &Annotation)
        -> Result<(), StoreError>;
}

fn check_revision(
    file_id: &str,
    current: Option<Revision>,
    expected: Option<Revision>,
) -> Result<(), StoreError> {
    match (current, expected) {
        (Some(current), Some(expected)) if current != expected => {
            Err(StoreError::Conflict(file_id.to_string()))
        }
        _ => Ok(()),
    }
}

/// In-memory store (for testing and embedding)
#[derive(Debug, Default)]
pub struct MemoryStore {
    artifacts: HashMap<String, Artifact>,
    annotations: HashMap<String, AnnotationFile>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an HTML artifact
    pub fn with_html(mut self, file_id: &str, html: &str) -> Self {
        self.insert(file_id, Artifact::Html(html.to_string()));
        self
    }

    pub fn insert(&mut self, file_id: &str, artifact: Artifact) {
        self.artifacts.insert(file_id.to_string(), artifact);
    }

    pub fn artifact(&self, file_id: &str) -> Option<&Artifact> {
        self.artifacts.get(file_id)
    }

    /// Replace an artifact behind the editor's back
    pub fn tamper(&mut self, file_id: &str, artifact: Artifact) {
        self.artifacts.insert(file_id.to_string(), artifact);
    }

    /// Make every following artifact write fail with an IO error
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of successful artifact writes
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn annotation_file(&self, file_id: &str) -> Option<&AnnotationFile> {
        self.annotations.get(file_id)
    }
}

impl AnnotationStore for MemoryStore {
    fn read_artifact(&self, file_id: &str) -> Result<(Artifact, Revision), StoreError> {
        self.artifacts
            .get(file_id)
            .map(|a| (a.clone(), a.revision()))
            .ok_or_else(|| StoreError::NotFound(file_id.to_string()))
    }

    fn write_artifact(
        &mut self,
        file_id: &str,
        artifact: &Artifact,
        expected: Option<Revision>,
    ) -> Result<Revision, StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io("write refused".to_string()));
        }
        let current = self.artifacts.get(file_id).map(Artifact::revision);
        check_revision(file_id, current, expected)?;

        self.artifacts.insert(file_id.to_string(), artifact.clone());
        self.writes += 1;
        Ok(artifact.revision())
    }

    fn read_annotations(&self, file_id: &str) -> Result<Vec<Annotation>, StoreError> {
        Ok(self
            .annotations
            .get(file_id)
            .map(|f| f.corrections.clone())
            .unwrap_or_default())
    }

    fn append_annotation(
        &mut self,
        file_id: &str,
        annotation: &Annotation,
    ) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io("write refused".to_string()));
        }
        self.annotations
            .entry(file_id.to_string())
            .or_insert_with(|| AnnotationFile::new(file_id))
            .push(annotation.clone());
        Ok(())
    }
}

/// JSON form of `Artifact::Bundle`
#[derive(Serialize, Deserialize)]
struct BundleFile {
    #[serde(default)]
    outside_text: String,
    #[serde(default)]
    tables: Vec<String>,
}

/// Sidecar files in an image directory
///
/// For a file id `scan_01`:
/// - `scan_01.html`: HTML artifact
/// - `scan_01.json`: bundle artifact, preferred over the HTML when present
/// - `scan_01_annotations.json`: correction trail
/// - `scan_01_corrected.html`: exported corrected table
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn sidecar(&self, file_id: &str, suffix: &str) -> Result<PathBuf, StoreError> {
        if file_id.is_empty()
            || file_id.contains(['/', '\\'])
            || file_id == "."
            || file_id == ".."
        {
            return Err(StoreError::Malformed(format!("invalid file id '{}'", file_id)));
        }
        Ok(self.root.join(format!("{}{}", file_id, suffix)))
    }

    pub fn html_path(&self, file_id: &str) -> Result<PathBuf, StoreError> {
        self.sidecar(file_id, ".html")
    }

    pub fn bundle_path(&self, file_id: &str) -> Result<PathBuf, StoreError> {
        self.sidecar(file_id, ".json")
    }

    pub fn annotations_path(&self, file_id: &str) -> Result<PathBuf, StoreError> {
        self.sidecar(file_id, "_annotations.json")
    }

    pub fn corrected_path(&self, file_id: &str) -> Result<PathBuf, StoreError> {
        self.sidecar(file_id, "_corrected.html")
    }

    /// Write the corrected table next to the image, replacing an earlier export
    pub fn export_corrected(&self, file_id: &str, html: &str) -> Result<PathBuf, StoreError> {
        let path = self.corrected_path(file_id)?;
        std::fs::write(&path, html)?;
        tracing::info!(file_id, path = %path.display(), "exported corrected table");
        Ok(path)
    }

    /// The whole correction trail of a file, `None` when nothing was recorded
    pub fn read_annotation_file(
        &self,
        file_id: &str,
    ) -> Result<Option<AnnotationFile>, StoreError> {
        let path = self.annotations_path(file_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let source = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&source)?))
    }
}

impl AnnotationStore for DirStore {
    fn read_artifact(&self, file_id: &str) -> Result<(Artifact, Revision), StoreError> {
        let bundle_path = self.bundle_path(file_id)?;
        let artifact = if bundle_path.exists() {
            let bundle: BundleFile = serde_json::from_str(&std::fs::read_to_string(&bundle_path)?)?;
            Artifact::Bundle {
                outside_text: bundle.outside_text,
                tables: bundle.tables,
            }
        } else {
            let html_path = self.html_path(file_id)?;
            if !html_path.exists() {
                return Err(StoreError::NotFound(file_id.to_string()));
            }
            Artifact::Html(std::fs::read_to_string(&html_path)?)
        };
        let revision = artifact.revision();
        Ok((artifact, revision))
    }

    fn write_artifact(
        &mut self,
        file_id: &str,
        artifact: &Artifact,
        expected: Option<Revision>,
    ) -> Result<Revision, StoreError> {
        if expected.is_some() {
            let current = match self.read_artifact(file_id) {
                Ok((_, revision)) => Some(revision),
                Err(StoreError::NotFound(_)) => None,
                Err(err) => return Err(err),
            };
            check_revision(file_id, current, expected)?;
        }

        match artifact {
            Artifact::Html(html) => std::fs::write(self.html_path(file_id)?, html)?,
            Artifact::Bundle {
                outside_text,
                tables,
            } => {
                let bundle = BundleFile {
                    outside_text: outside_text.clone(),
                    tables: tables.clone(),
                };
                std::fs::write(
                    self.bundle_path(file_id)?,
                    serde_json::to_string_pretty(&bundle)?,
                )?
            }
        }

        tracing::info!(file_id, "artifact written");
        Ok(artifact.revision())
    }

    fn read_annotations(&self, file_id: &str) -> Result<Vec<Annotation>, StoreError> {
        Ok(self
            .read_annotation_file(file_id)?
            .map(|f| f.corrections)
            .unwrap_or_default())
    }

    fn append_annotation(
        &mut self,
        file_id: &str,
        annotation: &Annotation,
    ) -> Result<(), StoreError> {
        let mut file = self
            .read_annotation_file(file_id)?
            .unwrap_or_else(|| AnnotationFile::new(file_id));
        file.push(annotation.clone());
        std::fs::write(
            self.annotations_path(file_id)?,
            serde_json::to_string_pretty(&file)?,
        )?;
        Ok(())
    }
}
