//! Image directory catalog
//!
//! Lists the table images of a directory together with the sidecar files
//! the editor works on. Also serves the images, exports corrected tables and
//! collected corrections, and archives files that should not be annotated.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::editor::AnnotationExport;
use crate::utils::error::StoreError;
use crate::utils::store::DirStore;

/// Image file extensions recognized by the catalog
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff"];

/// Name of the archive directory used by [`FileCatalog::exclude`]
pub const EXCLUDED_DIR: &str = "excluded";

/// One table image and the state of its sidecars
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// File stem, shared by the image and its sidecars
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub has_html: bool,
    pub has_bundle: bool,
    pub has_annotations: bool,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl FileEntry {
    /// Whether there is an artifact to edit
    pub fn has_artifact(&self) -> bool {
        self.has_html || self.has_bundle
    }
}

/// One page of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePage {
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
    pub total_files: usize,
    pub total_pages: usize,
    pub files: Vec<FileEntry>,
}

/// Summary of a catalog directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatus {
    pub images_directory: PathBuf,
    pub file_count: usize,
    pub annotated_count: usize,
    pub checked_at: DateTime<Utc>,
}

/// MIME type of an image path, by extension
pub fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Catalog over one image directory
#[derive(Debug, Clone)]
pub struct FileCatalog {
    root: PathBuf,
    sidecars: DirStore,
}

impl FileCatalog {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            sidecars: DirStore::new(&root),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All images of the directory, sorted by file name
    pub fn scan(&self) -> Result<Vec<FileEntry>, StoreError> {
        if !self.root.is_dir() {
            tracing::warn!(dir = %self.root.display(), "image directory not found");
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for dir_entry in std::fs::read_dir(&self.root)? {
            let path = dir_entry?.path();
            if !path.is_file() || !is_image(&path) {
                continue;
            }
            let (Some(id), Some(name)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.file_name().and_then(|s| s.to_str()),
            ) else {
                continue;
            };

            let metadata = std::fs::metadata(&path)?;
            entries.push(FileEntry {
                id: id.to_string(),
                name: name.to_string(),
                has_html: self.sidecars.html_path(id)?.exists(),
                has_bundle: self.sidecars.bundle_path(id)?.exists(),
                has_annotations: self.sidecars.annotations_path(id)?.exists(),
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                path,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::debug!(files = entries.len(), "scanned image directory");
        Ok(entries)
    }

    /// One page of the sorted listing
    ///
    /// Pages are 1-based; page 0 and page size 0 are read as 1. A page past
    /// the end is empty.
    pub fn list_files(&self, page: usize, page_size: usize) -> Result<FilePage, StoreError> {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let entries = self.scan()?;

        let total_files = entries.len();
        let total_pages = total_files.div_ceil(page_size);
        let start = (page - 1).saturating_mul(page_size).min(total_files);
        let end = start.saturating_add(page_size).min(total_files);

        Ok(FilePage {
            page,
            page_size,
            total_files,
            total_pages,
            files: entries[start..end].to_vec(),
        })
    }

    pub fn get_file(&self, file_id: &str) -> Result<FileEntry, StoreError> {
        self.scan()?
            .into_iter()
            .find(|entry| entry.id == file_id)
            .ok_or_else(|| StoreError::NotFound(file_id.to_string()))
    }

    pub fn image_bytes(&self, file_id: &str) -> Result<Vec<u8>, StoreError> {
        let entry = self.get_file(file_id)?;
        Ok(std::fs::read(&entry.path)?)
    }

    /// The image as a `data:` URL
    pub fn image_data_url(&self, file_id: &str) -> Result<String, StoreError> {
        let entry = self.get_file(file_id)?;
        let bytes = std::fs::read(&entry.path)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(format!("data:{};base64,{}", mime_type(&entry.path), encoded))
    }

    /// Image and annotation counts of the directory
    pub fn status(&self) -> Result<CatalogStatus, StoreError> {
        let entries = self.scan()?;
        Ok(CatalogStatus {
            images_directory: self.root.clone(),
            file_count: entries.len(),
            annotated_count: entries.iter().filter(|e| e.has_annotations).count(),
            checked_at: Utc::now(),
        })
    }

    /// Write the corrected table of a listed image to `<id>_corrected.html`
    pub fn export_corrected(&self, file_id: &str, html: &str) -> Result<PathBuf, StoreError> {
        self.get_file(file_id)?;
        self.sidecars.export_corrected(file_id, html)
    }

    /// Collect the correction trails of every annotated image
    ///
    /// Trails that cannot be read are skipped with a warning.
    pub fn collect_annotations(&self) -> Result<AnnotationExport, StoreError> {
        let mut files = Vec::new();
        for entry in self.scan()?.iter().filter(|e| e.has_annotations) {
            match self.sidecars.read_annotation_file(&entry.id) {
                Ok(Some(file)) => files.push(file),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(file_id = %entry.id, error = %err, "skipping unreadable annotations");
                }
            }
        }
        Ok(AnnotationExport::new(files))
    }

    /// Write every correction trail into one `annotations_export_<time>.json`
    ///
    /// Fails with `NotFound` when no image has corrections.
    pub fn export_all_annotations(&self) -> Result<(PathBuf, AnnotationExport), StoreError> {
        let export = self.collect_annotations()?;
        if export.files.is_empty() {
            return Err(StoreError::NotFound("annotated files".to_string()));
        }

        let name = format!(
            "annotations_export_{}.json",
            export.timestamp.format("%Y%m%d_%H%M%S")
        );
        let path = self.root.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(&export)?)?;

        tracing::info!(
            files = export.files.len(),
            corrections = export.correction_count(),
            path = %path.display(),
            "exported annotations"
        );
        Ok((path, export))
    }

    /// Move an image and its sidecars into the archive directory
    ///
    /// Returns the new paths of the moved files.
    pub fn exclude(&self, file_id: &str) -> Result<Vec<PathBuf>, StoreError> {
        let entry = self.get_file(file_id)?;
        let archive = self.root.join(EXCLUDED_DIR);
        std::fs::create_dir_all(&archive)?;

        let candidates = [
            entry.path,
            self.sidecars.html_path(file_id)?,
            self.sidecars.bundle_path(file_id)?,
            self.sidecars.annotations_path(file_id)?,
            self.sidecars.corrected_path(file_id)?,
        ];

        let mut moved = Vec::new();
        for source in candidates {
            let Some(name) = source.file_name() else {
                continue;
            };
            if !source.exists() {
                continue;
            }
            let target = archive.join(name);
            std::fs::rename(&source, &target)?;
            moved.push(target);
        }

        tracing::info!(file_id, moved = moved.len(), "excluded file");
        Ok(moved)
    }
}
