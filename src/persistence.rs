use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use egui::Rect;

use crate::codec::DocumentFormat;
use crate::config::CanvasConfig;
use crate::document::DrawingDocumentState;
use crate::error::{CanvasError, CanvasResult};
use crate::renderer::SnapshotRenderer;

/// Extension of saved drawings
pub const DOCUMENT_EXTENSION: &str = "drawing";
/// Extension of the thumbnail stored next to each drawing
pub const THUMBNAIL_EXTENSION: &str = "png";

/// A directory of `.drawing` documents, each with a PNG thumbnail
#[derive(Debug, Clone)]
pub struct DocumentStore {
    /// Directory where documents are stored
    dir: PathBuf,
    renderer: SnapshotRenderer,
    thumbnail_max_side: u32,
    format: DocumentFormat,
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>, config: &CanvasConfig) -> Self {
        Self {
            dir: dir.into(),
            renderer: SnapshotRenderer::from_config(config),
            thumbnail_max_side: config.thumbnail_max_side,
            format: config.document_format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn document_path(&self, name: &str) -> CanvasResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{}.{}", name, DOCUMENT_EXTENSION)))
    }

    pub fn thumbnail_path(&self, name: &str) -> CanvasResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{}.{}", name, THUMBNAIL_EXTENSION)))
    }

    /// Write the document and refresh its thumbnail.
    ///
    /// The thumbnail covers `bounds`, or the drawn area when `None`. Saving while a stroke
    /// is in progress is refused.
    pub fn save(
        &self,
        name: &str,
        doc: &mut DrawingDocumentState,
        bounds: Option<Rect>,
    ) -> CanvasResult<()> {
        if doc.is_capturing() {
            return Err(CanvasError::InvalidState(
                "cannot save while a stroke is in progress".into(),
            ));
        }

        let path = self.document_path(name)?;
        let thumbnail_path = self.thumbnail_path(name)?;

        // Produce everything before touching the directory
        let bytes = doc.encode()?;
        let thumbnail = match bounds.or_else(|| doc.bounds()) {
            Some(bounds) => {
                let image = self.renderer.thumbnail(doc, bounds, self.thumbnail_max_side)?;
                Some(SnapshotRenderer::encode_png(&image)?)
            }
            None => None,
        };

        fs::create_dir_all(&self.dir)?;
        fs::write(&path, &bytes)?;
        match thumbnail {
            Some(png) => fs::write(&thumbnail_path, png)?,
            None => remove_if_exists(&thumbnail_path)?,
        }

        doc.mark_saved();
        log::info!(
            "Saved {} stroke(s) to {} ({} bytes)",
            doc.len(),
            path.display(),
            bytes.len()
        );
        Ok(())
    }

    /// Read a saved document
    pub fn open(&self, name: &str) -> CanvasResult<DrawingDocumentState> {
        let path = self.document_path(name)?;
        let bytes = fs::read(&path)?;
        let doc = DrawingDocumentState::decode(&bytes)?;
        log::info!("Opened {} ({} stroke(s))", path.display(), doc.len());
        Ok(doc)
    }

    /// Open a document, starting fresh when it does not exist or cannot be decoded
    pub fn open_or_new(&self, name: &str) -> CanvasResult<DrawingDocumentState> {
        match self.open(name) {
            Ok(doc) => Ok(doc),
            Err(CanvasError::Io(err)) if err.kind() == ErrorKind::NotFound => {
                log::info!("No document named {:?}, starting a new one", name);
                Ok(DrawingDocumentState::with_format(self.format))
            }
            Err(err) if err.is_corrupt() => {
                log::warn!("Document {:?} is unreadable, starting a new one: {}", name, err);
                Ok(DrawingDocumentState::with_format(self.format))
            }
            Err(err) => Err(err),
        }
    }

    /// Names of all saved documents, sorted
    pub fn list(&self) -> CanvasResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == DOCUMENT_EXTENSION))
            .filter_map(|path| Some(path.file_stem()?.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Rename a document together with its thumbnail. An existing `to` is never replaced.
    pub fn rename(&self, from: &str, to: &str) -> CanvasResult<()> {
        let from_path = self.document_path(from)?;
        let to_path = self.document_path(to)?;
        let from_thumbnail = self.thumbnail_path(from)?;
        let to_thumbnail = self.thumbnail_path(to)?;

        if !from_path.is_file() {
            return Err(std::io::Error::new(
                ErrorKind::NotFound,
                format!("no document named {:?}", from),
            )
            .into());
        }
        if from == to {
            return Ok(());
        }
        if to_path.exists() {
            return Err(CanvasError::NameTaken(to.to_string()));
        }

        fs::rename(&from_path, &to_path)?;
        match fs::rename(&from_thumbnail, &to_thumbnail) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => remove_if_exists(&to_thumbnail)?,
            Err(err) => return Err(err.into()),
        }

        log::info!("Renamed {:?} to {:?}", from, to);
        Ok(())
    }

    /// Delete a document and its thumbnail
    pub fn remove(&self, name: &str) -> CanvasResult<()> {
        fs::remove_file(self.document_path(name)?)?;
        remove_if_exists(&self.thumbnail_path(name)?)?;
        Ok(())
    }
}

fn validate_name(name: &str) -> CanvasResult<()> {
    let invalid = name.trim().is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if invalid {
        return Err(CanvasError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> CanvasResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
