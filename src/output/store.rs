// Persisted documentation artifact and the process-wide current reference

use crate::config::ARTIFACT_FILE_NAME;
use crate::error::{Error, Result};
use crate::output::docs::{GeneratedDocumentation, FORMAT_VERSION};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Owns `<dir>/documentation.json` and the in-memory copy of the last
/// document loaded or saved.
///
/// The current reference starts absent and is only ever replaced whole.
#[derive(Debug)]
pub struct DocumentationStore {
    dir: PathBuf,
    current: RwLock<Option<Arc<GeneratedDocumentation>>>,
}

impl DocumentationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: RwLock::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir.join(ARTIFACT_FILE_NAME)
    }

    /// The document from the last successful load or save
    pub fn current(&self) -> Option<Arc<GeneratedDocumentation>> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_current(&self, doc: Arc<GeneratedDocumentation>) {
        match self.current.write() {
            Ok(mut guard) => *guard = Some(doc),
            Err(poisoned) => *poisoned.into_inner() = Some(doc),
        }
    }

    /// Read the persisted artifact
    ///
    /// A missing file is `None`. Corrupt JSON or an unknown format version is
    /// logged and also treated as `None`; the file is left in place for the
    /// next save to replace.
    pub fn load(&self) -> Result<Option<Arc<GeneratedDocumentation>>> {
        let path = self.artifact_path();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No documentation at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let doc: GeneratedDocumentation = match serde_json::from_slice(&bytes) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Ignoring unreadable documentation {}: {}", path.display(), e);
                return Ok(None);
            }
        };

        if doc.format_version != FORMAT_VERSION {
            warn!(
                "Ignoring documentation {} with format version {} (expected {})",
                path.display(),
                doc.format_version,
                FORMAT_VERSION
            );
            return Ok(None);
        }

        let doc = Arc::new(doc);
        self.set_current(doc.clone());
        info!("Loaded documentation from {}", path.display());
        Ok(Some(doc))
    }

    /// Atomically replace the persisted artifact, then the current reference
    ///
    /// On failure neither the file on disk nor the current reference changes.
    pub fn save(&self, doc: GeneratedDocumentation) -> Result<Arc<GeneratedDocumentation>> {
        self.ensure_dir()?;

        let path = self.artifact_path();
        let tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, &doc)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&path)?;

        let doc = Arc::new(doc);
        self.set_current(doc.clone());
        info!("Saved documentation to {}", path.display());
        Ok(doc)
    }

    /// Fail if the output directory exists as something other than a directory
    pub fn check_dir(&self) -> Result<()> {
        match std::fs::metadata(&self.dir) {
            Ok(meta) if !meta.is_dir() => Err(Error::invalid_output(
                &self.dir,
                "exists and is not a directory",
            )),
            _ => Ok(()),
        }
    }

    fn ensure_dir(&self) -> Result<()> {
        self.check_dir()?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            Error::invalid_output(&self.dir, format!("cannot create directory: {}", e))
        })
    }
}
