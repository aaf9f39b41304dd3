// Regeneration pipeline: scan, extract, resolve, generate, persist

use crate::analysis::Analyzer;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{DocumentationGenerator, DocumentationStore, GeneratedDocumentation, ProgressSink};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// Events broadcast around each regeneration
#[derive(Debug, Clone, PartialEq)]
pub enum DocEvent {
    Started {
        root: PathBuf,
    },
    Completed {
        generated_at: DateTime<Utc>,
        fingerprint: String,
        path: PathBuf,
    },
    Failed {
        message: String,
    },
}

/// Progress sink shared with the blocking worker
pub type SharedProgress = Arc<dyn ProgressSink + Send + Sync>;

const EVENT_CAPACITY: usize = 16;

/// Owns one project's documentation and serializes its regenerations
pub struct DocService {
    root: PathBuf,
    config: Config,
    store: Arc<DocumentationStore>,
    /// Held until the blocking worker finishes, even if the caller's future
    /// is dropped first; at most one regeneration in flight
    gate: Arc<Mutex<()>>,
    events: broadcast::Sender<DocEvent>,
    progress: Option<SharedProgress>,
}

impl DocService {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        let store = Arc::new(DocumentationStore::new(config.output.directory.clone()));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            root: root.into(),
            config,
            store,
            gate: Arc::new(Mutex::new(())),
            events,
            progress: None,
        }
    }

    /// Report generation phases to `progress`
    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &DocumentationStore {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DocEvent> {
        self.events.subscribe()
    }

    /// The document from the last load or regeneration in this process
    pub fn current(&self) -> Option<Arc<GeneratedDocumentation>> {
        self.store.current()
    }

    /// Run a full regeneration, waiting behind one already in flight
    pub async fn regenerate(&self) -> Result<Arc<GeneratedDocumentation>> {
        let guard = self.gate.clone().lock_owned().await;
        self.run(guard).await
    }

    /// Run a full regeneration, or fail fast if one is already in flight
    pub async fn try_regenerate(&self) -> Result<Arc<GeneratedDocumentation>> {
        let guard = self
            .gate
            .clone()
            .try_lock_owned()
            .map_err(|_| Error::RegenerationInProgress)?;
        self.run(guard).await
    }

    /// The persisted document if there is a usable one, else a fresh regeneration
    pub async fn load_or_generate(&self) -> Result<Arc<GeneratedDocumentation>> {
        let store = self.store.clone();
        if let Some(doc) = tokio::task::spawn_blocking(move || store.load()).await?? {
            return Ok(doc);
        }
        self.regenerate().await
    }

    /// Regenerate only when the sources changed since the current document
    pub async fn refresh(&self) -> Result<Arc<GeneratedDocumentation>> {
        let Some(current) = self.current() else {
            return self.load_or_generate().await;
        };

        let root = self.root.clone();
        let config = self.config.clone();
        let fingerprint = tokio::task::spawn_blocking(move || {
            Analyzer::new(config)?.fingerprint(&root)
        })
        .await??;

        if fingerprint == current.source_fingerprint {
            debug!("Sources unchanged; keeping current documentation");
            return Ok(current);
        }
        self.regenerate().await
    }

    async fn run(&self, guard: OwnedMutexGuard<()>) -> Result<Arc<GeneratedDocumentation>> {
        self.notify(DocEvent::Started {
            root: self.root.clone(),
        });

        let root = self.root.clone();
        let config = self.config.clone();
        let store = self.store.clone();
        let progress = self.progress.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            match progress {
                Some(sink) => run_pipeline(&root, &config, &store, sink.as_ref()),
                None => run_pipeline(&root, &config, &store, &crate::output::NoProgress),
            }
        })
        .await
        .map_err(Error::from)
        .and_then(|result| result);

        match &outcome {
            Ok(doc) => self.notify(DocEvent::Completed {
                generated_at: doc.generated_at,
                fingerprint: doc.source_fingerprint.clone(),
                path: self.store.artifact_path(),
            }),
            Err(e) => {
                warn!("Regeneration failed: {}", e);
                self.notify(DocEvent::Failed {
                    message: e.to_string(),
                });
            }
        }

        outcome
    }

    fn notify(&self, event: DocEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// One synchronous regeneration, start to finish
///
/// Configuration is checked before any file is read, and the artifact is
/// only touched by the final save.
pub fn run_pipeline(
    root: &Path,
    config: &Config,
    store: &DocumentationStore,
    progress: &dyn ProgressSink,
) -> Result<Arc<GeneratedDocumentation>> {
    config.validate()?;
    store.check_dir()?;

    progress.report("Scanning source files");
    let analysis = Analyzer::new(config.clone())?.analyze(root)?;

    let generator = DocumentationGenerator::new(config)?;
    let doc = generator.generate_with_progress(&analysis, progress)?;

    progress.report("Saving documentation");
    let doc = store.save(doc)?;
    info!(
        "Regenerated documentation for {} ({} files)",
        analysis.project_name,
        analysis.files.len()
    );
    Ok(doc)
}
