use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::builder::{self, RebuildSummary};
use crate::config::{Config, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_TOP_K};
use crate::database::Database;
use crate::error::{Error, Result};
use crate::extractor::{self, Extractor};
use crate::matcher::{self, MatchResult};
use crate::status::ProcessingStatus;

/// What the service exposes about its current database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseStatus {
    pub is_loaded: bool,
    pub celebrity_count: usize,
    pub celebrities: Vec<String>,
}

/// Query policy of a [`Lookalike`] service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    pub top_k: usize,
    pub max_upload_bytes: usize,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl From<&Config> for QueryPolicy {
    fn from(cfg: &Config) -> Self {
        Self {
            top_k: cfg.top_k,
            max_upload_bytes: cfg.max_upload_bytes,
        }
    }
}

/// The lookalike engine: one extractor, one database snapshot and the
/// status of the last rebuild.
///
/// Rebuilds write into a fresh [`Database`] and publish it by swapping the
/// snapshot pointer, so queries running during a rebuild keep seeing the
/// previous database. Rebuilds are serialised against each other.
pub struct Lookalike<E> {
    extractor: Mutex<E>,
    database: RwLock<Arc<Database>>,
    status: RwLock<ProcessingStatus>,
    rebuilding: Mutex<()>,
    policy: QueryPolicy,
}

impl<E: Extractor> Lookalike<E> {
    pub fn new(extractor: E, policy: QueryPolicy) -> Self {
        Self {
            extractor: Mutex::new(extractor),
            database: RwLock::new(Arc::new(Database::new())),
            status: RwLock::new(ProcessingStatus::default()),
            rebuilding: Mutex::new(()),
            policy,
        }
    }

    pub fn policy(&self) -> QueryPolicy {
        self.policy
    }

    /// Current database. The snapshot never changes; later rebuilds
    /// publish new ones.
    pub fn snapshot(&self) -> Arc<Database> {
        self.database.read().clone()
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status.read().clone()
    }

    pub fn database_status(&self) -> DatabaseStatus {
        let db = self.snapshot();
        DatabaseStatus {
            is_loaded: !db.is_empty(),
            celebrity_count: db.len(),
            celebrities: db.names(),
        }
    }

    /// Replace the database with one built from the identity directories
    /// under `root`.
    ///
    /// A missing or non-directory `root` fails before anything changes. If
    /// the walk itself fails, the records built up to that point are still
    /// published.
    pub fn rebuild(&self, root: &Path) -> Result<RebuildSummary> {
        builder::validate_root(root)?;
        let _guard = self.rebuilding.lock();

        info!("Rebuilding celebrity database from {}", root.display());
        self.set_status(ProcessingStatus::starting());

        let mut database = Database::new();
        let result = builder::populate(
            root,
            &mut database,
            |path| extractor::extract_file(&mut *self.extractor.lock(), path),
            |name| self.set_status(ProcessingStatus::processing(name)),
        );
        *self.database.write() = Arc::new(database);

        match result {
            Ok(summary) => {
                self.set_status(ProcessingStatus::complete(
                    summary.processed_count,
                    summary.skipped_count(),
                ));
                info!(
                    "Rebuild complete: {} processed, {} skipped",
                    summary.processed_count,
                    summary.skipped_count()
                );
                Ok(summary)
            }
            Err(e) => {
                self.set_status(ProcessingStatus::failed(&e));
                error!("Error processing directory {}: {e}", root.display());
                Err(e)
            }
        }
    }

    /// Rank the database against the first face in an uploaded image.
    pub fn recognize(&self, bytes: &[u8]) -> Result<Vec<MatchResult>> {
        if bytes.is_empty() {
            return Err(Error::InvalidInput("no photo uploaded".to_string()));
        }
        if bytes.len() > self.policy.max_upload_bytes {
            return Err(Error::InvalidInput(format!(
                "photo is {} bytes, the limit is {}",
                bytes.len(),
                self.policy.max_upload_bytes
            )));
        }

        let database = self.snapshot();
        if database.is_empty() {
            return Err(Error::EmptyDatabase);
        }

        let image = extractor::decode_upload(bytes)?;
        let query = self
            .extractor
            .lock()
            .extract(&image)
            .map_err(|e| Error::ExtractionFailure(format!("{e:#}")))?
            .ok_or(Error::NoFaceDetected)?;

        matcher::rank(&query, &database, self.policy.top_k)
    }

    /// [`Lookalike::recognize`] for a photo on disk, whose file name must
    /// carry an accepted image extension.
    pub fn recognize_file(&self, path: &Path) -> Result<Vec<MatchResult>> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        if file_name.is_empty() {
            return Err(Error::InvalidInput("no file selected".to_string()));
        }
        if !extractor::allowed_file(&file_name) {
            return Err(Error::UnsupportedFormat(format!("invalid file type: {file_name}")));
        }
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        self.recognize(&bytes)
    }

    /// Path of a database image, looked up by a trailing part of its path.
    pub fn celebrity_image(&self, relative: &Path) -> Option<PathBuf> {
        self.snapshot().image_for(relative).map(Path::to_path_buf)
    }

    fn set_status(&self, status: ProcessingStatus) {
        *self.status.write() = status;
    }
}
