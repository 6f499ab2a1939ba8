//! Walks a library root and turns each identity directory into a
//! [`CelebrityRecord`].
//!
//! Each immediate subdirectory of the root is one identity, named after the
//! directory. Identities are visited in name order. Per-identity problems
//! (no representative image, no face, unreadable image) are counted as
//! skips; only failing to list the root aborts the walk.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::database::{CelebrityRecord, Database};
use crate::error::{Error, Result};
use crate::extractor::Extraction;
use crate::locator;

/// Why an identity was left out of the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoImage,
    NoFace,
    ExtractionFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    pub processed_count: usize,
    pub skipped: Vec<Skipped>,
    pub total_celebrities: usize,
}

impl RebuildSummary {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Fail unless `root` is an existing directory.
pub fn validate_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(Error::InvalidInput(format!(
            "directory does not exist: {}",
            root.display()
        )));
    }
    if !root.is_dir() {
        return Err(Error::InvalidInput(format!(
            "path is not a directory: {}",
            root.display()
        )));
    }
    Ok(())
}

/// Identity directories directly under `root`, sorted by name. Entries that
/// are not directories are ignored.
pub fn identity_dirs(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root).map_err(|e| Error::io(root, e))? {
        let entry = entry.map_err(|e| Error::io(root, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        dirs.push((entry.file_name().to_string_lossy().into_owned(), path));
    }
    dirs.sort();
    Ok(dirs)
}

/// Fill `database` from the identities under `root`.
///
/// `extract` is called once per located image; `progress` is told the name
/// of each identity before it is processed. On error, records inserted so
/// far stay in `database`.
pub fn populate(
    root: &Path,
    database: &mut Database,
    mut extract: impl FnMut(&Path) -> Extraction,
    mut progress: impl FnMut(&str),
) -> Result<RebuildSummary> {
    let mut summary = RebuildSummary::default();

    for (name, dir) in identity_dirs(root)? {
        progress(&name);

        let reason = match locator::locate(&dir) {
            None => SkipReason::NoImage,
            Some(image_path) => match extract(&image_path) {
                Extraction::Face(embedding) => {
                    database.insert(CelebrityRecord {
                        name: name.clone(),
                        embedding,
                        image_path,
                    })?;
                    summary.processed_count += 1;
                    info!("Successfully processed {name}");
                    continue;
                }
                Extraction::NoFace => SkipReason::NoFace,
                Extraction::Failed(e) => SkipReason::ExtractionFailed(e),
            },
        };

        match &reason {
            SkipReason::NoImage => warn!("No image found for {name}"),
            SkipReason::NoFace => warn!("No face found in the image for {name}"),
            SkipReason::ExtractionFailed(e) => {
                warn!("Failed to extract face embedding for {name}: {e}")
            }
        }
        summary.skipped.push(Skipped { name, reason });
    }

    summary.total_celebrities = database.len();
    Ok(summary)
}
