//! Picks the one representative photo of an identity directory.
//!
//! Search order:
//! 1. `folder.jpg` directly inside the identity directory.
//! 2. The first file whose name ends with `-poster.jpg` anywhere below it.
//!    The walk is depth-first; inside each directory its files are visited
//!    before its subdirectories and both are taken in file-name order, so
//!    the result does not depend on the platform's directory listing order.
//!    Symlinks to files are candidates; symlinked directories are not
//!    descended into.
//!
//! Unreadable entries are skipped. Nothing here writes to disk.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use log::{info, warn};
use walkdir::{DirEntry, WalkDir};

pub const FOLDER_IMAGE: &str = "folder.jpg";
pub const POSTER_SUFFIX: &str = "-poster.jpg";

pub fn locate(identity_dir: &Path) -> Option<PathBuf> {
    let name = identity_name(identity_dir);

    let folder = identity_dir.join(FOLDER_IMAGE);
    if folder.is_file() {
        info!("Found {FOLDER_IMAGE} for {name}");
        return Some(folder);
    }

    let poster = WalkDir::new(identity_dir)
        .min_depth(1)
        .sort_by(files_first)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {e}", identity_dir.display());
                None
            }
        })
        .find(|entry| {
            is_file(entry) && entry.file_name().to_string_lossy().ends_with(POSTER_SUFFIX)
        });

    match poster {
        Some(entry) => {
            info!("Found poster file {} for {name}", entry.file_name().to_string_lossy());
            Some(entry.into_path())
        }
        None => {
            warn!("No suitable image found for {name}");
            None
        }
    }
}

// Symlinked files count, symlinked directories are not descended into.
fn is_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn identity_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}
