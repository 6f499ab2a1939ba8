use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::Embedding;

/// One identity of the reference set.
#[derive(Debug, Clone, PartialEq)]
pub struct CelebrityRecord {
    pub name: String,
    pub embedding: Embedding,
    pub image_path: PathBuf,
}

/// Identity name → record. All embeddings share one dimension, fixed by the
/// first record inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Database {
    records: BTreeMap<String, CelebrityRecord>,
    dim: Option<usize>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `record.name`. The last write for a
    /// name wins.
    pub fn insert(&mut self, record: CelebrityRecord) -> Result<()> {
        let found = record.embedding.dim();
        match self.dim {
            Some(expected) if expected != found => {
                return Err(Error::DimensionMismatch { expected, found });
            }
            _ => self.dim = Some(found),
        }
        self.records.insert(record.name.clone(), record);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CelebrityRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Embedding dimension, `None` while empty.
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    /// Records in identity-name order.
    pub fn records(&self) -> impl Iterator<Item = &CelebrityRecord> {
        self.records.values()
    }

    /// Identity names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    /// Source image of the first record whose stored path ends with
    /// `relative` (whole components only). Only images that belong to the
    /// database can be returned this way.
    pub fn image_for(&self, relative: &Path) -> Option<&Path> {
        if relative.as_os_str().is_empty() {
            return None;
        }
        self.records()
            .map(|r| r.image_path.as_path())
            .find(|path| path.ends_with(relative))
    }
}
