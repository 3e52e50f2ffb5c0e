//! Queue entry types.

use std::fmt;
use std::path::PathBuf;

use crate::catalog::{Category, PlayerClass, Stage};

/// Composite identity used to deduplicate asset downloads.
///
/// Never persisted; two references with equal keys always resolve to the
/// same relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    pub stage: Stage,
    pub class: PlayerClass,
    pub category: Category,
    /// Image reference exactly as written in the guide.
    pub remote_ref: String,
}

impl AssetKey {
    /// Creates a key from its parts.
    #[must_use]
    pub fn new(
        stage: Stage,
        class: PlayerClass,
        category: Category,
        remote_ref: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            class,
            category,
            remote_ref: remote_ref.into(),
        }
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.stage, self.class, self.category, self.remote_ref
        )
    }
}

/// One asset to fetch and persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Remote image reference, resolved against the origin at download time.
    pub remote_ref: String,
    /// Path relative to the assets directory, `/`-separated.
    pub relative_path: String,
    /// Absolute (or assets-dir rooted) destination on disk.
    pub destination: PathBuf,
    /// File name shown in logs.
    pub name: String,
}
