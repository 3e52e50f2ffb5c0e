//! Deduplicating asset queue.
//!
//! [`AssetQueue`] is both the key registry and the queue builder: every image
//! reference found by the parser goes through [`AssetQueue::resolve`], which
//! returns the local relative path and enqueues a [`DownloadTask`] the first
//! time a key is seen.
//!
//! # Example
//!
//! ```
//! use stagepack_core::catalog::{Category, PlayerClass, Stage};
//! use stagepack_core::queue::AssetQueue;
//!
//! let mut queue = AssetQueue::new("public/vanilla-assets");
//! let first = queue.resolve(Stage::PreBoss, PlayerClass::Melee, Category::Weapons, "/images/a/Sword.png?hash=1");
//! let again = queue.resolve(Stage::PreBoss, PlayerClass::Melee, Category::Weapons, "/images/a/Sword.png?hash=1");
//! assert_eq!(first, "pre-boss/melee/weapons/Sword.png");
//! assert_eq!(first, again);
//! assert_eq!(queue.len(), 1);
//! ```

mod item;

pub use item::{AssetKey, DownloadTask};

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::catalog::{Category, PlayerClass, Stage};

/// File name used when a reference has no usable final segment.
const FALLBACK_FILE_NAME: &str = "asset";

/// Registry of seen asset keys plus the ordered list of pending downloads.
#[derive(Debug, Clone)]
pub struct AssetQueue {
    assets_dir: PathBuf,
    registry: HashMap<AssetKey, String>,
    claimed_paths: HashSet<String>,
    tasks: Vec<DownloadTask>,
    duplicates: usize,
}

impl AssetQueue {
    /// Creates an empty queue whose destinations live under `assets_dir`.
    #[must_use]
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            registry: HashMap::new(),
            claimed_paths: HashSet::new(),
            tasks: Vec::new(),
            duplicates: 0,
        }
    }

    /// Returns the local relative path for an image reference, queueing a
    /// download the first time the `(stage, class, category, remote_ref)`
    /// key is seen.
    ///
    /// The path is `stage/class/category/<file>` where `<file>` is the last
    /// segment of `remote_ref` without its query string. If a different key
    /// already claimed that path, a numeric suffix is added so destinations
    /// never collide.
    pub fn resolve(
        &mut self,
        stage: Stage,
        class: PlayerClass,
        category: Category,
        remote_ref: &str,
    ) -> String {
        let key = AssetKey::new(stage, class, category, remote_ref);
        if let Some(existing) = self.registry.get(&key) {
            self.duplicates += 1;
            trace!(key = %key, path = %existing, "asset already queued");
            return existing.clone();
        }

        let file_name = self.unclaimed_file_name(stage, class, category, remote_ref);
        let relative_path = join_relative(stage, class, category, &file_name);
        let destination = self
            .assets_dir
            .join(stage.id())
            .join(class.id())
            .join(category.id())
            .join(&file_name);

        debug!(key = %key, path = %relative_path, "queued asset");

        self.claimed_paths.insert(relative_path.clone());
        self.registry.insert(key, relative_path.clone());
        self.tasks.push(DownloadTask {
            remote_ref: remote_ref.to_string(),
            relative_path: relative_path.clone(),
            destination,
            name: file_name,
        });

        relative_path
    }

    fn unclaimed_file_name(
        &self,
        stage: Stage,
        class: PlayerClass,
        category: Category,
        remote_ref: &str,
    ) -> String {
        let base = asset_file_name(remote_ref);
        if !self
            .claimed_paths
            .contains(&join_relative(stage, class, category, &base))
        {
            return base;
        }

        let (stem, extension) = split_extension(&base);
        let mut suffix = 2usize;
        loop {
            let candidate = format!("{stem}_{suffix}{extension}");
            if !self
                .claimed_paths
                .contains(&join_relative(stage, class, category, &candidate))
            {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Directory that task destinations are rooted at.
    #[must_use]
    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Queued tasks in first-seen order.
    #[must_use]
    pub fn tasks(&self) -> &[DownloadTask] {
        &self.tasks
    }

    /// Number of distinct assets queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true when nothing has been queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of references that resolved to an already queued asset.
    #[must_use]
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Looks up the path previously assigned to `key`.
    #[must_use]
    pub fn lookup(&self, key: &AssetKey) -> Option<&str> {
        self.registry.get(key).map(String::as_str)
    }
}

/// Extracts the file name from a remote image reference.
///
/// Takes the last `/` segment and drops any query string or fragment.
/// Segments that cannot name a file fall back to `asset`.
#[must_use]
pub fn asset_file_name(remote_ref: &str) -> String {
    let last = remote_ref.rsplit('/').next().unwrap_or(remote_ref);
    let name = last
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .replace('\\', "_");

    if name.is_empty() || name == "." || name == ".." {
        FALLBACK_FILE_NAME.to_string()
    } else {
        name
    }
}

fn join_relative(stage: Stage, class: PlayerClass, category: Category, file_name: &str) -> String {
    format!("{stage}/{class}/{category}/{file_name}")
}

fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(index) if index > 0 => file_name.split_at(index),
        _ => (file_name, ""),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn queue() -> AssetQueue {
        AssetQueue::new("/tmp/assets")
    }

    #[test]
    fn test_resolve_builds_stage_class_category_path() {
        let mut queue = queue();
        let path = queue.resolve(
            Stage::PreBoss,
            PlayerClass::Melee,
            Category::Weapons,
            "/images/a/Sword.png?hash=1",
        );

        assert_eq!(path, "pre-boss/melee/weapons/Sword.png");
        let task = &queue.tasks()[0];
        assert_eq!(task.remote_ref, "/images/a/Sword.png?hash=1");
        assert_eq!(task.name, "Sword.png");
        assert_eq!(
            task.destination,
            PathBuf::from("/tmp/assets/pre-boss/melee/weapons/Sword.png")
        );
    }

    #[test]
    fn test_resolve_same_key_is_idempotent() {
        let mut queue = queue();
        let first = queue.resolve(
            Stage::PreBoss,
            PlayerClass::Melee,
            Category::Weapons,
            "/images/a/Sword.png?hash=1",
        );
        let second = queue.resolve(
            Stage::PreBoss,
            PlayerClass::Melee,
            Category::Weapons,
            "/images/a/Sword.png?hash=1",
        );

        assert_eq!(first, second);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.duplicates(), 1);
    }

    #[test]
    fn test_resolve_same_ref_in_other_category_queues_again() {
        let mut queue = queue();
        let weapons = queue.resolve(
            Stage::PreBoss,
            PlayerClass::Melee,
            Category::Weapons,
            "/images/Bee.png",
        );
        let buffs = queue.resolve(
            Stage::PreBoss,
            PlayerClass::Melee,
            Category::BuffsPotionsAmmo,
            "/images/Bee.png",
        );
        let other_class = queue.resolve(
            Stage::PreBoss,
            PlayerClass::Magic,
            Category::Weapons,
            "/images/Bee.png",
        );

        assert_eq!(weapons, "pre-boss/melee/weapons/Bee.png");
        assert_eq!(buffs, "pre-boss/melee/buffsPotionsAmmo/Bee.png");
        assert_eq!(other_class, "pre-boss/magic/weapons/Bee.png");
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.duplicates(), 0);
    }

    #[test]
    fn test_resolve_colliding_basename_gets_suffix() {
        let mut queue = queue();
        let first = queue.resolve(
            Stage::PreGolem,
            PlayerClass::Ranged,
            Category::Armor,
            "/images/1/Helmet.png?v=1",
        );
        let second = queue.resolve(
            Stage::PreGolem,
            PlayerClass::Ranged,
            Category::Armor,
            "/images/2/Helmet.png?v=2",
        );
        let third = queue.resolve(
            Stage::PreGolem,
            PlayerClass::Ranged,
            Category::Armor,
            "/images/3/Helmet.png",
        );

        assert_eq!(first, "pre-golem/ranged/armor/Helmet.png");
        assert_eq!(second, "pre-golem/ranged/armor/Helmet_2.png");
        assert_eq!(third, "pre-golem/ranged/armor/Helmet_3.png");

        let destinations: HashSet<_> = queue.tasks().iter().map(|t| &t.destination).collect();
        assert_eq!(destinations.len(), 3);
    }

    #[test]
    fn test_lookup_returns_registered_path() {
        let mut queue = queue();
        queue.resolve(
            Stage::Endgame,
            PlayerClass::Mixed,
            Category::Accessories,
            "/images/Wings.gif",
        );
        let key = AssetKey::new(
            Stage::Endgame,
            PlayerClass::Mixed,
            Category::Accessories,
            "/images/Wings.gif",
        );
        assert_eq!(
            queue.lookup(&key),
            Some("endgame/mixed/accessories/Wings.gif")
        );
    }

    #[test]
    fn test_asset_file_name_variants() {
        assert_eq!(asset_file_name("/images/a/Sword.png?hash=1"), "Sword.png");
        assert_eq!(
            asset_file_name("/images/thumb/Sword.png/30px-Sword.png"),
            "30px-Sword.png"
        );
        assert_eq!(asset_file_name("Sword.png"), "Sword.png");
        assert_eq!(asset_file_name("/images/Sword.png#frag"), "Sword.png");
        assert_eq!(asset_file_name("/images/"), "asset");
        assert_eq!(asset_file_name("/images/.."), "asset");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("Sword.png"), ("Sword", ".png"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
        assert_eq!(split_extension("plain"), ("plain", ""));
    }
}
