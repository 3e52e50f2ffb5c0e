//! Output document assembly.
//!
//! Collects the per-stage class maps into the final ordered structure and
//! writes it as pretty-printed JSON.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::catalog::{PlayerClass, Stage};
use crate::parser::ClassMap;
use crate::record::ClassRecord;

/// One stage of the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub title: String,
    pub icon: String,
    pub color: String,
    /// Observed classes in canonical order.
    pub classes: Vec<ClassRecord>,
}

/// Errors raised while writing the output document.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The parent directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be serialized.
    #[error("failed to serialize output document: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing or renaming the document failed.
    #[error("failed to write output document {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Orders parsed stages into the output structure.
///
/// Stages absent from `stages` are omitted, as are classes never observed
/// within a stage. Ordering follows [`Stage::ALL`] and [`PlayerClass::ALL`]
/// regardless of map iteration order.
#[must_use]
pub fn assemble(mut stages: HashMap<Stage, ClassMap>) -> Vec<StageRecord> {
    Stage::ALL
        .into_iter()
        .filter_map(|stage| {
            let mut classes = stages.remove(&stage)?;
            let descriptor = stage.descriptor();
            Some(StageRecord {
                title: descriptor.title.to_string(),
                icon: descriptor.icon.to_string(),
                color: descriptor.color.to_string(),
                classes: PlayerClass::ALL
                    .into_iter()
                    .filter_map(|class| classes.remove(&class))
                    .collect(),
            })
        })
        .collect()
}

/// Serializes `stages` as 2-space indented JSON.
///
/// # Errors
///
/// Returns [`OutputError::Serialize`] if serialization fails.
pub fn render(stages: &[StageRecord]) -> Result<Vec<u8>, OutputError> {
    let mut body = serde_json::to_vec_pretty(stages)?;
    body.push(b'\n');
    Ok(body)
}

/// Writes the output document to `path`.
///
/// The document is written to a temporary sibling and renamed into place,
/// so readers never observe a half-written file. Missing parent
/// directories are created.
///
/// # Errors
///
/// Returns an [`OutputError`] if the directory cannot be created, the
/// document cannot be serialized, or the file cannot be written.
#[instrument(skip(stages), fields(path = %path.display(), stages = stages.len()))]
pub async fn write_document(path: &Path, stages: &[StageRecord]) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| OutputError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let body = render(stages)?;
    let staging = staging_path(path);
    debug!(staging = %staging.display(), bytes = body.len(), "writing output document");

    if let Err(source) = tokio::fs::write(&staging, &body).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(OutputError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    if let Err(source) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(OutputError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    info!(bytes = body.len(), "wrote output document");
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::record::ItemRecord;

    fn class_with_weapon(class: PlayerClass, name: &str) -> ClassRecord {
        let mut record = ClassRecord::new(class);
        record.items_mut(Category::Weapons).push(ItemRecord {
            name: name.to_string(),
            icon: format!("pre-boss/{}/weapons/{name}.png", class.id()),
            link: format!("/wiki/{name}"),
        });
        record
    }

    #[test]
    fn test_assemble_orders_stages_and_classes() {
        let mut late = ClassMap::new();
        late.insert(PlayerClass::Summoner, ClassRecord::new(PlayerClass::Summoner));
        late.insert(PlayerClass::Melee, class_with_weapon(PlayerClass::Melee, "Zenith"));

        let mut early = ClassMap::new();
        early.insert(PlayerClass::Ranged, ClassRecord::new(PlayerClass::Ranged));

        let mut stages = HashMap::new();
        stages.insert(Stage::Endgame, late);
        stages.insert(Stage::PreBoss, early);

        let assembled = assemble(stages);
        let titles: Vec<_> = assembled.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Pre-Boss", "Endgame"]);

        let classes: Vec<_> = assembled[1].classes.iter().map(|c| c.class).collect();
        assert_eq!(classes, [PlayerClass::Melee, PlayerClass::Summoner]);
    }

    #[test]
    fn test_assemble_keeps_stage_with_no_classes() {
        let mut stages = HashMap::new();
        stages.insert(Stage::PreGolem, ClassMap::new());

        let assembled = assemble(stages);
        assert_eq!(assembled.len(), 1);
        assert_eq!(assembled[0].title, "Pre-Golem");
        assert!(assembled[0].classes.is_empty());
    }

    #[test]
    fn test_render_uses_two_space_indent_and_field_names() {
        let mut classes = ClassMap::new();
        classes.insert(PlayerClass::Melee, class_with_weapon(PlayerClass::Melee, "Sword"));
        let mut stages = HashMap::new();
        stages.insert(Stage::PreBoss, classes);

        let text = String::from_utf8(render(&assemble(stages)).unwrap()).unwrap();
        assert!(text.starts_with("[\n  {\n    \"title\": \"Pre-Boss\""), "{text}");
        assert!(text.contains("\"class\": \"melee\""));
        assert!(text.contains("\"buffsPotionsAmmo\": []"));
        assert!(text.ends_with("]\n"));
    }

    #[tokio::test]
    async fn test_write_document_creates_parent_and_leaves_no_staging_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("public").join("vanilla.json");

        write_document(&path, &[]).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]\n");
        assert!(!staging_path(&path).exists());
    }

    #[tokio::test]
    async fn test_write_document_reports_unwritable_target() {
        let dir = tempfile::TempDir::new().unwrap();
        // A directory in place of the target makes the rename fail.
        let path = dir.path().join("vanilla.json");
        std::fs::create_dir(&path).unwrap();

        let result = write_document(&path, &[]).await;
        assert!(matches!(result, Err(OutputError::Write { .. })));
        assert!(!staging_path(&path).exists());
    }
}
