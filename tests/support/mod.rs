//! Shared helpers for integration tests.
#![allow(dead_code)]

pub mod socket_guard;

use std::path::Path;

use stagepack_core::Stage;
use stagepack_core::pipeline::PipelineConfig;

/// Minimal PNG signature used as asset content.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nstagepack";

/// Builds an item-reference line the way the guide export writes them.
pub fn item_line(name: &str, image: &str) -> String {
    format!(r#"[![{name}]({image})](/wiki/{name} "{name}")[{name}](/wiki/{name} "{name}")"#)
}

/// Writes the document for `stage` under `config.input_dir`.
pub fn write_stage_document(config: &PipelineConfig, stage: Stage, lines: &[String]) {
    std::fs::create_dir_all(&config.input_dir).unwrap_or_else(|e| panic!("create input dir: {e}"));
    std::fs::write(config.document_path(stage), lines.join("\n"))
        .unwrap_or_else(|e| panic!("write {stage} document: {e}"));
}

/// Pipeline config rooted in a temp directory.
pub fn temp_pipeline_config(root: &Path) -> PipelineConfig {
    PipelineConfig {
        input_dir: root.join("convert"),
        output_path: root.join("public").join("vanilla.json"),
        assets_dir: root.join("public").join("vanilla-assets"),
        ..PipelineConfig::default()
    }
}

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = $crate::support::socket_guard::start_mock_server_or_skip().await else {
            return $crate::support::socket_guard::socket_skip_return();
        };
        mock_server
    }};
}

pub(crate) use require_mock_server;
