//! End-to-end conversion run.
//!
//! The run has two strictly sequential phases. [`parse_stages`] reads every
//! stage document and fills the [`AssetQueue`]; [`download_and_assemble`]
//! then drains the queue and writes the output document. [`run`] chains
//! the two.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::catalog::Stage;
use crate::download::{DownloadEngine, DownloadReport, DownloadStats, HttpClient};
use crate::output::{OutputError, assemble, write_document};
use crate::parser::{ClassMap, ParseStats, ParsedDocument, parse_document};
use crate::queue::AssetQueue;

/// Default directory holding the stage documents.
pub const DEFAULT_INPUT_DIR: &str = "convert";
/// Default output document path.
pub const DEFAULT_OUTPUT_PATH: &str = "public/vanilla.json";
/// Default asset cache directory.
pub const DEFAULT_ASSETS_DIR: &str = "public/vanilla-assets";
/// Default stage document name prefix.
pub const DEFAULT_DOCUMENT_PREFIX: &str = "vanilla-";

/// Where documents are read from and results written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_path: PathBuf,
    pub assets_dir: PathBuf,
    /// Prepended to the stage id to form the document file name.
    pub document_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            document_prefix: DEFAULT_DOCUMENT_PREFIX.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Path of the document for `stage`, e.g. `convert/vanilla-pre-boss.md`.
    #[must_use]
    pub fn document_path(&self, stage: Stage) -> PathBuf {
        self.input_dir
            .join(format!("{}{}.md", self.document_prefix, stage.id()))
    }
}

/// Result of the parse phase.
#[derive(Debug, Clone)]
pub struct ParsePhase {
    /// Parsed documents in canonical stage order.
    pub documents: Vec<ParsedDocument>,
    /// Stages whose document was missing or unreadable.
    pub missing: Vec<Stage>,
    /// Deduplicated download queue.
    pub queue: AssetQueue,
}

impl ParsePhase {
    /// Line diagnostics summed over all documents.
    #[must_use]
    pub fn stats(&self) -> ParseStats {
        let mut total = ParseStats::default();
        for document in &self.documents {
            total.merge(&document.stats);
        }
        total
    }
}

/// Per-stage counts reported after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: Stage,
    pub classes: usize,
    pub items: usize,
}

/// Everything the caller needs to report on a finished run.
#[derive(Debug)]
pub struct PipelineSummary {
    pub stages: Vec<StageSummary>,
    pub missing: Vec<Stage>,
    /// Download tasks queued.
    pub queued: usize,
    /// Image references that resolved to an already queued asset.
    pub duplicates: usize,
    pub parse_stats: ParseStats,
    pub report: DownloadReport,
    pub output_path: PathBuf,
}

impl PipelineSummary {
    /// Number of stages written to the output.
    #[must_use]
    pub fn stages_processed(&self) -> usize {
        self.stages.len()
    }
}

/// Reads and parses every stage document in canonical order.
///
/// A missing or unreadable document is logged and its stage omitted;
/// this never fails.
#[instrument(skip(config), fields(input_dir = %config.input_dir.display()))]
pub fn parse_stages(config: &PipelineConfig) -> ParsePhase {
    let mut queue = AssetQueue::new(config.assets_dir.clone());
    let mut documents = Vec::new();
    let mut missing = Vec::new();

    for stage in Stage::ALL {
        let path = config.document_path(stage);
        match read_stage_document(&path) {
            Ok(content) => documents.push(parse_document(stage, &content, &mut queue)),
            Err(error) => {
                warn!(
                    stage = %stage,
                    path = %path.display(),
                    error = %error,
                    "stage document unavailable, skipping stage"
                );
                missing.push(stage);
            }
        }
    }

    info!(
        stages = documents.len(),
        missing = missing.len(),
        queued = queue.len(),
        duplicates = queue.duplicates(),
        "parsed stage documents"
    );

    ParsePhase {
        documents,
        missing,
        queue,
    }
}

/// Reads a stage document fully. Invalid UTF-8 is reported as an error.
///
/// # Errors
///
/// Returns the underlying I/O error.
pub fn read_stage_document(path: &Path) -> std::io::Result<String> {
    std::fs::read_to_string(path)
}

/// Downloads the queued assets, then writes the output document.
///
/// Asset failures are reported in the summary and never fail the run.
///
/// # Errors
///
/// Returns an [`OutputError`] if the output document cannot be written.
#[instrument(skip_all, fields(queued = phase.queue.len()))]
pub async fn download_and_assemble(
    config: &PipelineConfig,
    phase: ParsePhase,
    engine: &DownloadEngine,
    client: &HttpClient,
    stats: Arc<DownloadStats>,
) -> Result<PipelineSummary, OutputError> {
    let parse_stats = phase.stats();
    let report = engine
        .run_with_stats(phase.queue.tasks(), client, stats)
        .await;

    let stages = phase
        .documents
        .iter()
        .map(|document| StageSummary {
            stage: document.stage,
            classes: document.classes.len(),
            items: document.stats.items,
        })
        .collect();

    let by_stage: HashMap<Stage, ClassMap> = phase
        .documents
        .into_iter()
        .map(|document| (document.stage, document.classes))
        .collect();
    write_document(&config.output_path, &assemble(by_stage)).await?;

    Ok(PipelineSummary {
        stages,
        missing: phase.missing,
        queued: phase.queue.len(),
        duplicates: phase.queue.duplicates(),
        parse_stats,
        report,
        output_path: config.output_path.clone(),
    })
}

/// Runs both phases.
///
/// # Errors
///
/// Returns an [`OutputError`] if the output document cannot be written.
pub async fn run(
    config: &PipelineConfig,
    engine: &DownloadEngine,
    client: &HttpClient,
) -> Result<PipelineSummary, OutputError> {
    let phase = parse_stages(config);
    download_and_assemble(config, phase, engine, client, Arc::new(DownloadStats::new())).await
}
