//! Dry-run preview and end-of-run summary.

use stagepack_core::PipelineSummary;
use stagepack_core::pipeline::{ParsePhase, PipelineConfig};
use tracing::{debug, info, warn};

/// Prints what a run would download, without touching the network.
pub(crate) fn print_dry_run(config: &PipelineConfig, phase: &ParsePhase) {
    let stats = phase.stats();
    info!(
        stages = phase.documents.len(),
        missing = phase.missing.len(),
        queued = phase.queue.len(),
        duplicates = phase.queue.duplicates(),
        skipped = stats.skipped(),
        "Parsed stage documents (dry run)"
    );

    println!(
        "Dry run preview: {} stage(s) parsed, {} missing, {} asset(s) queued, {} duplicate reference(s).",
        phase.documents.len(),
        phase.missing.len(),
        phase.queue.len(),
        phase.queue.duplicates()
    );
    println!("Assets directory: {}", phase.queue.assets_dir().display());

    for document in &phase.documents {
        println!(
            "- [stage] {}: {} class(es), {} item(s), {} skipped line(s)",
            document.stage,
            document.classes.len(),
            document.stats.items,
            document.stats.skipped()
        );
    }
    for stage in &phase.missing {
        println!(
            "- [missing] {} ({})",
            stage,
            config.document_path(*stage).display()
        );
    }
    for task in phase.queue.tasks() {
        let state = if task.destination.exists() {
            "cached"
        } else {
            "fetch"
        };
        println!("- [{state}] {} <- {}", task.relative_path, task.remote_ref);
    }

    println!("Dry run - no files downloaded, no output written");
}

/// Logs the final summary of a completed run.
pub(crate) fn log_summary(summary: &PipelineSummary) {
    for (index, stage) in summary.stages.iter().enumerate() {
        info!(
            stage = %stage.stage,
            items = stage.items,
            "{}. {} - {} classes",
            index + 1,
            stage.stage.descriptor().title,
            stage.classes
        );
    }

    if !summary.missing.is_empty() {
        let missing: Vec<_> = summary.missing.iter().map(|s| s.id()).collect();
        warn!(stages = %missing.join(", "), "Stages omitted (document missing)");
    }

    for failure in &summary.report.failures {
        debug!(
            name = %failure.name,
            remote = %failure.remote_ref,
            error = %failure.error,
            "Failed asset"
        );
    }

    info!(
        stages = summary.stages_processed(),
        successful = summary.report.successful(),
        queued = summary.queued,
        downloaded = summary.report.downloaded,
        cached = summary.report.cached,
        failed = summary.report.failed,
        redirects = summary.report.redirects,
        duplicates = summary.duplicates,
        skipped_lines = summary.parse_stats.skipped(),
        output = %summary.output_path.display(),
        "Conversion complete"
    );
}
