//! CLI entry point for stagepack.

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use stagepack_core::pipeline::{download_and_assemble, parse_stages};
use stagepack_core::{DownloadEngine, DownloadStats, HttpClient};
use tracing::{debug, info};

mod app;
mod cli;

use app::config_file::load_config;
use app::config_runtime::{
    RunSettings, apply_config_defaults, parse_cli_with_sources, resolve_default_log_level,
};
use app::progress_manager::spawn_progress_ui;
use app::report::{log_summary, print_dry_run};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let (args, cli_sources) = parse_cli_with_sources();

    let loaded_config = load_config(args.config.as_deref())?;
    let args = apply_config_defaults(args, &cli_sources, loaded_config.config.as_ref())?;

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(resolve_default_log_level(&args)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments resolved");
    if let Some(path) = &loaded_config.path {
        debug!(
            path = %path.display(),
            loaded = loaded_config.loaded_from_file(),
            verbosity = loaded_config
                .config
                .as_ref()
                .and_then(|c| c.verbosity)
                .map(|v| v.as_str()),
            "Config file"
        );
    }
    info!("Stagepack starting");

    let settings = RunSettings::from_args(&args);
    let engine = DownloadEngine::new(settings.concurrency, settings.batch_delay, settings.schedule)?;
    let client = HttpClient::with_settings(settings.client.clone())?;
    debug!(
        base_url = %client.base_url(),
        timeout_secs = client.request_timeout().as_secs(),
        max_redirects = client.max_redirects(),
        concurrency = engine.concurrency(),
        batch_delay_ms = engine.batch_delay().as_millis(),
        schedule = %engine.schedule(),
        "Download settings"
    );

    let phase = parse_stages(&settings.pipeline);

    if args.dry_run {
        print_dry_run(&settings.pipeline, &phase);
        return Ok(());
    }

    let stats = Arc::new(DownloadStats::new());
    let use_spinner = !args.no_progress
        && !args.quiet
        && !phase.queue.is_empty()
        && io::stderr().is_terminal();
    let (progress_handle, stop) =
        spawn_progress_ui(use_spinner, Arc::clone(&stats), phase.queue.len());

    let result = download_and_assemble(&settings.pipeline, phase, &engine, &client, stats).await;

    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = progress_handle {
        let _ = handle.await;
    }

    let summary = result.with_context(|| {
        format!(
            "Failed to write output document '{}'",
            settings.pipeline.output_path.display()
        )
    })?;
    log_summary(&summary);

    Ok(())
}
