//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use stagepack_core::Schedule;
use stagepack_core::download::{
    DEFAULT_BASE_URL, DEFAULT_BATCH_DELAY, DEFAULT_CONCURRENCY, DEFAULT_MAX_REDIRECTS,
    DEFAULT_REQUEST_TIMEOUT,
};
use stagepack_core::pipeline::{
    DEFAULT_ASSETS_DIR, DEFAULT_DOCUMENT_PREFIX, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_PATH,
};

/// Convert per-stage progression guides into a single JSON document.
///
/// Stagepack reads one markdown guide per progression stage, extracts the
/// recommended items per class, downloads every item icon into a local
/// asset cache and writes the combined document.
#[derive(Parser, Debug)]
#[command(name = "stagepack")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory containing the stage documents
    #[arg(short = 'i', long, value_name = "DIR", default_value = DEFAULT_INPUT_DIR)]
    pub input_dir: PathBuf,

    /// Path of the JSON document to write
    #[arg(short = 'o', long, value_name = "FILE", default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Directory the asset cache lives in
    #[arg(short = 'a', long, value_name = "DIR", default_value = DEFAULT_ASSETS_DIR)]
    pub assets_dir: PathBuf,

    /// File name prefix of the stage documents
    #[arg(long = "prefix", value_name = "PREFIX", default_value = DEFAULT_DOCUMENT_PREFIX)]
    pub document_prefix: String,

    /// Origin that relative image references are resolved against
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Pause between download groups in milliseconds (0 to disable, max 60000)
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_BATCH_DELAY.as_millis() as u64, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub batch_delay: u64,

    /// Per-request timeout in seconds (1-600)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout: u64,

    /// Maximum redirects followed per asset (0-20)
    #[arg(long, default_value_t = DEFAULT_MAX_REDIRECTS, value_parser = clap::value_parser!(u32).range(0..=20))]
    pub max_redirects: u32,

    /// Download scheduling: `batched` groups with pauses, or a rolling `pool`
    #[arg(long, default_value_t = Schedule::Batched, value_parser = parse_schedule)]
    pub schedule: Schedule,

    /// User-Agent header sent with asset requests
    #[arg(long, value_name = "AGENT")]
    pub user_agent: Option<String>,

    /// Config file to load instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Parse the documents and print the download plan without fetching
    /// anything or writing output
    #[arg(long)]
    pub dry_run: bool,

    /// Disable the progress spinner
    #[arg(long)]
    pub no_progress: bool,
}

fn parse_schedule(value: &str) -> Result<Schedule, String> {
    value.parse()
}
