//! Asset download layer.
//!
//! [`HttpClient`] fetches a single asset, following redirects and enforcing
//! the request timeout. [`DownloadEngine`] drains the queue through it with
//! bounded concurrency, skipping assets already on disk.
//!
//! # Example
//!
//! ```no_run
//! use stagepack_core::download::{ClientSettings, HttpClient};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::with_settings(ClientSettings::default())?;
//! let outcome = client
//!     .download_to_file("/images/a/Zenith.png", Path::new("./assets/Zenith.png"))
//!     .await?;
//! println!("Saved {} bytes from {}", outcome.bytes, outcome.final_url);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod engine;
mod error;

pub use client::{ClientSettings, FetchOutcome, HttpClient, partial_path};
pub use constants::{
    DEFAULT_BASE_URL, DEFAULT_BATCH_DELAY, DEFAULT_CONCURRENCY, DEFAULT_MAX_REDIRECTS,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use engine::{
    DownloadEngine, DownloadReport, DownloadStats, EngineError, MAX_CONCURRENCY, MIN_CONCURRENCY,
    Schedule, TaskFailure, TaskOutcome, execute_task,
};
pub use error::DownloadError;

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
