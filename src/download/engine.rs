//! Download engine for bounded-concurrency asset fetching.
//!
//! This module provides the `DownloadEngine` which drains a list of
//! [`DownloadTask`]s through a shared [`HttpClient`]. Two schedules are
//! supported:
//!
//! - [`Schedule::Batched`] runs tasks in consecutive groups of
//!   `concurrency`, waits for the whole group, then pauses for
//!   `batch_delay` before the next group. No pause follows the last group.
//! - [`Schedule::Pool`] keeps up to `concurrency` tasks in flight at all
//!   times and never pauses.
//!
//! A failing task never aborts the run. Failures are logged, counted and
//! returned in the [`DownloadReport`].
//!
//! # Example
//!
//! ```no_run
//! use stagepack_core::download::{DownloadEngine, HttpClient, Schedule};
//! use stagepack_core::queue::AssetQueue;
//! use std::time::Duration;
//!
//! # async fn example(queue: AssetQueue) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(5, Duration::from_millis(300), Schedule::Batched)?;
//! let client = HttpClient::new()?;
//! let report = engine.run(queue.tasks(), &client).await;
//! println!("Downloaded: {}, Cached: {}, Failed: {}", report.downloaded, report.cached, report.failed);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::{self, join_all};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use super::{DownloadError, HttpClient};
use crate::queue::DownloadTask;

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Error type for download engine construction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// How queued tasks are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Schedule {
    /// Fixed groups with a barrier and a pause between groups.
    #[default]
    Batched,
    /// Rolling pool with no pauses.
    Pool,
}

impl Schedule {
    /// Configuration spelling of the schedule.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Batched => "batched",
            Self::Pool => "pool",
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Schedule {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "batched" | "batch" => Ok(Self::Batched),
            "pool" => Ok(Self::Pool),
            other => Err(format!(
                "unknown schedule '{other}' (expected 'batched' or 'pool')"
            )),
        }
    }
}

/// Live counters for a download run.
///
/// Shared with progress observers through an `Arc`; updated atomically by
/// every task as it settles.
#[derive(Debug, Default)]
pub struct DownloadStats {
    downloaded: AtomicUsize,
    cached: AtomicUsize,
    failed: AtomicUsize,
    redirects: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assets fetched over the network.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.downloaded.load(Ordering::SeqCst)
    }

    /// Assets skipped because the destination already existed.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cached.load(Ordering::SeqCst)
    }

    /// Assets that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Redirect hops followed by successful downloads.
    #[must_use]
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }

    /// Tasks settled so far, in any outcome.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.downloaded() + self.cached() + self.failed()
    }

    fn increment_downloaded(&self) {
        self.downloaded.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_cached(&self) {
        self.cached.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn add_redirects(&self, hops: u32) {
        self.redirects.fetch_add(hops as usize, Ordering::SeqCst);
    }
}

/// How a single task settled successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Fetched and written to disk.
    Downloaded {
        /// Bytes written.
        bytes: u64,
        /// Redirects followed.
        redirects: u32,
    },
    /// Destination already existed; no request was made.
    Cached,
}

/// A task that could not be completed.
#[derive(Debug)]
pub struct TaskFailure {
    pub name: String,
    pub remote_ref: String,
    pub destination: PathBuf,
    pub error: DownloadError,
}

/// Final tallies of a download run.
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Tasks handed to the engine.
    pub queued: usize,
    pub downloaded: usize,
    pub cached: usize,
    pub failed: usize,
    /// Redirect hops followed across all successful downloads.
    pub redirects: usize,
    /// Details of every failed task.
    pub failures: Vec<TaskFailure>,
}

impl DownloadReport {
    /// Tasks whose destination now holds the asset.
    #[must_use]
    pub fn successful(&self) -> usize {
        self.downloaded + self.cached
    }

    /// Returns true when no task failed.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Download engine for concurrent asset downloads.
///
/// # Concurrency Model
///
/// - Tasks run as futures on the caller's runtime; nothing is spawned
/// - At most `concurrency` requests are in flight at once
/// - Every task settles (success, cache hit or failure) exactly once
#[derive(Debug, Clone)]
pub struct DownloadEngine {
    concurrency: usize,
    batch_delay: Duration,
    schedule: Schedule,
}

impl DownloadEngine {
    /// Creates a new download engine.
    ///
    /// # Arguments
    ///
    /// * `concurrency` - Maximum number of concurrent downloads (1-100)
    /// * `batch_delay` - Pause between groups in [`Schedule::Batched`] mode
    /// * `schedule` - Grouping strategy
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use stagepack_core::download::{DownloadEngine, Schedule};
    ///
    /// let engine = DownloadEngine::new(5, Duration::from_millis(300), Schedule::Batched).unwrap();
    /// assert_eq!(engine.concurrency(), 5);
    /// ```
    pub fn new(
        concurrency: usize,
        batch_delay: Duration,
        schedule: Schedule,
    ) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }

        Ok(Self {
            concurrency,
            batch_delay,
            schedule,
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the pause between groups.
    #[must_use]
    pub fn batch_delay(&self) -> Duration {
        self.batch_delay
    }

    /// Returns the scheduling strategy.
    #[must_use]
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Downloads every task, returning once all of them have settled.
    pub async fn run(&self, tasks: &[DownloadTask], client: &HttpClient) -> DownloadReport {
        self.run_with_stats(tasks, client, Arc::new(DownloadStats::new()))
            .await
    }

    /// Like [`run`](Self::run), updating `stats` as tasks settle so a
    /// progress observer can follow along.
    #[instrument(skip_all, fields(tasks = tasks.len(), concurrency = self.concurrency, schedule = %self.schedule))]
    pub async fn run_with_stats(
        &self,
        tasks: &[DownloadTask],
        client: &HttpClient,
        stats: Arc<DownloadStats>,
    ) -> DownloadReport {
        info!("starting asset downloads");

        let failures = match self.schedule {
            Schedule::Batched => self.run_batched(tasks, client, &stats).await,
            Schedule::Pool => self.run_pool(tasks, client, &stats).await,
        };

        let report = DownloadReport {
            queued: tasks.len(),
            downloaded: stats.downloaded(),
            cached: stats.cached(),
            failed: stats.failed(),
            redirects: stats.redirects(),
            failures,
        };

        info!(
            downloaded = report.downloaded,
            cached = report.cached,
            failed = report.failed,
            redirects = report.redirects,
            "asset downloads complete"
        );

        report
    }

    async fn run_batched(
        &self,
        tasks: &[DownloadTask],
        client: &HttpClient,
        stats: &DownloadStats,
    ) -> Vec<TaskFailure> {
        let group_count = tasks.len().div_ceil(self.concurrency);
        let mut failures = Vec::new();

        for (index, group) in tasks.chunks(self.concurrency).enumerate() {
            debug!(
                group = index + 1,
                of = group_count,
                size = group.len(),
                "starting download group"
            );

            let settled = join_all(
                group
                    .iter()
                    .map(|task| execute_and_record(client, task, stats)),
            )
            .await;
            failures.extend(settled.into_iter().flatten());

            if index + 1 < group_count && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        failures
    }

    async fn run_pool(
        &self,
        tasks: &[DownloadTask],
        client: &HttpClient,
        stats: &DownloadStats,
    ) -> Vec<TaskFailure> {
        stream::iter(tasks)
            .map(|task| execute_and_record(client, task, stats))
            .buffer_unordered(self.concurrency)
            .filter_map(future::ready)
            .collect()
            .await
    }
}

/// Runs one task and records its outcome in `stats`.
async fn execute_and_record(
    client: &HttpClient,
    task: &DownloadTask,
    stats: &DownloadStats,
) -> Option<TaskFailure> {
    match execute_task(client, task).await {
        Ok(TaskOutcome::Cached) => {
            debug!(name = %task.name, path = %task.destination.display(), "asset already present");
            stats.increment_cached();
            None
        }
        Ok(TaskOutcome::Downloaded { bytes, redirects }) => {
            info!(name = %task.name, bytes, redirects, "downloaded asset");
            stats.increment_downloaded();
            stats.add_redirects(redirects);
            None
        }
        Err(error) => {
            warn!(
                name = %task.name,
                remote = %task.remote_ref,
                kind = error.kind(),
                error = %error,
                "asset download failed"
            );
            stats.increment_failed();
            Some(TaskFailure {
                name: task.name.clone(),
                remote_ref: task.remote_ref.clone(),
                destination: task.destination.clone(),
                error,
            })
        }
    }
}

/// Fetches one asset unless its destination already exists.
///
/// # Errors
///
/// Returns a [`DownloadError`] if the parent directory cannot be created or
/// the fetch fails.
pub async fn execute_task(
    client: &HttpClient,
    task: &DownloadTask,
) -> Result<TaskOutcome, DownloadError> {
    if tokio::fs::try_exists(&task.destination)
        .await
        .unwrap_or(false)
    {
        return Ok(TaskOutcome::Cached);
    }

    if let Some(parent) = task.destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::io(parent, e))?;
    }

    let outcome = client
        .download_to_file(&task.remote_ref, &task.destination)
        .await?;

    Ok(TaskOutcome::Downloaded {
        bytes: outcome.bytes,
        redirects: outcome.redirects,
    })
}
