//! Stagepack Core Library
//!
//! This library converts the per-stage progression guides of a game into a
//! single JSON document, downloading every item icon into a local asset
//! cache laid out as `stage/class/category/file`.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`catalog`] - Static stage, class and category tables
//! - [`record`] - Item and class records emitted in the output
//! - [`queue`] - Deduplicating asset registry and download queue
//! - [`parser`] - Line-based guide parsing and item extraction
//! - [`download`] - HTTP client and bounded-concurrency download engine
//! - [`output`] - Ordered assembly and atomic writing of the document
//! - [`pipeline`] - The two-phase parse then download run

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod download;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod queue;
pub mod record;

// Re-export commonly used types
pub use catalog::{Category, PlayerClass, Stage};
pub use download::{
    ClientSettings, DownloadEngine, DownloadError, DownloadReport, DownloadStats, EngineError,
    HttpClient, Schedule,
};
pub use output::{OutputError, StageRecord};
pub use parser::{ParseStats, ParsedDocument, parse_document};
pub use pipeline::{PipelineConfig, PipelineSummary, parse_stages};
pub use queue::{AssetKey, AssetQueue, DownloadTask};
pub use record::{ClassRecord, ItemRecord};
