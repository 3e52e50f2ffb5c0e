//! Error types for the download module.
//!
//! Every variant carries the URL or path it concerns so a single log line
//! identifies the failing asset.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while fetching one asset.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not finish within the hard timeout and was aborted.
    #[error("timeout after {}s downloading {url}", .after.as_secs())]
    Timeout {
        /// The URL that timed out.
        url: String,
        /// The timeout that elapsed.
        after: Duration,
    },

    /// Any status other than 200, 301 or 302.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// A redirect response without a usable `Location` header.
    #[error("HTTP {status} redirect without a usable Location header from {url}")]
    MissingLocation {
        /// The URL that sent the redirect.
        url: String,
        /// The redirect status code.
        status: u16,
    },

    /// The redirect chain exceeded the configured hop limit.
    #[error("redirect loop: gave up on {url} after {hops} redirects")]
    RedirectLoop {
        /// The originally requested URL.
        url: String,
        /// Redirects followed before giving up.
        hops: u32,
    },

    /// File system error (create directory, write, rename).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The asset reference or base URL does not form a valid URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            after,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a missing-Location error.
    pub fn missing_location(url: impl Into<String>, status: u16) -> Self {
        Self::MissingLocation {
            url: url.into(),
            status,
        }
    }

    /// Creates a redirect-loop error.
    pub fn redirect_loop(url: impl Into<String>, hops: u32) -> Self {
        Self::RedirectLoop {
            url: url.into(),
            hops,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Short machine-friendly label for logs and summaries.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::HttpStatus { .. } => "http_status",
            Self::MissingLocation { .. } => "missing_location",
            Self::RedirectLoop { .. } => "redirect_loop",
            Self::Io { .. } => "io",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::ClientBuild(_) => "client_build",
        }
    }
}
