//! HTTP client wrapper for fetching guide assets.
//!
//! This module provides the `HttpClient` struct which streams one asset to
//! disk, following 301/302 redirects itself so the hop count can be bounded,
//! and enforcing a hard per-request timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, LOCATION};
use reqwest::{Client, StatusCode};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{
    ACCEPT_LANGUAGE_VALUE, BROWSER_USER_AGENT, CONNECT_TIMEOUT_SECS, DEFAULT_BASE_URL,
    DEFAULT_MAX_REDIRECTS, DEFAULT_REQUEST_TIMEOUT, IMAGE_ACCEPT, PARTIAL_SUFFIX,
};
use super::error::DownloadError;

/// Settings used to build an [`HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Origin that relative asset references are joined onto.
    pub base_url: String,
    /// User-Agent header value.
    pub user_agent: String,
    /// Hard limit for one request, body included.
    pub request_timeout: Duration,
    /// Maximum 301/302 hops followed per asset.
    pub max_redirects: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// HTTP client for downloading assets with streaming support.
///
/// Created once per run and shared by every task, taking advantage of
/// connection pooling. Automatic redirects are disabled on the inner client.
///
/// # Example
///
/// ```no_run
/// use stagepack_core::download::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let outcome = client
///     .download_to_file("/images/a/Sword.png", Path::new("assets/Sword.png"))
///     .await?;
/// println!("{} bytes after {} redirects", outcome.bytes, outcome.redirects);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    request_timeout: Duration,
    max_redirects: u32,
}

/// Result of a successful asset fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Bytes written to the destination.
    pub bytes: u64,
    /// Redirects followed before the 200 response.
    pub redirects: u32,
    /// URL the content was finally fetched from.
    pub final_url: Url,
}

/// Outcome of a single request in a redirect chain.
enum Hop {
    Saved(u64),
    Redirect(Url),
}

impl HttpClient {
    /// Creates a client with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_settings(ClientSettings::default())
    }

    /// Creates a client from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] if `base_url` is not an absolute
    /// URL, or [`DownloadError::ClientBuild`] if the client cannot be built.
    #[instrument(level = "debug", skip(settings), fields(base_url = %settings.base_url))]
    pub fn with_settings(settings: ClientSettings) -> Result<Self, DownloadError> {
        let base_url = Url::parse(&settings.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| DownloadError::invalid_url(settings.base_url.clone()))?;

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .gzip(true)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(DownloadError::ClientBuild)?;

        debug!(
            timeout_ms = settings.request_timeout.as_millis(),
            max_redirects = settings.max_redirects,
            "created asset client"
        );

        Ok(Self {
            client,
            base_url,
            request_timeout: settings.request_timeout,
            max_redirects: settings.max_redirects,
        })
    }

    /// Origin that relative references resolve against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Hard limit applied to each request.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Maximum redirects followed per asset.
    #[must_use]
    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    /// Resolves a guide image reference to an absolute URL.
    ///
    /// Relative references are joined onto the base URL; absolute ones are
    /// returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] if the reference cannot be joined.
    pub fn resolve_url(&self, remote_ref: &str) -> Result<Url, DownloadError> {
        self.base_url
            .join(remote_ref)
            .map_err(|_| DownloadError::invalid_url(remote_ref))
    }

    /// Downloads one asset to `destination`.
    ///
    /// The body is streamed to a `.part` sibling and renamed into place once
    /// complete, so `destination` only ever holds whole files. On 301/302 the
    /// `Location` target is fetched instead, keeping the same destination,
    /// up to [`max_redirects`](Self::max_redirects) hops. Each request is
    /// aborted after [`request_timeout`](Self::request_timeout).
    ///
    /// The parent directory of `destination` must already exist.
    ///
    /// # Errors
    ///
    /// Returns a [`DownloadError`] for invalid references, transport errors,
    /// timeouts, statuses other than 200/301/302, redirect loops and write
    /// failures. No partial file is left behind in any of these cases.
    #[instrument(skip(self, destination), fields(path = %destination.display()))]
    pub async fn download_to_file(
        &self,
        remote_ref: &str,
        destination: &Path,
    ) -> Result<FetchOutcome, DownloadError> {
        let requested = self.resolve_url(remote_ref)?;
        let mut url = requested.clone();
        let mut redirects = 0u32;

        loop {
            match self.fetch_once(&url, destination).await? {
                Hop::Saved(bytes) => {
                    debug!(url = %url, bytes, redirects, "asset saved");
                    return Ok(FetchOutcome {
                        bytes,
                        redirects,
                        final_url: url,
                    });
                }
                Hop::Redirect(next) => {
                    if redirects >= self.max_redirects {
                        return Err(DownloadError::redirect_loop(requested.as_str(), redirects));
                    }
                    redirects += 1;
                    debug!(from = %url, to = %next, redirects, "following redirect");
                    url = next;
                }
            }
        }
    }

    async fn fetch_once(&self, url: &Url, destination: &Path) -> Result<Hop, DownloadError> {
        let partial = partial_path(destination);
        let result = match tokio::time::timeout(
            self.request_timeout,
            self.fetch_inner(url, destination, &partial),
        )
        .await
        {
            Ok(result) => result,
            Err(_elapsed) => Err(DownloadError::timeout(url.as_str(), self.request_timeout)),
        };

        if result.is_err() {
            remove_partial(&partial).await;
        }
        result
    }

    async fn fetch_inner(
        &self,
        url: &Url,
        destination: &Path,
        partial: &Path,
    ) -> Result<Hop, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, IMAGE_ACCEPT)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE)
            .header("DNT", "1")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DownloadError::timeout(url.as_str(), self.request_timeout)
                } else {
                    DownloadError::network(url.as_str(), e)
                }
            })?;

        match response.status() {
            StatusCode::OK => {
                let bytes = stream_to_file(response, url.as_str(), partial).await?;
                tokio::fs::rename(partial, destination)
                    .await
                    .map_err(|e| DownloadError::io(destination, e))?;
                Ok(Hop::Saved(bytes))
            }
            StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND => {
                let status = response.status().as_u16();
                response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|location| url.join(location).ok())
                    .map(Hop::Redirect)
                    .ok_or_else(|| DownloadError::missing_location(url.as_str(), status))
            }
            status => Err(DownloadError::http_status(url.as_str(), status.as_u16())),
        }
    }
}

/// Streams response body to a fresh file at `path`, returning bytes written.
///
/// This is extracted to enable cleanup on error in the caller.
async fn stream_to_file(
    response: reqwest::Response,
    url: &str,
    path: &Path,
) -> Result<u64, DownloadError> {
    let file = File::create(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(path, e))?;

    Ok(bytes_written)
}

/// Path of the in-progress file for `destination`.
#[must_use]
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}

async fn remove_partial(partial: &Path) {
    if let Err(e) = tokio::fs::remove_file(partial).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        debug!(path = %partial.display(), error = %e, "failed to remove partial file");
    }
}
