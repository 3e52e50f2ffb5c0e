//! Constants for the download module (timeouts, pacing, request headers).

use std::time::Duration;

/// Origin that guide image references are relative to.
pub const DEFAULT_BASE_URL: &str = "https://terraria.wiki.gg";

/// Default number of assets in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default pause between successive download groups.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(300);

/// Default hard limit for a single request, body included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of 301/302 hops followed per asset.
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// TCP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Browser User-Agent sent with asset requests. The wiki rejects bare
/// library agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Accept header for image requests.
pub const IMAGE_ACCEPT: &str = "image/webp,image/apng,image/*,*/*;q=0.8";

/// Accept-Language header for asset requests.
pub const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

/// Suffix of the in-progress file written next to each destination.
pub const PARTIAL_SUFFIX: &str = "part";
