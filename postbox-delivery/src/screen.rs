//! The seam between the fan-out engine and the blacklist service.

use async_trait::async_trait;
use postbox_blacklist::{BlacklistClient, RemoveOutcome};

/// URL reputation screen consulted by the engine and the administrative
/// passthrough.
///
/// [`BlacklistClient`] is the production implementation; tests substitute a
/// scripted screen. Both answers and failures are part of the contract: an
/// implementation must never turn a failure into a `false` verdict.
#[async_trait]
pub trait UrlScreen: Send + Sync {
    /// Whether the URL is on the blacklist.
    ///
    /// # Errors
    /// Returns an error if no definitive verdict could be obtained.
    async fn is_blacklisted(&self, url: &str) -> postbox_blacklist::Result<bool>;

    /// Register a URL on the blacklist.
    ///
    /// # Errors
    /// Returns an error if the registration could not be confirmed.
    async fn register(&self, url: &str) -> postbox_blacklist::Result<()>;

    /// Take a URL off the blacklist.
    ///
    /// # Errors
    /// Returns an error if the removal could not be confirmed.
    async fn unregister(&self, url: &str) -> postbox_blacklist::Result<RemoveOutcome>;
}

#[async_trait]
impl UrlScreen for BlacklistClient {
    async fn is_blacklisted(&self, url: &str) -> postbox_blacklist::Result<bool> {
        self.check(url).await
    }

    async fn register(&self, url: &str) -> postbox_blacklist::Result<()> {
        self.add(url).await
    }

    async fn unregister(&self, url: &str) -> postbox_blacklist::Result<RemoveOutcome> {
        self.remove(url).await
    }
}
