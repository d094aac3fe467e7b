//! Client for the blacklist service.
//!
//! Every call opens its own TCP connection, writes one request line, then
//! reads until the server half-closes and parses the buffered response.
//! Acquisition and release of the socket live entirely inside one call, so
//! no exit path (success, parse error, connection error) can leak it.

use std::time::Duration;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use tracing::{debug, trace};

use crate::{
    error::{BlacklistError, Result},
    protocol::{self, Command, RemoveOutcome},
};

/// Default bound on a full request/response round trip.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the blacklist service at a fixed address.
#[derive(Debug, Clone)]
pub struct BlacklistClient {
    address: String,
    timeout: Duration,
}

impl BlacklistClient {
    /// Create a client with the default round-trip timeout.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the round-trip timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ask whether a URL is blacklisted.
    ///
    /// A `false` here is a definitive answer from the service; transport
    /// failures and malformed responses surface as errors instead.
    ///
    /// # Errors
    /// Returns a connection, timeout, or protocol error.
    pub async fn check(&self, url: &str) -> Result<bool> {
        let response = self.round_trip(Command::Check(url.trim().to_string())).await?;
        let blacklisted = protocol::parse_check_response(&response)?;
        debug!(url, blacklisted, "Blacklist check");
        Ok(blacklisted)
    }

    /// Put a URL on the blacklist.
    ///
    /// Adding a URL that is already present succeeds; the service answers
    /// `201 Created` either way.
    ///
    /// # Errors
    /// Returns a connection, timeout, or protocol error.
    pub async fn add(&self, url: &str) -> Result<()> {
        let response = self.round_trip(Command::Add(url.trim().to_string())).await?;
        protocol::parse_add_response(&response)?;
        debug!(url, "URL added to blacklist");
        Ok(())
    }

    /// Take a URL off the blacklist.
    ///
    /// # Errors
    /// Returns a connection, timeout, or protocol error.
    pub async fn remove(&self, url: &str) -> Result<RemoveOutcome> {
        let response = self
            .round_trip(Command::Remove(url.trim().to_string()))
            .await?;
        let outcome = protocol::parse_remove_response(&response)?;
        debug!(url, ?outcome, "URL removed from blacklist");
        Ok(outcome)
    }

    /// One connection, one request, read until half-close.
    async fn round_trip(&self, command: Command) -> Result<String> {
        tokio::time::timeout(self.timeout, self.exchange(command))
            .await
            .map_err(|_| BlacklistError::Timeout)?
    }

    async fn exchange(&self, command: Command) -> Result<String> {
        trace!(address = %self.address, ?command, "Connecting to blacklist service");
        let mut stream = TcpStream::connect(&self.address).await?;

        stream.write_all(command.encode().as_bytes()).await?;
        stream.flush().await?;

        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await?;

        String::from_utf8(buffer)
            .map_err(|e| BlacklistError::Protocol(format!("Response is not UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_timeout() {
        let client = BlacklistClient::new("127.0.0.1:5555");
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);

        let client = client.with_timeout(Duration::from_secs(1));
        assert_eq!(client.timeout, Duration::from_secs(1));
        assert_eq!(client.address, "127.0.0.1:5555");
    }

    #[tokio::test]
    async fn connection_refused_is_a_connection_error() {
        // Port 1 is essentially never listening.
        let client = BlacklistClient::new("127.0.0.1:1").with_timeout(Duration::from_secs(1));
        let err = client.check("http://a.test").await.unwrap_err();
        assert!(matches!(
            err,
            BlacklistError::Connection(_) | BlacklistError::Timeout
        ));
    }
}
