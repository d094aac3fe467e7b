//! Configuration for the Postbox backend and the blacklist service.
//!
//! Loaded from a TOML file (`postbox.config.toml` by default). Every section
//! carries serde defaults so a partial file is enough to get a working
//! development setup.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub blacklist: BlacklistConfig,

    /// Mailboxes provisioned at startup, with the bearer token that resolves
    /// to each. Token issuance itself is handled elsewhere; the backend only
    /// needs the mapping.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_listen")]
    pub listen_address: String,

    /// Per-request timeout applied to the whole router, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Blacklist service endpoint, shared by the client and the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct BlacklistConfig {
    #[serde(default = "default_blacklist_address")]
    pub address: String,

    /// Bound on a single check/add/remove round trip, in seconds.
    #[serde(default = "default_blacklist_timeout_secs")]
    pub timeout_secs: u64,

    /// Bloom filter bit count for the daemon.
    #[serde(default = "default_filter_bits")]
    pub filter_bits: usize,

    /// Number of hash probes per URL for the daemon.
    #[serde(default = "default_filter_hashes")]
    pub filter_hashes: u32,
}

/// A provisioned mailbox and the bearer token that maps to it.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub email: String,
    pub token: String,
}

fn default_http_listen() -> String {
    "127.0.0.1:8080".to_string()
}

const fn default_http_timeout_secs() -> u64 {
    30
}

fn default_blacklist_address() -> String {
    "127.0.0.1:5555".to_string()
}

const fn default_blacklist_timeout_secs() -> u64 {
    5
}

const fn default_filter_bits() -> usize {
    8192
}

const fn default_filter_hashes() -> u32 {
    3
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_address: default_http_listen(),
            request_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl Default for BlacklistConfig {
    fn default() -> Self {
        Self {
            address: default_blacklist_address(),
            timeout_secs: default_blacklist_timeout_secs(),
            filter_bits: default_filter_bits(),
            filter_hashes: default_filter_hashes(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.http.listen_address, "127.0.0.1:8080");
        assert_eq!(config.blacklist.address, "127.0.0.1:5555");
        assert_eq!(config.blacklist.timeout_secs, 5);
        assert!(config.accounts.is_empty());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let config: Config = toml::from_str(
            r#"
            [blacklist]
            address = "10.0.0.1:9000"

            [[accounts]]
            email = "a@example.com"
            token = "token-a"
            "#,
        )
        .unwrap();

        assert_eq!(config.blacklist.address, "10.0.0.1:9000");
        assert_eq!(config.blacklist.timeout_secs, 5);
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].email, "a@example.com");
    }
}
