//! Process-wide tracing setup.
//!
//! One compact fmt layer with RFC 3339 UTC timestamps, filtered to this
//! workspace's crates. The level comes from the `LOG_LEVEL` environment
//! variable, defaulting to `debug` in debug builds and `info` otherwise.

use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer, filter::FilterFn, layer::SubscriberExt, util::SubscriberInitExt,
};

pub fn init() {
    let default = if cfg!(debug_assertions) {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|value| LevelFilter::from_str(&value).ok())
        .unwrap_or(default);

    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(level)
                .with_filter(FilterFn::new(|metadata| {
                    metadata.target().starts_with("postbox")
                })),
        )
        .init();
}
