pub mod config;
pub mod logging;

pub use tracing;

/// Shutdown coordination signal broadcast to every long-running component.
#[derive(Debug, Clone, Copy)]
pub enum Signal {
    Shutdown,
    Finalised,
}
