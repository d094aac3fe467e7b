//! The mail fan-out engine.
//!
//! A send request flows through validation, label resolution, URL
//! extraction, the blacklist gate, and finally per-recipient delivery. The
//! routing decision (inbox or spam) is made once for the whole message and
//! applied uniformly to every recipient.

pub mod engine;
pub mod error;
pub mod screen;
pub mod urls;

pub use engine::{Delivery, DeliveryEngine, SendRequest};
pub use error::{DeliveryError, Result};
pub use screen::UrlScreen;
pub use urls::extract_urls;
