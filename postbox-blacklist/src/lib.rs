//! Client and service for the URL blacklist wire protocol.
//!
//! The protocol is newline-delimited ASCII over TCP, one request per
//! connection: the client writes a single request line, the server writes
//! its response and closes the connection, and the client parses whatever
//! it buffered up to the half-close.
//!
//! The request grammar mixes numeric codes with a verb (`1 <url>` to add,
//! `2 <url>` to check, `DELETE <url>` to remove). The inconsistency is part
//! of the deployed peer's grammar and is preserved verbatim.

pub mod client;
pub mod error;
pub mod filter;
pub mod protocol;
pub mod server;
pub mod store;

pub use client::BlacklistClient;
pub use error::{BlacklistError, Result};
pub use filter::BloomFilter;
pub use protocol::{Command, RemoveOutcome};
pub use server::BlacklistServer;
pub use store::{BlacklistEntry, BlacklistStore};
