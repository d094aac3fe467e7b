//! Shared application state.
//!
//! The stores, the fan-out engine, and the blacklist screen are owned here
//! and injected into handlers through axum's `State`; nothing in the HTTP
//! layer reaches for ambient globals.

use std::sync::Arc;

use postbox_delivery::{DeliveryEngine, UrlScreen};
use postbox_store::{LabelStore, MailboxStore};

use crate::auth::Authenticator;

/// Everything a request handler needs.
pub struct AppState {
    pub mailbox: Arc<MailboxStore>,
    pub labels: Arc<LabelStore>,
    pub engine: DeliveryEngine,
    pub screen: Arc<dyn UrlScreen>,
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    /// Wire up the state from its parts, constructing the engine over the
    /// same stores and screen the handlers see.
    #[must_use]
    pub fn new(
        mailbox: Arc<MailboxStore>,
        labels: Arc<LabelStore>,
        screen: Arc<dyn UrlScreen>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        let engine = DeliveryEngine::new(
            Arc::clone(&mailbox),
            Arc::clone(&labels),
            Arc::clone(&screen),
        );
        Self {
            mailbox,
            labels,
            engine,
            screen,
            authenticator,
        }
    }
}
