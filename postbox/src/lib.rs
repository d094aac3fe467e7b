//! Wiring between configuration and the running services.

use std::{sync::Arc, time::Duration};

use postbox_blacklist::BlacklistClient;
use postbox_common::config::Config;
use postbox_http::{AppState, TokenTable};
use postbox_store::{LabelStore, MailboxStore, StoreError};

/// Build the shared application state from configuration: provisioned
/// mailboxes, the bearer-token table, and a blacklist client pointed at the
/// configured service.
///
/// # Errors
/// Returns an error if mailbox provisioning fails.
pub fn build_state(config: &Config) -> Result<Arc<AppState>, StoreError> {
    let mailbox = Arc::new(MailboxStore::new());
    let mut tokens = TokenTable::new();
    for account in &config.accounts {
        mailbox.register(&account.email)?;
        tokens.insert(account.token.clone(), account.email.clone());
    }

    let client = BlacklistClient::new(config.blacklist.address.clone())
        .with_timeout(Duration::from_secs(config.blacklist.timeout_secs));

    Ok(Arc::new(AppState::new(
        mailbox,
        Arc::new(LabelStore::new()),
        Arc::new(client),
        Arc::new(tokens),
    )))
}
