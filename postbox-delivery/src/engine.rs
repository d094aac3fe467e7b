//! Send/draft orchestration and post-delivery labeling.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::Utc;
use futures_util::future::join_all;
use postbox_store::{
    GroupId, LabelId, LabelStore, MailId, MailRecord, MailboxStore, StoreError,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    error::{DeliveryError, Result},
    screen::UrlScreen,
    urls::extract_urls,
};

/// Name of the label a spam-routed message is filed under, resolved or
/// created in each recipient's own namespace.
const SPAM_LABEL: &str = "Spam";

/// A validated send or draft-save request.
///
/// The HTTP layer folds the legacy single-`recipient` form into
/// `recipients` before constructing this.
#[derive(Debug, Clone, Deserialize)]
pub struct SendRequest {
    pub sender: String,
    pub recipients: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_draft: bool,
    /// Requested labels, each a name or a label id in the sender's
    /// namespace.
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Outcome of a send or draft save.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// One independent copy per recipient, in request order.
    Sent(Vec<MailRecord>),
    /// The single stored draft record.
    Draft(MailRecord),
}

/// Orchestrates validation, label resolution, the blacklist gate, and
/// per-recipient mailbox writes.
pub struct DeliveryEngine {
    mailbox: Arc<MailboxStore>,
    labels: Arc<LabelStore>,
    screen: Arc<dyn UrlScreen>,
}

impl DeliveryEngine {
    #[must_use]
    pub fn new(
        mailbox: Arc<MailboxStore>,
        labels: Arc<LabelStore>,
        screen: Arc<dyn UrlScreen>,
    ) -> Self {
        Self {
            mailbox,
            labels,
            screen,
        }
    }

    /// Send a message or save a draft on behalf of `identity`.
    ///
    /// Drafts skip the blacklist gate entirely and produce a single record
    /// in the author's own mailbox, even when recipients were supplied. A
    /// delivered send routes uniformly: either every copy goes to the
    /// recipient's inbox or every copy is spam-labeled.
    ///
    /// # Errors
    /// - [`DeliveryError::Forbidden`] if the sender is not the caller,
    /// - [`DeliveryError::Validation`] for a missing sender mailbox or an
    ///   empty recipient list,
    /// - [`DeliveryError::UnknownRecipient`] naming the first recipient
    ///   without a mailbox,
    /// - [`DeliveryError::Screen`] if any blacklist check failed,
    /// - [`DeliveryError::SpamLabelingFailed`] if a recipient's spam label
    ///   could not be provisioned (nothing is delivered in that case).
    pub async fn send(&self, identity: &str, request: SendRequest) -> Result<Delivery> {
        if request.sender != identity {
            return Err(DeliveryError::Forbidden(
                "Sender email does not match authenticated user".to_string(),
            ));
        }
        if !self.mailbox.contains(&request.sender)? {
            return Err(DeliveryError::Validation("Sender does not exist".to_string()));
        }

        let resolved = self.resolve_labels(&request.sender, &request.labels)?;

        if request.is_draft {
            return self.save_draft(request, resolved);
        }

        if request.recipients.is_empty() {
            return Err(DeliveryError::Validation(
                "Missing required fields".to_string(),
            ));
        }
        for recipient in &request.recipients {
            if !self.mailbox.contains(recipient)? {
                return Err(DeliveryError::UnknownRecipient(recipient.clone()));
            }
        }

        let text = format!("{} {}", request.subject, request.content);
        let blacklisted = self.screen_text(&text).await?;

        if blacklisted {
            info!(
                sender = %request.sender,
                recipients = request.recipients.len(),
                "Message contains a blacklisted URL, routing to spam"
            );
            self.deliver_spam(request)
        } else {
            self.deliver_inbox(request, resolved)
        }
    }

    /// Replace `identity`'s label set on a delivered copy.
    ///
    /// Unlike delivery-time resolution this path never creates labels: every
    /// name must already exist in the caller's namespace. When the new set
    /// names spam and the previous one did not, the copy's URLs are
    /// registered with the blacklist, best-effort.
    ///
    /// # Errors
    /// - [`StoreError::MailNotFound`] (via [`DeliveryError::Store`]) for an
    ///   unknown copy,
    /// - [`DeliveryError::Forbidden`] if the caller is neither sender nor
    ///   recipient,
    /// - [`DeliveryError::UnknownLabels`] listing names absent from the
    ///   caller's namespace.
    pub async fn set_labels_for_user(
        &self,
        identity: &str,
        mail_id: MailId,
        label_names: &[String],
    ) -> Result<Vec<LabelId>> {
        let record = self
            .mailbox
            .get(mail_id)?
            .ok_or(StoreError::MailNotFound(mail_id))?;
        if !record.is_visible_to(identity) {
            return Err(DeliveryError::Forbidden(
                "Not authorized for this mail".to_string(),
            ));
        }

        let mut ids = Vec::with_capacity(label_names.len());
        let mut unknown = Vec::new();
        for name in label_names {
            match self.labels.find_by_name(identity, name)? {
                Some(label) => ids.push(label.id),
                None => unknown.push(name.clone()),
            }
        }
        if !unknown.is_empty() {
            return Err(DeliveryError::UnknownLabels(unknown));
        }

        let previously_spam = self.resolves_to_spam(identity, &record.labels_for(identity))?;
        let updated = self.mailbox.set_labels(mail_id, identity, ids)?;

        let newly_spam = label_names
            .iter()
            .any(|name| name.trim().eq_ignore_ascii_case(SPAM_LABEL));
        if newly_spam && !previously_spam {
            // The label change has already succeeded; registration failures
            // are logged, never propagated.
            let text = format!("{} {}", record.subject, record.content);
            for url in distinct_urls(&text) {
                match self.screen.register(&url).await {
                    Ok(()) => info!(url, mail_id = %mail_id, "Registered URL from spam-labeled mail"),
                    Err(e) => warn!(url, mail_id = %mail_id, error = %e, "Failed to register URL"),
                }
            }
        }

        Ok(updated)
    }

    /// Delivery-time label resolution in the sender's namespace: ids pass
    /// through, unknown names are created, unresolvable values are dropped.
    fn resolve_labels(&self, sender: &str, values: &[String]) -> Result<Vec<LabelId>> {
        let mut resolved = Vec::with_capacity(values.len());
        for value in values {
            match self.labels.resolve_or_create(sender, value)? {
                Some(label) => resolved.push(label.id),
                None => warn!(sender, value, "Dropping unresolvable label"),
            }
        }
        Ok(resolved)
    }

    fn save_draft(&self, request: SendRequest, resolved: Vec<LabelId>) -> Result<Delivery> {
        let record = MailRecord {
            id: MailId::generate(),
            sender: request.sender.clone(),
            // The author holds the only copy; recipients are remembered but
            // not delivered to.
            recipient: request.sender.clone(),
            recipients: request.recipients,
            subject: request.subject,
            content: request.content,
            group_id: GroupId::generate(),
            timestamp: Utc::now(),
            is_draft: true,
            labels: HashMap::from([(request.sender, resolved)]),
            deleted_by: HashSet::new(),
        };

        self.mailbox.deliver(record.clone())?;
        Ok(Delivery::Draft(record))
    }

    /// Check every distinct URL in `text` concurrently; the message is
    /// blocked if any check answers `true`, and any failed check aborts the
    /// send rather than counting as clean.
    async fn screen_text(&self, text: &str) -> Result<bool> {
        let urls = distinct_urls(text);
        if urls.is_empty() {
            return Ok(false);
        }

        let verdicts = join_all(urls.iter().map(|url| self.screen.is_blacklisted(url))).await;

        let mut blacklisted = false;
        for verdict in verdicts {
            blacklisted |= verdict?;
        }
        Ok(blacklisted)
    }

    fn deliver_inbox(&self, request: SendRequest, resolved: Vec<LabelId>) -> Result<Delivery> {
        let mut label_sets = Vec::with_capacity(request.recipients.len());
        for recipient in &request.recipients {
            // The copy carries the sender-resolved set for both parties: the
            // recipient's delivery-time assignment and the sender's record
            // against the same copy.
            label_sets.push(HashMap::from([
                (recipient.clone(), resolved.clone()),
                (request.sender.clone(), resolved.clone()),
            ]));
        }
        self.fan_out(request, label_sets)
    }

    fn deliver_spam(&self, request: SendRequest) -> Result<Delivery> {
        // Provision every recipient's spam label before writing anything, so
        // a failure aborts the send with no copies delivered.
        let mut label_sets = Vec::with_capacity(request.recipients.len());
        for recipient in &request.recipients {
            let label = match self.labels.resolve_or_create(recipient, SPAM_LABEL) {
                Ok(Some(label)) => label,
                Ok(None) => {
                    return Err(DeliveryError::SpamLabelingFailed {
                        recipient: recipient.clone(),
                        source: StoreError::InvalidName(SPAM_LABEL.to_string()),
                    });
                }
                Err(source) => {
                    return Err(DeliveryError::SpamLabelingFailed {
                        recipient: recipient.clone(),
                        source,
                    });
                }
            };
            label_sets.push(HashMap::from([(recipient.clone(), vec![label.id])]));
        }
        self.fan_out(request, label_sets)
    }

    /// Write one independent copy per recipient, all sharing a group id.
    ///
    /// Writes are best-effort per recipient: a failed write does not undo
    /// copies already delivered, but it is surfaced to the caller instead of
    /// being swallowed.
    fn fan_out(
        &self,
        request: SendRequest,
        label_sets: Vec<HashMap<String, Vec<LabelId>>>,
    ) -> Result<Delivery> {
        let group_id = GroupId::generate();
        let timestamp = Utc::now();
        let mut delivered = Vec::with_capacity(request.recipients.len());
        let mut failure = None;

        for (recipient, labels) in request.recipients.iter().zip(label_sets) {
            let record = MailRecord {
                id: MailId::generate(),
                sender: request.sender.clone(),
                recipient: recipient.clone(),
                recipients: request.recipients.clone(),
                subject: request.subject.clone(),
                content: request.content.clone(),
                group_id,
                timestamp,
                is_draft: false,
                labels,
                deleted_by: HashSet::new(),
            };

            match self.mailbox.deliver(record.clone()) {
                Ok(()) => delivered.push(record),
                Err(e) => {
                    error!(recipient, group_id = %group_id, error = %e, "Failed to deliver copy");
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(Delivery::Sent(delivered)),
        }
    }

    /// Whether any of the ids resolves to a label named spam in the user's
    /// namespace. Dangling ids (e.g. another user's identifiers carried on a
    /// copy) resolve to nothing and are ignored.
    fn resolves_to_spam(&self, user: &str, ids: &[LabelId]) -> Result<bool> {
        for id in ids {
            if let Some(label) = self.labels.get(user, *id)?
                && label.name.trim().eq_ignore_ascii_case(SPAM_LABEL)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Extracted URLs with duplicates removed, first occurrence order kept. One
/// screen round trip per distinct URL.
fn distinct_urls(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    extract_urls(text)
        .into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_urls_keeps_first_occurrence_order() {
        let urls = distinct_urls("http://b.test http://a.test http://b.test");
        assert_eq!(urls, vec!["http://b.test", "http://a.test"]);
    }
}
