//! Per-user mailbox collections.
//!
//! Each user exclusively owns an ordered collection of mail copies; a
//! multi-recipient send appends one independent copy per recipient. Deleting
//! a copy is a store-level soft delete scoped to one holder, so the other
//! recipients' copies are untouched.
//!
//! All mutations are synchronous map operations behind an `RwLock`: in a
//! single-process cooperative runtime no handler can observe a half-applied
//! write.

use std::{
    collections::{HashMap, HashSet},
    sync::RwLock,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, StoreError},
    types::{GroupId, LabelId, MailId},
};

/// One mail copy held by exactly one mailbox.
///
/// `recipient` is this copy's holder; `recipients` is the full ordered list
/// of the logical send (a single element for the legacy single-recipient
/// form). `labels` carries per-user label sets: the holder's entry is
/// assigned at delivery time, the sender's entry records the sender-side
/// assignment against the same copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailRecord {
    pub id: MailId,
    pub sender: String,
    pub recipient: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub content: String,
    pub group_id: GroupId,
    pub timestamp: DateTime<Utc>,
    pub is_draft: bool,
    #[serde(default)]
    pub labels: HashMap<String, Vec<LabelId>>,
    #[serde(default)]
    pub deleted_by: HashSet<String>,
}

impl MailRecord {
    /// Whether the given user may read this copy (sender or any recipient).
    #[must_use]
    pub fn is_visible_to(&self, user: &str) -> bool {
        self.sender == user
            || self.recipient == user
            || self.recipients.iter().any(|r| r == user)
    }

    /// The label set this copy carries for one user.
    #[must_use]
    pub fn labels_for(&self, user: &str) -> Vec<LabelId> {
        self.labels.get(user).cloned().unwrap_or_default()
    }
}

/// Process-wide store of per-user mailbox collections.
///
/// Provisioned mailboxes are the map keys; delivery into an unprovisioned
/// mailbox fails rather than creating one implicitly.
#[derive(Debug, Default)]
pub struct MailboxStore {
    boxes: RwLock<HashMap<String, Vec<MailRecord>>>,
}

impl MailboxStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision a mailbox for a user. Idempotent.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn register(&self, user: &str) -> Result<()> {
        self.boxes
            .write()?
            .entry(user.to_string())
            .or_default();
        Ok(())
    }

    /// Whether a mailbox exists for the user.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn contains(&self, user: &str) -> Result<bool> {
        Ok(self.boxes.read()?.contains_key(user))
    }

    /// Append a copy to its holder's collection.
    ///
    /// The holder is `record.recipient` for delivered copies and the author
    /// for drafts (a draft record carries its author as recipient).
    ///
    /// # Errors
    /// Fails with [`StoreError::UnknownMailbox`] if the holder has no
    /// provisioned mailbox.
    pub fn deliver(&self, record: MailRecord) -> Result<()> {
        let mut boxes = self.boxes.write()?;
        let holder = record.recipient.clone();
        match boxes.get_mut(&holder) {
            Some(collection) => {
                collection.push(record);
                Ok(())
            }
            None => Err(StoreError::UnknownMailbox(holder)),
        }
    }

    /// Look up a copy by id across all collections.
    ///
    /// Senders may read copies they do not hold, so the lookup is not scoped
    /// to one mailbox. Authorization is the caller's concern.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn get(&self, id: MailId) -> Result<Option<MailRecord>> {
        let boxes = self.boxes.read()?;
        Ok(boxes
            .values()
            .flat_map(|collection| collection.iter())
            .find(|record| record.id == id)
            .cloned())
    }

    /// Non-draft copies held by the user, newest first.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn inbox(&self, user: &str) -> Result<Vec<MailRecord>> {
        let boxes = self.boxes.read()?;
        let mut mails: Vec<MailRecord> = boxes
            .get(user)
            .map(|collection| {
                collection
                    .iter()
                    .filter(|r| !r.is_draft && !r.deleted_by.contains(user))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        mails.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(mails)
    }

    /// Copies authored by the user (including drafts), newest first.
    ///
    /// A fan-out send yields one entry per recipient copy; readers that want
    /// one entry per logical send deduplicate by group id.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn sent(&self, user: &str) -> Result<Vec<MailRecord>> {
        let boxes = self.boxes.read()?;
        let mut mails: Vec<MailRecord> = boxes
            .values()
            .flat_map(|collection| collection.iter())
            .filter(|r| r.sender == user && !r.deleted_by.contains(user))
            .cloned()
            .collect();
        mails.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(mails)
    }

    /// Every copy the user holds or authored, newest first.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn all_for(&self, user: &str) -> Result<Vec<MailRecord>> {
        let boxes = self.boxes.read()?;
        let mut mails: Vec<MailRecord> = boxes
            .values()
            .flat_map(|collection| collection.iter())
            .filter(|r| {
                (r.recipient == user || r.sender == user) && !r.deleted_by.contains(user)
            })
            .cloned()
            .collect();
        mails.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(mails)
    }

    /// Case-insensitive substring search over the user's visible copies,
    /// deduplicated by group id (newest copy of each send wins).
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn search(&self, user: &str, query: &str) -> Result<Vec<MailRecord>> {
        let needle = query.to_lowercase();
        let mut seen_groups = HashSet::new();

        Ok(self
            .all_for(user)?
            .into_iter()
            .filter(|mail| {
                mail.subject.to_lowercase().contains(&needle)
                    || mail.content.to_lowercase().contains(&needle)
                    || mail.sender.to_lowercase().contains(&needle)
                    || mail
                        .recipients
                        .iter()
                        .any(|r| r.to_lowercase().contains(&needle))
            })
            .filter(|mail| seen_groups.insert(mail.group_id))
            .collect())
    }

    /// In-place subject/content edit of one copy.
    ///
    /// Authorization (sender-only) is enforced by the caller.
    ///
    /// # Errors
    /// Fails with [`StoreError::MailNotFound`] if no copy has this id.
    pub fn update_content(
        &self,
        id: MailId,
        subject: Option<String>,
        content: Option<String>,
    ) -> Result<MailRecord> {
        let mut boxes = self.boxes.write()?;
        let record = Self::find_mut(&mut boxes, id)?;

        if let Some(subject) = subject {
            record.subject = subject;
        }
        if let Some(content) = content {
            record.content = content;
        }

        Ok(record.clone())
    }

    /// Replace one user's label set on one copy.
    ///
    /// # Errors
    /// Fails with [`StoreError::MailNotFound`] if no copy has this id.
    pub fn set_labels(&self, id: MailId, user: &str, labels: Vec<LabelId>) -> Result<Vec<LabelId>> {
        let mut boxes = self.boxes.write()?;
        let record = Self::find_mut(&mut boxes, id)?;
        record.labels.insert(user.to_string(), labels.clone());
        Ok(labels)
    }

    /// Soft-delete a copy for one holder only.
    ///
    /// # Errors
    /// Fails with [`StoreError::MailNotFound`] if no copy has this id.
    pub fn delete_for(&self, id: MailId, user: &str) -> Result<()> {
        let mut boxes = self.boxes.write()?;
        let record = Self::find_mut(&mut boxes, id)?;
        record.deleted_by.insert(user.to_string());
        Ok(())
    }

    fn find_mut(
        boxes: &mut HashMap<String, Vec<MailRecord>>,
        id: MailId,
    ) -> Result<&mut MailRecord> {
        boxes
            .values_mut()
            .flat_map(|collection| collection.iter_mut())
            .find(|record| record.id == id)
            .ok_or(StoreError::MailNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sender: &str, recipient: &str, group: GroupId) -> MailRecord {
        MailRecord {
            id: MailId::generate(),
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            recipients: vec![recipient.to_string()],
            subject: "hello".to_string(),
            content: "world".to_string(),
            group_id: group,
            timestamp: Utc::now(),
            is_draft: false,
            labels: HashMap::new(),
            deleted_by: HashSet::new(),
        }
    }

    fn store_with(users: &[&str]) -> MailboxStore {
        let store = MailboxStore::new();
        for user in users {
            store.register(user).unwrap();
        }
        store
    }

    #[test]
    fn deliver_requires_provisioned_mailbox() {
        let store = store_with(&["a@x.com"]);
        let group = GroupId::generate();

        store.deliver(record("a@x.com", "a@x.com", group)).unwrap();

        let err = store
            .deliver(record("a@x.com", "ghost@x.com", group))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownMailbox(user) if user == "ghost@x.com"));
    }

    #[test]
    fn soft_delete_is_scoped_to_one_holder() {
        let store = store_with(&["a@x.com", "b@x.com", "c@x.com"]);
        let group = GroupId::generate();

        let copy_b = record("a@x.com", "b@x.com", group);
        let copy_c = record("a@x.com", "c@x.com", group);
        let id_b = copy_b.id;
        store.deliver(copy_b).unwrap();
        store.deliver(copy_c).unwrap();

        store.delete_for(id_b, "b@x.com").unwrap();

        assert!(store.inbox("b@x.com").unwrap().is_empty());
        assert_eq!(store.inbox("c@x.com").unwrap().len(), 1);
        // The recipient's deletion does not hide either copy from the sender.
        assert_eq!(store.sent("a@x.com").unwrap().len(), 2);
    }

    #[test]
    fn drafts_are_absent_from_inbox_but_listed_as_authored() {
        let store = store_with(&["a@x.com"]);
        let mut draft = record("a@x.com", "a@x.com", GroupId::generate());
        draft.is_draft = true;
        store.deliver(draft).unwrap();

        assert!(store.inbox("a@x.com").unwrap().is_empty());
        assert_eq!(store.sent("a@x.com").unwrap().len(), 1);
    }

    #[test]
    fn sender_can_read_a_copy_they_do_not_hold() {
        let store = store_with(&["a@x.com", "b@x.com"]);
        let copy = record("a@x.com", "b@x.com", GroupId::generate());
        let id = copy.id;
        store.deliver(copy).unwrap();

        let fetched = store.get(id).unwrap().unwrap();
        assert!(fetched.is_visible_to("a@x.com"));
        assert!(fetched.is_visible_to("b@x.com"));
        assert!(!fetched.is_visible_to("c@x.com"));
    }

    #[test]
    fn search_deduplicates_by_group_id() {
        let store = store_with(&["a@x.com", "b@x.com", "c@x.com"]);
        let group = GroupId::generate();
        store.deliver(record("a@x.com", "b@x.com", group)).unwrap();
        store.deliver(record("a@x.com", "c@x.com", group)).unwrap();

        let hits = store.search("a@x.com", "hello").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].group_id, group);

        assert!(store.search("a@x.com", "no-such-text").unwrap().is_empty());
    }

    #[test]
    fn label_sets_are_per_user_on_one_copy() {
        let store = store_with(&["a@x.com", "b@x.com"]);
        let copy = record("a@x.com", "b@x.com", GroupId::generate());
        let id = copy.id;
        store.deliver(copy).unwrap();

        let mine = LabelId::generate();
        let theirs = LabelId::generate();
        store.set_labels(id, "b@x.com", vec![mine]).unwrap();
        store.set_labels(id, "a@x.com", vec![theirs]).unwrap();

        let fetched = store.get(id).unwrap().unwrap();
        assert_eq!(fetched.labels_for("b@x.com"), vec![mine]);
        assert_eq!(fetched.labels_for("a@x.com"), vec![theirs]);
        assert!(fetched.labels_for("c@x.com").is_empty());
    }

    #[test]
    fn update_content_edits_in_place() {
        let store = store_with(&["a@x.com", "b@x.com"]);
        let copy = record("a@x.com", "b@x.com", GroupId::generate());
        let id = copy.id;
        store.deliver(copy).unwrap();

        let updated = store
            .update_content(id, Some("edited".to_string()), None)
            .unwrap();
        assert_eq!(updated.subject, "edited");
        assert_eq!(updated.content, "world");

        let missing = store.update_content(MailId::generate(), None, None);
        assert!(matches!(missing, Err(StoreError::MailNotFound(_))));
    }
}
