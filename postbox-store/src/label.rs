//! Per-user label namespaces.
//!
//! The store maps each user to an owned collection of label records, never a
//! flat table with user columns: a label identifier minted for one user can
//! structurally never appear in another user's namespace. Names are unique
//! per user under case-insensitive, whitespace-trimmed comparison, while the
//! stored name keeps its original casing.

use std::{collections::HashMap, sync::RwLock};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{Result, StoreError},
    types::LabelId,
};

/// A label in one user's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
}

/// Process-wide store of per-user label namespaces.
#[derive(Debug, Default)]
pub struct LabelStore {
    namespaces: RwLock<HashMap<String, Vec<Label>>>,
}

fn names_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl LabelStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All labels in the user's namespace, in creation order.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn list(&self, user: &str) -> Result<Vec<Label>> {
        Ok(self
            .namespaces
            .read()?
            .get(user)
            .cloned()
            .unwrap_or_default())
    }

    /// Look up a label by id within the user's namespace.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn get(&self, user: &str, id: LabelId) -> Result<Option<Label>> {
        Ok(self
            .namespaces
            .read()?
            .get(user)
            .and_then(|labels| labels.iter().find(|l| l.id == id))
            .cloned())
    }

    /// Case-insensitive, trimmed lookup by name within the user's namespace.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn find_by_name(&self, user: &str, name: &str) -> Result<Option<Label>> {
        Ok(self
            .namespaces
            .read()?
            .get(user)
            .and_then(|labels| labels.iter().find(|l| names_match(&l.name, name)))
            .cloned())
    }

    /// Create a label in the user's namespace.
    ///
    /// # Errors
    /// Fails with [`StoreError::DuplicateName`] if a case-insensitive match
    /// already exists, or [`StoreError::InvalidName`] for an empty name.
    pub fn create(&self, user: &str, name: &str) -> Result<Label> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(StoreError::InvalidName(name.to_string()));
        }

        let mut namespaces = self.namespaces.write()?;
        let labels = namespaces.entry(user.to_string()).or_default();

        if labels.iter().any(|l| names_match(&l.name, trimmed)) {
            return Err(StoreError::DuplicateName(trimmed.to_string()));
        }

        let label = Label {
            id: LabelId::generate(),
            name: trimmed.to_string(),
        };
        labels.push(label.clone());
        Ok(label)
    }

    /// Rename a label, keeping its identifier.
    ///
    /// # Errors
    /// Fails with [`StoreError::LabelNotFound`] if the id is not in the
    /// user's namespace, [`StoreError::DuplicateName`] if another label
    /// already carries the name, or [`StoreError::InvalidName`] for an empty
    /// name.
    pub fn rename(&self, user: &str, id: LabelId, name: &str) -> Result<Label> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(StoreError::InvalidName(name.to_string()));
        }

        let mut namespaces = self.namespaces.write()?;
        let labels = namespaces
            .get_mut(user)
            .ok_or(StoreError::LabelNotFound(id))?;

        if labels
            .iter()
            .any(|l| l.id != id && names_match(&l.name, trimmed))
        {
            return Err(StoreError::DuplicateName(trimmed.to_string()));
        }

        let label = labels
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(StoreError::LabelNotFound(id))?;
        label.name = trimmed.to_string();
        Ok(label.clone())
    }

    /// Remove a label from the user's namespace.
    ///
    /// Mail copies that reference the identifier keep it; the dangling
    /// reference simply no longer resolves to a name.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn delete(&self, user: &str, id: LabelId) -> Result<bool> {
        let mut namespaces = self.namespaces.write()?;
        let Some(labels) = namespaces.get_mut(user) else {
            return Ok(false);
        };
        let before = labels.len();
        labels.retain(|l| l.id != id);
        Ok(labels.len() != before)
    }

    /// Delivery-time resolution: interpret `value` as a label id first, then
    /// as a name, creating the label on demand. Returns `None` for values
    /// that cannot be resolved (empty names, ids from another namespace):
    /// delivery drops those rather than failing.
    ///
    /// A concurrent create racing on the same name surfaces here as
    /// [`StoreError::DuplicateName`]; the loser falls back to a lookup.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn resolve_or_create(&self, user: &str, value: &str) -> Result<Option<Label>> {
        // A value that parses as an identifier is treated as one: if it is
        // not in this namespace it is dropped, not turned into a name.
        if let Ok(id) = value.parse::<LabelId>() {
            return self.get(user, id);
        }

        if value.trim().is_empty() {
            return Ok(None);
        }

        if let Some(label) = self.find_by_name(user, value)? {
            return Ok(Some(label));
        }

        match self.create(user, value) {
            Ok(label) => Ok(Some(label)),
            Err(StoreError::DuplicateName(_)) => self.find_by_name(user, value),
            Err(StoreError::InvalidName(value)) => {
                warn!(user, value, "Dropping unresolvable label value");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitively_unique_per_user() {
        let store = LabelStore::new();
        store.create("a@x.com", "Spam").unwrap();

        let err = store.create("a@x.com", "spam").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName(_)));

        // The same two names succeed for a different user.
        store.create("b@x.com", "spam").unwrap();
    }

    #[test]
    fn comparison_trims_but_storage_preserves_casing() {
        let store = LabelStore::new();
        let label = store.create("a@x.com", "  Work Stuff ").unwrap();
        assert_eq!(label.name, "Work Stuff");

        assert!(matches!(
            store.create("a@x.com", "work stuff"),
            Err(StoreError::DuplicateName(_))
        ));

        let found = store.find_by_name("a@x.com", " WORK STUFF ").unwrap();
        assert_eq!(found.unwrap().id, label.id);
    }

    #[test]
    fn identifiers_do_not_cross_namespaces() {
        let store = LabelStore::new();
        let a = store.create("a@x.com", "Starred").unwrap();
        let b = store.create("b@x.com", "Starred").unwrap();

        assert_ne!(a.id, b.id);
        assert!(store.get("b@x.com", a.id).unwrap().is_none());
    }

    #[test]
    fn rename_checks_conflicts_and_keeps_id() {
        let store = LabelStore::new();
        let travel = store.create("a@x.com", "Travel").unwrap();
        store.create("a@x.com", "Receipts").unwrap();

        assert!(matches!(
            store.rename("a@x.com", travel.id, "receipts"),
            Err(StoreError::DuplicateName(_))
        ));

        let renamed = store.rename("a@x.com", travel.id, "Trips").unwrap();
        assert_eq!(renamed.id, travel.id);
        assert_eq!(renamed.name, "Trips");

        // Renaming to its own name (different case) is not a conflict.
        store.rename("a@x.com", travel.id, "TRIPS").unwrap();
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let store = LabelStore::new();
        let label = store.create("a@x.com", "Trash").unwrap();

        assert!(store.delete("a@x.com", label.id).unwrap());
        assert!(!store.delete("a@x.com", label.id).unwrap());
        assert!(store.get("a@x.com", label.id).unwrap().is_none());
    }

    #[test]
    fn resolve_or_create_handles_ids_names_and_junk() {
        let store = LabelStore::new();
        let existing = store.create("a@x.com", "Inbox").unwrap();

        // By id.
        let by_id = store
            .resolve_or_create("a@x.com", &existing.id.to_string())
            .unwrap()
            .unwrap();
        assert_eq!(by_id.id, existing.id);

        // By name, case-insensitive.
        let by_name = store.resolve_or_create("a@x.com", "inbox").unwrap().unwrap();
        assert_eq!(by_name.id, existing.id);

        // Unknown name is created on demand.
        let created = store.resolve_or_create("a@x.com", "Newsletters").unwrap();
        assert!(created.is_some());
        assert!(store.find_by_name("a@x.com", "newsletters").unwrap().is_some());

        // Whitespace-only values are dropped.
        assert!(store.resolve_or_create("a@x.com", "   ").unwrap().is_none());

        // An id from another namespace is unresolvable and dropped.
        let foreign = LabelId::generate();
        assert!(store
            .resolve_or_create("a@x.com", &foreign.to_string())
            .unwrap()
            .is_none());
    }

    #[test]
    fn list_preserves_creation_order() {
        let store = LabelStore::new();
        for name in ["One", "Two", "Three"] {
            store.create("a@x.com", name).unwrap();
        }

        let names: Vec<String> = store
            .list("a@x.com")
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["One", "Two", "Three"]);
        assert!(store.list("nobody@x.com").unwrap().is_empty());
    }
}
