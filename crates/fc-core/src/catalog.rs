//! Action catalog
//!
//! Maps action names to recorded actions. A name can be known but not yet
//! recorded ("absent"), in which case it is excluded from sequence generation.
//! The catalog is mutated by the recording side only; the execution engine
//! works on a snapshot taken when a run starts.

use indexmap::IndexMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::debug;

use crate::action::Action;

/// Click targets the recorder knows about out of the box
pub const RECORDABLE_CLICKS: [&str; 3] = ["like", "bookmark", "follow"];

/// Errors raised when mutating the catalog
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("invalid action '{name}': {reason}")]
    InvalidAction { name: String, reason: String },
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Ordered mapping from action name to a recorded action (or absent)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionCatalog {
    entries: IndexMap<String, Option<Action>>,
}

impl ActionCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a recorded action by name
    pub fn get(&self, name: &str) -> Option<&Action> {
        self.entries.get(name).and_then(Option::as_ref)
    }

    /// Store an action under `name`
    ///
    /// Fails if the name doesn't match the action's own name or the action's
    /// parameters are unusable (empty name, zero scroll amount).
    pub fn set(&mut self, name: &str, action: Action) -> CatalogResult<()> {
        if action.name != name {
            return Err(CatalogError::InvalidAction {
                name: name.to_string(),
                reason: format!("action is named '{}'", action.name),
            });
        }
        action.validate()?;

        debug!(action = %action, "Storing action");
        self.entries.insert(name.to_string(), Some(action));
        Ok(())
    }

    /// Record a click target at the given screen position
    pub fn record_click(&mut self, name: &str, x: i32, y: i32) -> CatalogResult<()> {
        self.set(name, Action::click(name, x, y))
    }

    /// Register a name without a recorded action
    ///
    /// Existing recordings are left untouched.
    pub fn declare(&mut self, name: impl Into<String>) {
        self.entries.entry(name.into()).or_insert(None);
    }

    /// Forget the recording for `name`, keeping the name known
    pub fn remove(&mut self, name: &str) -> Option<Action> {
        self.entries.get_mut(name).and_then(Option::take)
    }

    /// Whether every required name maps to a recorded action
    pub fn is_complete<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required.iter().all(|name| self.is_present(name.as_ref()))
    }

    /// Whether `name` has a recorded action
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate over recorded actions in insertion order
    pub fn present(&self) -> impl Iterator<Item = &Action> {
        self.entries.values().filter_map(Option::as_ref)
    }

    /// Number of recorded actions
    pub fn present_count(&self) -> usize {
        self.present().count()
    }

    /// Names that are known but not recorded
    pub fn missing(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, action)| action.is_none())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Iterate over all entries, recorded or not
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Action>)> {
        self.entries
            .iter()
            .map(|(name, action)| (name.as_str(), action.as_ref()))
    }

    /// Total number of known names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog knows no names at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source of read-only catalog snapshots
pub trait CatalogSource: Send + Sync {
    /// Take a copy of the current catalog
    fn snapshot(&self) -> ActionCatalog;
}

impl CatalogSource for ActionCatalog {
    fn snapshot(&self) -> ActionCatalog {
        self.clone()
    }
}

/// Catalog shared between the recording side (writer) and runners (readers)
#[derive(Debug, Clone, Default)]
pub struct SharedCatalog {
    inner: Arc<RwLock<ActionCatalog>>,
}

impl SharedCatalog {
    /// Wrap an existing catalog
    pub fn new(catalog: ActionCatalog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(catalog)),
        }
    }

    /// Apply a mutation under the write lock
    pub fn update<R>(&self, f: impl FnOnce(&mut ActionCatalog) -> R) -> R {
        // A panic inside a previous writer leaves the map itself consistent
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl CatalogSource for SharedCatalog {
    fn snapshot(&self) -> ActionCatalog {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> ActionCatalog {
        let mut catalog = ActionCatalog::new();
        for name in RECORDABLE_CLICKS {
            catalog.declare(name);
        }
        catalog
            .set("swipe_up", Action::scroll("swipe_up", -200000))
            .unwrap();
        catalog
            .set("swipe_down", Action::scroll("swipe_down", 200000))
            .unwrap();
        catalog
    }

    #[test]
    fn test_get_absent_and_present() {
        let catalog = sample_catalog();
        assert!(catalog.get("like").is_none());
        assert_eq!(catalog.get("swipe_up"), Some(&Action::scroll("swipe_up", -200000)));
        assert!(catalog.get("unknown").is_none());
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.present_count(), 2);
    }

    #[test]
    fn test_set_rejects_zero_scroll() {
        let mut catalog = ActionCatalog::new();
        let err = catalog
            .set("swipe_up", Action::scroll("swipe_up", 0))
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidAction { .. }));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_set_rejects_mismatched_name() {
        let mut catalog = ActionCatalog::new();
        let result = catalog.set("like", Action::click("follow", 1, 2));
        assert!(result.is_err());
    }

    #[test]
    fn test_is_complete() {
        let mut catalog = sample_catalog();
        assert!(catalog.is_complete(&["swipe_up", "swipe_down"]));
        assert!(!catalog.is_complete(&["swipe_up", "like"]));

        catalog.record_click("like", 10, 20).unwrap();
        assert!(catalog.is_complete(&["swipe_up", "like"]));
        assert!(catalog.is_complete::<&str>(&[]));
    }

    #[test]
    fn test_declare_keeps_recording() {
        let mut catalog = sample_catalog();
        catalog.record_click("like", 10, 20).unwrap();
        catalog.declare("like");
        assert!(catalog.is_present("like"));
    }

    #[test]
    fn test_remove_marks_absent() {
        let mut catalog = sample_catalog();
        catalog.record_click("follow", 5, 5).unwrap();
        assert!(catalog.remove("follow").is_some());
        assert!(!catalog.is_present("follow"));
        assert!(catalog.missing().contains(&"follow"));
    }

    #[test]
    fn test_present_preserves_insertion_order() {
        let mut catalog = sample_catalog();
        catalog.record_click("bookmark", 1, 1).unwrap();
        let names: Vec<_> = catalog.present().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["bookmark", "swipe_up", "swipe_down"]);
    }

    #[test]
    fn test_shared_catalog_snapshot_is_detached() {
        let shared = SharedCatalog::new(sample_catalog());
        let snapshot = shared.snapshot();

        shared.update(|c| c.record_click("like", 1, 2)).unwrap();

        assert!(!snapshot.is_present("like"));
        assert!(shared.snapshot().is_present("like"));
    }

    #[test]
    fn test_shared_catalog_across_threads() {
        let shared = SharedCatalog::default();
        let writer = shared.clone();
        std::thread::spawn(move || {
            writer.update(|c| c.record_click("like", 7, 8)).unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(shared.snapshot().get("like"), Some(&Action::click("like", 7, 8)));
    }
}
