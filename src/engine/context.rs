//! Per-run build state: the item set, snapshot cache, and tag index.
//!
//! All cross-item state lives in an explicit [`BuildContext`] constructed at
//! the start of a run and dropped at the end. Compiler steps receive a
//! borrowed handle rather than reaching into globals, and a rule's declared
//! [`DataAccess`] tells the scheduler whether the chain may read beyond its
//! own item.

use crate::engine::error::BuildError;
use crate::engine::item::Item;
use crate::engine::pattern::Identifier;
use crate::tags::TagIndex;
use anyhow::{Result, anyhow};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::{Arc, OnceLock};

/// Declared data dependency of a rule's compiler chain.
///
/// `SelfOnly` chains read nothing beyond their own item and may run in any
/// order, in parallel. `FullSet` chains read other items' snapshots or the
/// tag index and are scheduled only after every producer has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataAccess {
    SelfOnly,
    FullSet,
}

/// Named captures of item content at points in their chains.
///
/// At most one compute per (item, name) pair per run: `capture` stores,
/// `load` is a pure lookup and never recomputes.
#[derive(Default)]
pub struct SnapshotStore {
    inner: RwLock<FxHashMap<(Identifier, String), Arc<str>>>,
}

impl SnapshotStore {
    /// Capture `content` under `name`; re-capturing the same name overwrites.
    pub fn capture(&self, id: &Identifier, name: &str, content: &str) {
        self.inner
            .write()
            .insert((id.clone(), name.to_owned()), Arc::from(content));
    }

    /// Look up a capture. A missing snapshot is a build-ordering violation,
    /// never a silent default.
    pub fn load(&self, id: &Identifier, name: &str) -> Result<Arc<str>, BuildError> {
        self.inner
            .read()
            .get(&(id.clone(), name.to_owned()))
            .cloned()
            .ok_or_else(|| BuildError::SnapshotNotFound {
                id: id.clone(),
                name: name.to_owned(),
            })
    }
}

/// Build-scoped state handed to every compiler invocation.
pub struct BuildContext {
    items: Vec<Arc<Item>>,
    routes: FxHashMap<Identifier, String>,
    snapshots: SnapshotStore,
    tags: OnceLock<TagIndex>,
}

impl BuildContext {
    /// `routes` maps each routed item to its planned output path, fixed
    /// before compilation starts.
    pub fn new(items: Vec<Arc<Item>>, routes: FxHashMap<Identifier, String>) -> Self {
        Self {
            items,
            routes,
            snapshots: SnapshotStore::default(),
            tags: OnceLock::new(),
        }
    }

    /// All discovered items, in discovery order.
    pub fn items(&self) -> &[Arc<Item>] {
        &self.items
    }

    /// Planned output route of an item, when it has one.
    pub fn route_of(&self, id: &Identifier) -> Option<&str> {
        self.routes.get(id).map(String::as_str)
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Install the tag index between the producer and aggregation phases.
    pub fn set_tags(&self, index: TagIndex) {
        let _ = self.tags.set(index);
    }

    /// The tag index; erroring before the aggregation phase has installed it.
    pub fn tags(&self) -> Result<&TagIndex> {
        self.tags
            .get()
            .ok_or_else(|| anyhow!("tag index requested before the aggregation phase"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::metadata::Metadata;

    fn item(id: &str) -> Arc<Item> {
        Arc::new(Item::new(
            Identifier::new(id),
            String::new(),
            Metadata::new(),
        ))
    }

    #[test]
    fn test_snapshot_capture_then_load_is_idempotent() {
        let store = SnapshotStore::default();
        let id = Identifier::new("posts/a.md");

        store.capture(&id, "content", "<p>hi</p>");
        assert_eq!(&*store.load(&id, "content").unwrap(), "<p>hi</p>");
        // Loading again returns the same capture; nothing is recomputed.
        assert_eq!(&*store.load(&id, "content").unwrap(), "<p>hi</p>");
    }

    #[test]
    fn test_snapshot_recapture_overwrites() {
        let store = SnapshotStore::default();
        let id = Identifier::new("posts/a.md");

        store.capture(&id, "content", "first");
        store.capture(&id, "content", "second");
        assert_eq!(&*store.load(&id, "content").unwrap(), "second");
    }

    #[test]
    fn test_snapshot_missing_is_ordering_error() {
        let store = SnapshotStore::default();
        let id = Identifier::new("posts/a.md");

        let err = store.load(&id, "content").unwrap_err();
        assert!(matches!(err, BuildError::SnapshotNotFound { .. }));
    }

    #[test]
    fn test_snapshot_names_are_scoped_per_item() {
        let store = SnapshotStore::default();
        let a = Identifier::new("posts/a.md");
        let b = Identifier::new("posts/b.md");

        store.capture(&a, "content", "from a");
        assert!(store.load(&b, "content").is_err());
    }

    #[test]
    fn test_tags_before_aggregation_phase_errors() {
        let ctx = BuildContext::new(vec![item("posts/a.md")], FxHashMap::default());
        assert!(ctx.tags().is_err());
    }
}
