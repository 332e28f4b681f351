//! Interning of caller keys to dense node ids.

use super::native::NodeId;
use rustc_hash::FxHashMap;

/// Bidirectional key <-> [`NodeId`] mapping. Ids follow insertion order.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyMap {
    ids: FxHashMap<String, NodeId>,
    keys: Vec<String>,
}

impl KeyMap {
    pub(crate) fn id(&self, key: &str) -> Option<NodeId> {
        self.ids.get(key).copied()
    }

    pub(crate) fn key(&self, id: NodeId) -> Option<&str> {
        self.keys.get(id).map(String::as_str)
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.ids.contains_key(key)
    }

    /// Id the next interned key will receive.
    pub(crate) fn next_id(&self) -> NodeId {
        self.keys.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    /// Interns `key`, returning its id. Callers check for duplicates first.
    pub(crate) fn push(&mut self, key: &str) -> NodeId {
        let id = self.keys.len();
        self.ids.insert(key.to_string(), id);
        self.keys.push(key.to_string());
        id
    }
}
