//! # Item cache — the client-side mirror of one owner's rows
//!
//! [`ItemCache`] is an ordered, read-through mirror of the rows the hosted
//! table holds for the current user. It is populated wholesale by the bulk
//! read on login ([`replace_all`](ItemCache::replace_all)), patched
//! incrementally by live-update notifications ([`apply`](ItemCache::apply)),
//! and emptied on logout ([`clear`](ItemCache::clear)).
//!
//! Change application is identifier-based only:
//!
//! - insert → append, unless a row with that id is already present
//! - update → replace the row with that id; no-op when absent
//! - delete → remove the row with that id
//!
//! Notifications are applied in delivery order; the cache does no reordering
//! or deduplication beyond the id checks above.

use crate::models::{Item, RowChange};

/// Ordered collection mirroring the current user's slice of the items table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemCache {
    items: Vec<Item>,
}

impl ItemCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole cache with the result of a bulk read.
    pub fn replace_all(&mut self, items: Vec<Item>) {
        self.items = items;
    }

    /// Apply one live-update notification.
    pub fn apply(&mut self, change: RowChange) {
        match change {
            RowChange::Insert { row } => {
                if !self.items.iter().any(|item| item.id == row.id) {
                    self.items.push(row);
                }
            }
            RowChange::Update { row } => {
                if let Some(slot) = self.items.iter_mut().find(|item| item.id == row.id) {
                    *slot = row;
                }
            }
            RowChange::Delete { id } => {
                self.items.retain(|item| item.id != id);
            }
        }
    }

    /// Empty the cache (on leaving the authenticated state).
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, name: &str) -> Item {
        Item {
            id: id.to_string(),
            name: name.to_string(),
            owner_id: "u1".to_string(),
        }
    }

    /// Reference semantics: replay the same operations against a plain Vec.
    fn replay(changes: &[RowChange]) -> Vec<Item> {
        let mut rows: Vec<Item> = Vec::new();
        for change in changes {
            match change {
                RowChange::Insert { row } => {
                    if !rows.iter().any(|r| r.id == row.id) {
                        rows.push(row.clone());
                    }
                }
                RowChange::Update { row } => {
                    if let Some(slot) = rows.iter_mut().find(|r| r.id == row.id) {
                        *slot = row.clone();
                    }
                }
                RowChange::Delete { id } => rows.retain(|r| &r.id != id),
            }
        }
        rows
    }

    #[test]
    fn matches_replay_reference() {
        let changes = vec![
            RowChange::Insert { row: item("a", "one") },
            RowChange::Insert { row: item("b", "two") },
            RowChange::Insert { row: item("a", "one again") },
            RowChange::Update { row: item("b", "two renamed") },
            RowChange::Delete { id: "a".to_string() },
            RowChange::Update { row: item("a", "ghost") },
            RowChange::Insert { row: item("c", "three") },
            RowChange::Delete { id: "missing".to_string() },
        ];

        let mut cache = ItemCache::new();
        for change in &changes {
            cache.apply(change.clone());
        }

        assert_eq!(cache.items(), replay(&changes).as_slice());
    }

    #[test]
    fn insert_into_empty_cache_yields_one_row() {
        let mut cache = ItemCache::new();
        cache.apply(RowChange::Insert { row: item("a", "one") });
        assert_eq!(cache.items(), &[item("a", "one")]);
    }

    #[test]
    fn insert_is_deduplicated_by_id() {
        let mut cache = ItemCache::new();
        cache.apply(RowChange::Insert { row: item("a", "first") });
        cache.apply(RowChange::Insert { row: item("a", "echo") });
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.items()[0].name, "first");
    }

    #[test]
    fn update_replaces_in_place_preserving_order() {
        let mut cache = ItemCache::new();
        cache.replace_all(vec![item("a", "one"), item("b", "two"), item("c", "three")]);
        cache.apply(RowChange::Update { row: item("b", "renamed") });
        let names: Vec<&str> = cache.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["one", "renamed", "three"]);
    }

    #[test]
    fn update_for_unknown_id_is_a_noop() {
        let mut cache = ItemCache::new();
        cache.apply(RowChange::Update { row: item("nope", "x") });
        assert!(cache.is_empty());
    }

    #[test]
    fn delete_removes_by_id() {
        let mut cache = ItemCache::new();
        cache.replace_all(vec![item("a", "one"), item("b", "two")]);
        cache.apply(RowChange::Delete { id: "a".to_string() });
        assert_eq!(cache.items(), &[item("b", "two")]);
    }

    #[test]
    fn clear_empties_regardless_of_prior_state() {
        let mut cache = ItemCache::new();
        cache.replace_all(vec![item("a", "one"), item("b", "two")]);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn replace_all_discards_previous_contents() {
        let mut cache = ItemCache::new();
        cache.replace_all(vec![item("a", "one")]);
        cache.replace_all(vec![item("b", "two")]);
        assert_eq!(cache.items(), &[item("b", "two")]);
    }
}
