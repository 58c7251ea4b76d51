use std::collections::HashSet;

use crate::item::{GenerationItem, ItemId, ItemOutcome, ItemStatus};

/// Newest-first sequence of items, unique by id.
///
/// Items are only ever prepended, finalized in place or removed; existing
/// items are never reordered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemList {
    items: Vec<GenerationItem>,
}

impl ItemList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a restored snapshot (already newest-first). Later
    /// duplicates of an id are dropped.
    pub fn from_items(items: Vec<GenerationItem>) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .collect();
        Self { items }
    }

    /// Insert at the head. Returns `false` if the id is already present.
    pub fn prepend(&mut self, item: GenerationItem) -> bool {
        if self.contains(&item.id) {
            return false;
        }
        self.items.insert(0, item);
        true
    }

    /// Finalize the item with `id`. Returns `false` if it is missing or
    /// already terminal.
    pub fn finalize(&mut self, id: &ItemId, outcome: ItemOutcome) -> bool {
        self.items
            .iter_mut()
            .find(|item| &item.id == id)
            .is_some_and(|item| item.finalize(outcome))
    }

    /// Remove every item whose id is in `ids`; returns how many were removed.
    pub fn remove(&mut self, ids: &HashSet<ItemId>) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !ids.contains(&item.id));
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, id: &ItemId) -> Option<&GenerationItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenerationItem> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[GenerationItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn generating_count(&self) -> usize {
        self.count_with(ItemStatus::Generating)
    }

    pub fn count_with(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|item| item.status == status).count()
    }

    /// Completed items with a resolvable media URL, in list order.
    pub fn displayable(&self) -> impl Iterator<Item = &GenerationItem> {
        self.items.iter().filter(|item| item.is_displayable())
    }
}
