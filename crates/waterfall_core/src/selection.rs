use std::collections::{BTreeSet, HashSet};

use crate::item::{ItemId, ItemStatus};
use crate::list::ItemList;

/// Batch-selection mode plus the ids marked in it.
///
/// Every selected id exists in the item list it was built against; the set is
/// empty whenever the mode is off.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    active: bool,
    selected: BTreeSet<ItemId>,
}

impl Selection {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.selected.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.selected.iter()
    }

    pub fn to_set(&self) -> HashSet<ItemId> {
        self.selected.iter().cloned().collect()
    }

    /// Turn the mode on, dropping any previous selection.
    pub fn enter(&mut self) {
        self.active = true;
        self.selected.clear();
    }

    pub fn exit(&mut self) {
        self.active = false;
        self.selected.clear();
    }

    /// Flip membership of `id`. Toggling outside selection mode enters it
    /// first. Emptying the set leaves selection mode. Unknown ids are ignored.
    pub fn toggle(&mut self, id: &ItemId, items: &ItemList) -> bool {
        if !items.contains(id) {
            return false;
        }
        if !self.active {
            self.enter();
        }
        if !self.selected.remove(id) {
            self.selected.insert(id.clone());
        }
        if self.selected.is_empty() {
            self.exit();
        }
        true
    }

    /// Add every `done` item; generating and failed items are not selectable.
    /// Enters selection mode if it is off. Returns how many ids were added.
    pub fn select_all(&mut self, items: &ItemList) -> usize {
        if !self.active {
            self.enter();
        }
        let before = self.selected.len();
        self.selected.extend(
            items
                .iter()
                .filter(|item| item.status == ItemStatus::Done)
                .map(|item| item.id.clone()),
        );
        self.selected.len() - before
    }

    /// Drop ids whose items no longer exist.
    pub fn retain_existing(&mut self, items: &ItemList) {
        self.selected.retain(|id| items.contains(id));
    }
}
