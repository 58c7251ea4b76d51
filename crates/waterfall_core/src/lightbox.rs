use crate::item::{GenerationItem, ItemId};
use crate::list::ItemList;

/// Full-screen navigation over the displayable items.
///
/// The domain sequence (done items with a media URL, in list order) is
/// recomputed from the list on every call, so the stored index is clamped
/// rather than trusted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lightbox {
    index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightboxView {
    pub item_id: ItemId,
    pub media_url: String,
    pub prompt: String,
    /// Zero-based index into the domain sequence.
    pub index: usize,
    pub total: usize,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

impl LightboxView {
    /// `"{index + 1} / {total}"`
    pub fn counter(&self) -> String {
        format!("{} / {}", self.index + 1, self.total)
    }
}

impl Lightbox {
    pub fn is_open(&self) -> bool {
        self.index.is_some()
    }

    /// Open on `id`. A no-op when the item is not displayable.
    pub fn open(&mut self, id: &ItemId, items: &ItemList) -> bool {
        match domain(items).iter().position(|item| &item.id == id) {
            Some(position) => {
                self.index = Some(position);
                true
            }
            None => false,
        }
    }

    pub fn prev(&mut self, items: &ItemList) -> bool {
        match self.current(items) {
            Some(index) if index > 0 => {
                self.index = Some(index - 1);
                true
            }
            _ => false,
        }
    }

    pub fn next(&mut self, items: &ItemList) -> bool {
        let total = domain(items).len();
        match self.current(items) {
            Some(index) if index + 1 < total => {
                self.index = Some(index + 1);
                true
            }
            _ => false,
        }
    }

    /// Returns whether the lightbox was open.
    pub fn close(&mut self) -> bool {
        self.index.take().is_some()
    }

    pub fn view(&self, items: &ItemList) -> Option<LightboxView> {
        let index = self.current(items)?;
        let domain = domain(items);
        let item = domain.get(index)?;
        Some(LightboxView {
            item_id: item.id.clone(),
            media_url: item.media_url()?,
            prompt: item.prompt.clone(),
            index,
            total: domain.len(),
            prev_enabled: index > 0,
            next_enabled: index + 1 < domain.len(),
        })
    }

    fn current(&self, items: &ItemList) -> Option<usize> {
        let index = self.index?;
        let total = domain(items).len();
        if total == 0 {
            return None;
        }
        Some(index.min(total - 1))
    }
}

fn domain(items: &ItemList) -> Vec<&GenerationItem> {
    items.displayable().collect()
}
