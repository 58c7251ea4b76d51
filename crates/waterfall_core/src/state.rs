use crate::item::GenerationItem;
use crate::lightbox::Lightbox;
use crate::list::ItemList;
use crate::selection::Selection;
use crate::view_model::{GalleryViewModel, ItemCardView};

/// Everything the gallery shows: the item list plus selection and lightbox
/// state layered on top of it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GalleryState {
    items: ItemList,
    selection: Selection,
    lightbox: Lightbox,
    dirty: bool,
}

impl GalleryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &ItemList {
        &self.items
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    /// Owned copy of the list, newest-first.
    pub fn snapshot(&self) -> Vec<GenerationItem> {
        self.items.as_slice().to_vec()
    }

    pub fn view(&self) -> GalleryViewModel {
        let items = self
            .items
            .iter()
            .map(|item| ItemCardView::from_item(item, self.selection.contains(&item.id)))
            .collect();
        GalleryViewModel {
            items,
            selection_mode: self.selection.is_active(),
            selected_count: self.selection.len(),
            generating_count: self.items.generating_count(),
            lightbox: self.lightbox.view(&self.items),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut ItemList, &mut Selection, &mut Lightbox) {
        (&mut self.items, &mut self.selection, &mut self.lightbox)
    }
}
