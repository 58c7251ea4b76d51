use crate::item::{GenerationItem, ItemId, ItemStatus};
use crate::lightbox::LightboxView;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GalleryViewModel {
    pub items: Vec<ItemCardView>,
    pub selection_mode: bool,
    pub selected_count: usize,
    pub generating_count: usize,
    pub lightbox: Option<LightboxView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCardView {
    pub id: ItemId,
    pub prompt: String,
    pub status: ItemStatus,
    pub media_url: Option<String>,
    /// Short tag line, e.g. `3:2 · 6s · 1520ms`.
    pub tags: String,
    pub selected: bool,
}

impl ItemCardView {
    pub(crate) fn from_item(item: &GenerationItem, selected: bool) -> Self {
        let mut tags = format!(
            "{} · {}s",
            item.params.aspect_ratio.as_str(),
            item.params.video_length.seconds()
        );
        if item.elapsed_ms > 0 {
            tags.push_str(&format!(" · {}ms", item.elapsed_ms));
        }
        Self {
            id: item.id.clone(),
            prompt: item.prompt.clone(),
            status: item.status,
            media_url: match item.status {
                ItemStatus::Done => item.media_url(),
                _ => None,
            },
            tags,
            selected,
        }
    }
}
