//! Waterfall core: pure item model, gallery state machine and view-model helpers.
mod effect;
mod item;
mod lightbox;
mod list;
mod media;
mod msg;
mod params;
mod selection;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Severity};
pub use item::{ContentKind, GenerationItem, ItemId, ItemOutcome, ItemStatus};
pub use lightbox::{Lightbox, LightboxView};
pub use list::ItemList;
pub use media::{
    compact_content, extract_media_url, infer_content_kind, CompactedContent, COMPACT_THRESHOLD,
};
pub use msg::Msg;
pub use params::{AspectRatio, GenerationParams, ParamsError, Preset, Resolution, VideoLength};
pub use selection::Selection;
pub use state::GalleryState;
pub use update::update;
pub use view_model::{GalleryViewModel, ItemCardView};
