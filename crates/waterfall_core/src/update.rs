use std::collections::HashSet;

use crate::item::ItemStatus;
use crate::list::ItemList;
use crate::selection::Selection;
use crate::{Effect, GalleryState, Msg, Severity};

/// Pure update function: applies a message to state and returns any effects.
///
/// Each call is one atomic step over the list; callers sharing the state
/// across tasks serialize calls behind a single lock.
pub fn update(mut state: GalleryState, msg: Msg) -> (GalleryState, Vec<Effect>) {
    let mut dirty = false;
    let effects = {
        let (items, selection, lightbox) = state.parts_mut();
        match msg {
            Msg::ItemsRestored(restored) => {
                *items = ItemList::from_items(restored);
                selection.retain_existing(items);
                dirty = true;
                Vec::new()
            }
            Msg::ItemStarted(item) => {
                if items.prepend(item) {
                    dirty = true;
                    vec![Effect::PersistItems]
                } else {
                    Vec::new()
                }
            }
            Msg::ItemFinished { id, outcome } => {
                if items.finalize(&id, outcome) {
                    dirty = true;
                    vec![Effect::PersistItems]
                } else {
                    Vec::new()
                }
            }
            Msg::ItemsRemoved(ids) => {
                let ids: HashSet<_> = ids.into_iter().collect();
                let removed = items.remove(&ids);
                selection.retain_existing(items);
                if selection.is_empty() && selection.is_active() {
                    selection.exit();
                }
                if removed > 0 {
                    dirty = true;
                    vec![Effect::PersistItems]
                } else {
                    Vec::new()
                }
            }
            Msg::ClearClicked => {
                items.clear();
                selection.exit();
                let mut effects = vec![Effect::PersistItems];
                if lightbox.close() {
                    effects.push(Effect::ReleaseMedia);
                }
                effects.push(Effect::notify("Cleared all items", Severity::Success));
                dirty = true;
                effects
            }
            Msg::SelectionModeEntered => {
                selection.enter();
                dirty = true;
                Vec::new()
            }
            Msg::SelectionModeExited => {
                selection.exit();
                dirty = true;
                Vec::new()
            }
            Msg::SelectionToggled(id) => {
                if selection.toggle(&id, items) {
                    dirty = true;
                }
                Vec::new()
            }
            Msg::SelectAllClicked => {
                selection.select_all(items);
                dirty = true;
                Vec::new()
            }
            Msg::DeleteSelectedClicked => {
                if selection.is_empty() {
                    Vec::new()
                } else {
                    let removed = items.remove(&selection.to_set());
                    selection.exit();
                    dirty = true;
                    vec![
                        Effect::PersistItems,
                        Effect::notify(format!("Deleted {removed} items"), Severity::Success),
                    ]
                }
            }
            Msg::DownloadSelectedClicked => download_selected(items, selection),
            Msg::LightboxOpened(id) => {
                if lightbox.open(&id, items) {
                    dirty = true;
                }
                Vec::new()
            }
            Msg::LightboxPrevClicked => {
                if lightbox.prev(items) {
                    dirty = true;
                }
                Vec::new()
            }
            Msg::LightboxNextClicked => {
                if lightbox.next(items) {
                    dirty = true;
                }
                Vec::new()
            }
            Msg::LightboxClosed => {
                if lightbox.close() {
                    dirty = true;
                    vec![Effect::ReleaseMedia]
                } else {
                    Vec::new()
                }
            }
            Msg::NoOp => Vec::new(),
        }
    };

    if dirty {
        state.mark_dirty();
    }
    (state, effects)
}

fn download_selected(items: &ItemList, selection: &Selection) -> Vec<Effect> {
    let downloads: Vec<Effect> = items
        .iter()
        .filter(|item| selection.contains(&item.id) && item.status == ItemStatus::Done)
        .filter_map(|item| {
            item.media_url().map(|url| Effect::Download {
                url,
                prompt: item.prompt.clone(),
            })
        })
        .collect();

    if downloads.is_empty() {
        return vec![Effect::notify("Nothing to download", Severity::Warning)];
    }

    let message = format!("Downloading {} items", downloads.len());
    let mut effects = downloads;
    effects.push(Effect::notify(message, Severity::Success));
    effects
}
