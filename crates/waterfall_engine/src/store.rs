use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use engine_logging::{engine_debug, engine_info};
use waterfall_core::{
    update, Effect, GalleryState, GalleryViewModel, GenerationItem, ItemId, ItemOutcome,
    ItemStatus, Msg,
};

use crate::persist::{ItemPersistence, SaveOutcome};
use crate::sink::EventSink;
use crate::{EngineEvent, Notification, StoreChange};

/// Shared, persisted item list.
///
/// Cloning yields another handle to the same list. Every operation runs one
/// `update` step under a single lock, persists inside that same step when the
/// list changed, and then publishes a change event. No caller ever sees the
/// list half-way through a mutation.
#[derive(Clone)]
pub struct ItemStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: Mutex<GalleryState>,
    persistence: ItemPersistence,
    sink: Arc<dyn EventSink>,
}

impl ItemStore {
    pub fn new(persistence: ItemPersistence, sink: Arc<dyn EventSink>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(GalleryState::new()),
                persistence,
                sink,
            }),
        }
    }

    /// Replace the in-memory list with the persisted snapshot.
    ///
    /// Items persisted while still generating belong to a session that is
    /// gone; they come back as errors so nothing waits on them.
    pub fn load(&self) -> usize {
        let mut items = self.inner.persistence.load();
        let mut interrupted = 0;
        for item in items.iter_mut().filter(|i| i.status == ItemStatus::Generating) {
            item.status = ItemStatus::Error;
            interrupted += 1;
        }
        let count = items.len();
        self.apply(Msg::ItemsRestored(items), StoreChange::Restored);
        if interrupted > 0 {
            engine_info!("Marked {} interrupted items as failed", interrupted);
            self.save();
        }
        count
    }

    /// Write the current list to storage.
    pub fn save(&self) -> SaveOutcome {
        let state = self.lock();
        self.inner.persistence.save(state.items().as_slice())
    }

    /// Insert a new item at the head of the list.
    pub fn append(&self, item: GenerationItem) {
        let id = item.id.clone();
        self.apply(Msg::ItemStarted(item), StoreChange::Appended(id));
    }

    /// Finalize one in-flight item by id.
    pub fn update(&self, id: &ItemId, outcome: ItemOutcome) {
        self.apply(
            Msg::ItemFinished {
                id: id.clone(),
                outcome,
            },
            StoreChange::Updated(id.clone()),
        );
    }

    pub fn remove(&self, ids: &HashSet<ItemId>) {
        let ids: Vec<ItemId> = ids.iter().cloned().collect();
        self.apply(Msg::ItemsRemoved(ids.clone()), StoreChange::Removed(ids));
    }

    /// Empty the list. Stopping a running engine first is the caller's job.
    pub fn clear(&self) -> Vec<Effect> {
        self.dispatch(Msg::ClearClicked)
    }

    /// Apply a gallery message (selection, batch, lightbox). Persistence and
    /// notifications are handled here; the remaining effects (downloads,
    /// media release) are returned for the caller to run.
    pub fn dispatch(&self, msg: Msg) -> Vec<Effect> {
        let change = match &msg {
            Msg::ItemsRestored(_) => StoreChange::Restored,
            Msg::ItemStarted(item) => StoreChange::Appended(item.id.clone()),
            Msg::ItemFinished { id, .. } => StoreChange::Updated(id.clone()),
            Msg::ItemsRemoved(ids) => StoreChange::Removed(ids.clone()),
            Msg::ClearClicked => StoreChange::Cleared,
            Msg::DeleteSelectedClicked => {
                let ids = self.lock().selection().ids().cloned().collect();
                StoreChange::Removed(ids)
            }
            _ => StoreChange::Gallery,
        };
        self.apply(msg, change)
    }

    pub fn snapshot(&self) -> Vec<GenerationItem> {
        self.lock().snapshot()
    }

    pub fn get(&self, id: &ItemId) -> Option<GenerationItem> {
        self.lock().items().get(id).cloned()
    }

    pub fn view(&self) -> GalleryViewModel {
        self.lock().view()
    }

    pub fn len(&self) -> usize {
        self.lock().items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn generating_count(&self) -> usize {
        self.lock().items().generating_count()
    }

    fn apply(&self, msg: Msg, change: StoreChange) -> Vec<Effect> {
        let (changed, effects) = {
            let mut guard = self.lock();
            let state = std::mem::take(&mut *guard);
            let (mut state, effects) = update(state, msg);
            let changed = state.consume_dirty();
            if effects.contains(&Effect::PersistItems) {
                self.inner.persistence.save(state.items().as_slice());
            }
            *guard = state;
            (changed, effects)
        };

        if changed {
            engine_debug!("Item store changed: {:?}", change);
            self.inner.sink.emit(EngineEvent::ItemsChanged(change));
        }

        effects
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::PersistItems => None,
                Effect::Notify { message, severity } => {
                    self.inner
                        .sink
                        .emit(EngineEvent::Notify(Notification::new(message, severity)));
                    None
                }
                other => Some(other),
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, GalleryState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
