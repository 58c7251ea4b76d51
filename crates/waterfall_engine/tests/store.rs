use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use waterfall_core::{
    Effect, GenerationItem, GenerationParams, ItemId, ItemOutcome, ItemStatus, Msg, Severity,
};
use waterfall_engine::{
    EngineEvent, EventSink, ItemPersistence, ItemStore, MemoryStorage, Notification,
    PersistSettings, StoreChange,
};

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn store_with(storage: Arc<MemoryStorage>) -> (ItemStore, Arc<TestSink>) {
    let sink = Arc::new(TestSink::default());
    let persistence = ItemPersistence::new(storage, PersistSettings::default());
    (ItemStore::new(persistence, sink.clone()), sink)
}

fn generating(id: &str) -> GenerationItem {
    GenerationItem::generating(ItemId::new(id), "prompt", GenerationParams::default(), 0)
}

fn completed(url: &str) -> ItemOutcome {
    ItemOutcome::Completed {
        content: url.to_string(),
        elapsed_ms: 10,
    }
}

#[test]
fn append_and_update_persist_and_signal() {
    let storage = Arc::new(MemoryStorage::new());
    let (store, sink) = store_with(storage.clone());

    store.append(generating("a"));
    store.update(&ItemId::new("a"), completed("https://cdn.example/a.mp4"));

    assert_eq!(
        sink.take(),
        vec![
            EngineEvent::ItemsChanged(StoreChange::Appended(ItemId::new("a"))),
            EngineEvent::ItemsChanged(StoreChange::Updated(ItemId::new("a"))),
        ]
    );

    let (reloaded, _) = store_with(storage);
    assert_eq!(reloaded.load(), 1);
    assert_eq!(
        reloaded.get(&ItemId::new("a")).unwrap().status,
        ItemStatus::Done
    );
}

#[test]
fn new_items_go_to_the_head() {
    let (store, _) = store_with(Arc::new(MemoryStorage::new()));
    store.append(generating("first"));
    store.append(generating("second"));
    let ids: Vec<_> = store.snapshot().into_iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![ItemId::new("second"), ItemId::new("first")]);
    assert_eq!(store.generating_count(), 2);
}

#[test]
fn load_marks_interrupted_items_failed() {
    let storage = Arc::new(MemoryStorage::new());
    let (store, _) = store_with(storage.clone());
    store.append(generating("in-flight"));

    let (restored, sink) = store_with(storage.clone());
    assert_eq!(restored.load(), 1);
    assert_eq!(
        restored.get(&ItemId::new("in-flight")).unwrap().status,
        ItemStatus::Error
    );
    assert_eq!(restored.generating_count(), 0);
    assert_eq!(
        sink.take(),
        vec![EngineEvent::ItemsChanged(StoreChange::Restored)]
    );

    let persisted = ItemPersistence::new(storage, PersistSettings::default()).load();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].status, ItemStatus::Error);
}

#[test]
fn remove_drops_only_named_ids() {
    let (store, _) = store_with(Arc::new(MemoryStorage::new()));
    store.append(generating("a"));
    store.append(generating("b"));
    store.append(generating("c"));

    let ids: HashSet<_> = [ItemId::new("a"), ItemId::new("c"), ItemId::new("zzz")]
        .into_iter()
        .collect();
    store.remove(&ids);

    assert_eq!(store.len(), 1);
    assert!(store.get(&ItemId::new("b")).is_some());
}

#[test]
fn delete_selected_notifies_through_the_sink() {
    let (store, sink) = store_with(Arc::new(MemoryStorage::new()));
    store.append(generating("a"));
    store.update(&ItemId::new("a"), completed("https://cdn.example/a.mp4"));
    store.append(generating("b"));
    sink.take();

    store.dispatch(Msg::SelectAllClicked);
    let effects = store.dispatch(Msg::DeleteSelectedClicked);

    assert!(effects.is_empty());
    assert_eq!(store.len(), 1);
    assert!(!store.view().selection_mode);
    let events = sink.take();
    assert!(events.contains(&EngineEvent::ItemsChanged(StoreChange::Removed(vec![
        ItemId::new("a")
    ]))));
    assert!(events.contains(&EngineEvent::Notify(Notification::new(
        "Deleted 1 items",
        Severity::Success
    ))));
}

#[test]
fn download_selected_returns_download_effects() {
    let (store, _) = store_with(Arc::new(MemoryStorage::new()));
    store.append(generating("a"));
    store.update(&ItemId::new("a"), completed("https://cdn.example/a.mp4"));

    store.dispatch(Msg::SelectionToggled(ItemId::new("a")));
    let effects = store.dispatch(Msg::DownloadSelectedClicked);

    assert_eq!(
        effects,
        vec![Effect::Download {
            url: "https://cdn.example/a.mp4".to_string(),
            prompt: "prompt".to_string(),
        }]
    );
}

#[test]
fn clear_empties_and_persists() {
    let storage = Arc::new(MemoryStorage::new());
    let (store, sink) = store_with(storage.clone());
    store.append(generating("a"));
    sink.take();

    let effects = store.clear();
    assert!(effects.is_empty());
    assert!(store.is_empty());
    assert_eq!(
        sink.take(),
        vec![
            EngineEvent::ItemsChanged(StoreChange::Cleared),
            EngineEvent::Notify(Notification::new("Cleared all items", Severity::Success)),
        ]
    );

    let (reloaded, _) = store_with(storage);
    assert_eq!(reloaded.load(), 0);
}
