use std::collections::HashSet;

use pretty_assertions::assert_eq;
use waterfall_core::{
    update, Effect, GalleryState, GenerationItem, GenerationParams, ItemId, ItemList, ItemOutcome,
    ItemStatus, Msg,
};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn generating(id: &str) -> GenerationItem {
    GenerationItem::generating(ItemId::new(id), "a red fox", GenerationParams::default(), 1)
}

#[test]
fn prepend_keeps_newest_first() {
    init_logging();
    let mut list = ItemList::new();
    let ids: Vec<String> = (0..8).map(|n| format!("item-{n}")).collect();
    for id in &ids {
        assert!(list.prepend(generating(id)));
    }

    let order: Vec<&str> = list.iter().map(|item| item.id.as_str()).collect();
    let expected: Vec<&str> = ids.iter().rev().map(String::as_str).collect();
    assert_eq!(order, expected);
}

#[test]
fn duplicate_ids_are_rejected() {
    init_logging();
    let mut list = ItemList::new();
    assert!(list.prepend(generating("a")));
    assert!(list.prepend(generating("b")));
    assert!(!list.prepend(generating("a")));

    let unique: HashSet<_> = list.iter().map(|item| item.id.clone()).collect();
    assert_eq!(unique.len(), list.len());
    assert_eq!(list.len(), 2);
}

#[test]
fn restored_duplicates_keep_first_occurrence() {
    let mut newer = generating("a");
    newer.prompt = "newer".to_string();
    let list = ItemList::from_items(vec![newer, generating("b"), generating("a")]);

    assert_eq!(list.len(), 2);
    assert_eq!(list.get(&ItemId::new("a")).unwrap().prompt, "newer");
}

#[test]
fn started_and_finished_items_request_persistence() {
    init_logging();
    let (mut state, effects) = update(GalleryState::new(), Msg::ItemStarted(generating("a")));
    assert_eq!(effects, vec![Effect::PersistItems]);
    assert!(state.consume_dirty());
    assert_eq!(state.view().generating_count, 1);

    let (mut state, effects) = update(
        state,
        Msg::ItemFinished {
            id: ItemId::new("a"),
            outcome: ItemOutcome::Completed {
                content: "https://cdn.example.com/a.mp4".to_string(),
                elapsed_ms: 1500,
            },
        },
    );
    assert_eq!(effects, vec![Effect::PersistItems]);
    assert!(state.consume_dirty());

    let view = state.view();
    assert_eq!(view.generating_count, 0);
    assert_eq!(view.items[0].status, ItemStatus::Done);
    assert_eq!(view.items[0].tags, "3:2 · 6s · 1500ms");
    assert_eq!(
        view.items[0].media_url.as_deref(),
        Some("https://cdn.example.com/a.mp4")
    );
}

#[test]
fn finishing_an_unknown_or_terminal_item_is_ignored() {
    init_logging();
    let (state, _) = update(GalleryState::new(), Msg::ItemStarted(generating("a")));
    let (state, _) = update(
        state,
        Msg::ItemFinished {
            id: ItemId::new("a"),
            outcome: ItemOutcome::Failed { elapsed_ms: 10 },
        },
    );
    let (mut state, effects) = update(
        state,
        Msg::ItemFinished {
            id: ItemId::new("a"),
            outcome: ItemOutcome::Completed {
                content: "https://late.example.com/v.mp4".to_string(),
                elapsed_ms: 20,
            },
        },
    );
    assert!(effects.is_empty());
    assert!(state.consume_dirty());
    let (mut state, effects) = update(
        state,
        Msg::ItemFinished {
            id: ItemId::new("missing"),
            outcome: ItemOutcome::Failed { elapsed_ms: 1 },
        },
    );
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
    assert_eq!(state.items().count_with(ItemStatus::Error), 1);
}

#[test]
fn clear_empties_list_and_selection() {
    init_logging();
    let (state, _) = update(GalleryState::new(), Msg::ItemStarted(generating("a")));
    let (state, _) = update(state, Msg::SelectionToggled(ItemId::new("a")));
    assert!(state.selection().is_active());

    let (state, effects) = update(state, Msg::ClearClicked);
    assert!(state.items().is_empty());
    assert!(!state.selection().is_active());
    assert!(state.selection().is_empty());
    assert_eq!(effects[0], Effect::PersistItems);
    assert!(matches!(effects.last(), Some(Effect::Notify { .. })));
}
