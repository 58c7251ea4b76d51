use pretty_assertions::assert_eq;
use waterfall_core::{
    update, Effect, GalleryState, GenerationItem, GenerationParams, ItemId, ItemOutcome, Msg,
    Severity,
};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn start(state: GalleryState, id: &str, prompt: &str) -> GalleryState {
    let item =
        GenerationItem::generating(ItemId::new(id), prompt, GenerationParams::default(), 1);
    update(state, Msg::ItemStarted(item)).0
}

fn finish(state: GalleryState, id: &str, content: Option<&str>) -> GalleryState {
    let outcome = match content {
        Some(content) => ItemOutcome::Completed {
            content: content.to_string(),
            elapsed_ms: 100,
        },
        None => ItemOutcome::Failed { elapsed_ms: 100 },
    };
    update(
        state,
        Msg::ItemFinished {
            id: ItemId::new(id),
            outcome,
        },
    )
    .0
}

/// List (newest-first): generating, error, done.
fn mixed_state() -> GalleryState {
    let state = start(GalleryState::new(), "done", "sunset");
    let state = finish(state, "done", Some("https://cdn.example.com/done.mp4"));
    let state = start(state, "error", "storm");
    let state = finish(state, "error", None);
    start(state, "generating", "rain")
}

fn selected(state: &GalleryState) -> Vec<&str> {
    state.selection().ids().map(ItemId::as_str).collect()
}

#[test]
fn select_all_picks_only_done_items() {
    init_logging();
    let (state, effects) = update(mixed_state(), Msg::SelectAllClicked);

    assert!(effects.is_empty());
    assert!(state.selection().is_active());
    assert_eq!(selected(&state), vec!["done"]);
}

#[test]
fn entering_selection_mode_clears_previous_selection() {
    init_logging();
    let (state, _) = update(mixed_state(), Msg::SelectAllClicked);
    let (state, _) = update(state, Msg::SelectionModeEntered);

    assert!(state.selection().is_active());
    assert!(state.selection().is_empty());
}

#[test]
fn toggling_last_selected_item_exits_selection_mode() {
    init_logging();
    let (state, _) = update(mixed_state(), Msg::SelectionToggled(ItemId::new("error")));
    assert!(state.selection().is_active());
    assert_eq!(selected(&state), vec!["error"]);

    let (state, _) = update(state, Msg::SelectionToggled(ItemId::new("error")));
    assert!(!state.selection().is_active());
    assert!(state.selection().is_empty());
}

#[test]
fn toggling_unknown_id_is_ignored() {
    init_logging();
    let (mut state, _) = update(mixed_state(), Msg::NoOp);
    state.consume_dirty();
    let (mut state, _) = update(state, Msg::SelectionToggled(ItemId::new("ghost")));

    assert!(!state.consume_dirty());
    assert!(state.selection().is_empty());
}

#[test]
fn delete_selected_removes_items_and_exits_mode() {
    init_logging();
    let (state, _) = update(mixed_state(), Msg::SelectionToggled(ItemId::new("done")));
    let (state, _) = update(state, Msg::SelectionToggled(ItemId::new("generating")));

    let (state, effects) = update(state, Msg::DeleteSelectedClicked);

    let remaining: Vec<&str> = state.items().iter().map(|item| item.id.as_str()).collect();
    assert_eq!(remaining, vec!["error"]);
    assert!(!state.selection().is_active());
    assert!(state
        .selection()
        .ids()
        .all(|id| state.items().contains(id)));
    assert_eq!(
        effects,
        vec![
            Effect::PersistItems,
            Effect::Notify {
                message: "Deleted 2 items".to_string(),
                severity: Severity::Success,
            },
        ]
    );
}

#[test]
fn delete_with_empty_selection_does_nothing() {
    init_logging();
    let before = mixed_state().items().len();
    let (state, effects) = update(mixed_state(), Msg::DeleteSelectedClicked);

    assert!(effects.is_empty());
    assert_eq!(state.items().len(), before);
}

#[test]
fn removing_items_prunes_the_selection() {
    init_logging();
    let (state, _) = update(mixed_state(), Msg::SelectionToggled(ItemId::new("done")));
    let (state, effects) = update(state, Msg::ItemsRemoved(vec![ItemId::new("done")]));

    assert_eq!(effects, vec![Effect::PersistItems]);
    assert!(state.selection().is_empty());
    assert!(!state.selection().is_active());
}

#[test]
fn download_with_empty_selection_reports_nothing_to_download() {
    init_logging();
    let (state, effects) = update(mixed_state(), Msg::DownloadSelectedClicked);

    assert_eq!(
        effects,
        vec![Effect::Notify {
            message: "Nothing to download".to_string(),
            severity: Severity::Warning,
        }]
    );
    assert!(!state.selection().is_active());
}

#[test]
fn download_skips_items_without_media() {
    init_logging();
    let state = start(mixed_state(), "markup", "no link");
    let state = finish(state, "markup", Some("<p>rendering failed</p>"));
    let (state, _) = update(state, Msg::SelectAllClicked);
    assert_eq!(state.selection().len(), 2);

    let (_, effects) = update(state, Msg::DownloadSelectedClicked);
    assert_eq!(
        effects,
        vec![
            Effect::Download {
                url: "https://cdn.example.com/done.mp4".to_string(),
                prompt: "sunset".to_string(),
            },
            Effect::Notify {
                message: "Downloading 1 items".to_string(),
                severity: Severity::Success,
            },
        ]
    );
}
