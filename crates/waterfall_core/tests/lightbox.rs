use waterfall_core::{
    update, Effect, GalleryState, GenerationItem, GenerationParams, ItemId, ItemOutcome, Msg,
};

fn with_items(specs: &[(&str, Option<&str>)]) -> GalleryState {
    // Started in reverse so the list reads in the order given.
    let mut state = GalleryState::new();
    for (id, content) in specs.iter().rev() {
        let item =
            GenerationItem::generating(ItemId::new(*id), "clip", GenerationParams::default(), 1);
        state = update(state, Msg::ItemStarted(item)).0;
        if let Some(content) = content {
            state = update(
                state,
                Msg::ItemFinished {
                    id: ItemId::new(*id),
                    outcome: ItemOutcome::Completed {
                        content: content.to_string(),
                        elapsed_ms: 1,
                    },
                },
            )
            .0;
        }
    }
    state
}

#[test]
fn single_item_shows_one_of_one_with_both_directions_disabled() {
    let state = with_items(&[("pending", None), ("only", Some("https://cdn.example.com/1.mp4"))]);
    let (state, _) = update(state, Msg::LightboxOpened(ItemId::new("only")));

    let view = state.view().lightbox.expect("lightbox open");
    assert_eq!(view.counter(), "1 / 1");
    assert!(!view.prev_enabled);
    assert!(!view.next_enabled);
    assert_eq!(view.media_url, "https://cdn.example.com/1.mp4");
}

#[test]
fn opening_a_non_displayable_item_is_a_noop() {
    let state = with_items(&[
        ("pending", None),
        ("markup", Some("<p>no media</p>")),
        ("ok", Some("https://cdn.example.com/ok.mp4")),
    ]);
    let (state, _) = update(state, Msg::LightboxOpened(ItemId::new("pending")));
    assert!(!state.lightbox().is_open());
    let (state, _) = update(state, Msg::LightboxOpened(ItemId::new("markup")));
    assert!(!state.lightbox().is_open());
}

#[test]
fn navigation_is_bounded_without_wraparound() {
    let state = with_items(&[
        ("a", Some("https://cdn.example.com/a.mp4")),
        ("skip", Some("<p>none</p>")),
        ("b", Some("<video src=\"https://cdn.example.com/b.mp4\"></video>")),
        ("c", Some("https://cdn.example.com/c.mp4")),
    ]);
    let (state, _) = update(state, Msg::LightboxOpened(ItemId::new("b")));
    let view = state.view().lightbox.unwrap();
    assert_eq!(view.counter(), "2 / 3");
    assert!(view.prev_enabled && view.next_enabled);

    let (state, _) = update(state, Msg::LightboxNextClicked);
    let (mut state, _) = update(state, Msg::LightboxNextClicked);
    let view = state.view().lightbox.unwrap();
    assert_eq!(view.item_id, ItemId::new("c"));
    assert!(!view.next_enabled);
    state.consume_dirty();

    let (state, _) = update(state, Msg::LightboxPrevClicked);
    let (state, _) = update(state, Msg::LightboxPrevClicked);
    let (mut state, _) = update(state, Msg::LightboxPrevClicked);
    let view = state.view().lightbox.unwrap();
    assert_eq!(view.item_id, ItemId::new("a"));
    assert_eq!(view.counter(), "1 / 3");
    assert!(!view.prev_enabled);
    assert!(state.consume_dirty());
}

#[test]
fn index_is_clamped_after_items_disappear() {
    let state = with_items(&[
        ("a", Some("https://cdn.example.com/a.mp4")),
        ("b", Some("https://cdn.example.com/b.mp4")),
    ]);
    let (state, _) = update(state, Msg::LightboxOpened(ItemId::new("b")));
    let (state, _) = update(state, Msg::ItemsRemoved(vec![ItemId::new("b")]));

    let view = state.view().lightbox.unwrap();
    assert_eq!(view.item_id, ItemId::new("a"));
    assert_eq!(view.counter(), "1 / 1");
}

#[test]
fn closing_releases_media() {
    let state = with_items(&[("a", Some("https://cdn.example.com/a.mp4"))]);
    let (state, _) = update(state, Msg::LightboxOpened(ItemId::new("a")));
    let (state, effects) = update(state, Msg::LightboxClosed);

    assert_eq!(effects, vec![Effect::ReleaseMedia]);
    assert!(!state.lightbox().is_open());
    assert!(state.view().lightbox.is_none());
}
