use crate::item::{GenerationItem, ItemId, ItemOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Replace the list with items restored from storage.
    ItemsRestored(Vec<GenerationItem>),
    /// A worker created an in-flight item.
    ItemStarted(GenerationItem),
    /// A worker finalized one of its items.
    ItemFinished { id: ItemId, outcome: ItemOutcome },
    /// Remove a set of items by id.
    ItemsRemoved(Vec<ItemId>),
    /// User clicked Clear.
    ClearClicked,
    /// User long-pressed an item or clicked the batch button.
    SelectionModeEntered,
    /// User clicked Deselect.
    SelectionModeExited,
    /// User clicked an item or its checkbox.
    SelectionToggled(ItemId),
    /// User clicked Select all.
    SelectAllClicked,
    /// User clicked Delete in the selection toolbar.
    DeleteSelectedClicked,
    /// User clicked Download in the selection toolbar.
    DownloadSelectedClicked,
    /// User opened a completed item full-screen.
    LightboxOpened(ItemId),
    LightboxPrevClicked,
    LightboxNextClicked,
    LightboxClosed,
    /// Fallback for placeholder wiring.
    NoOp,
}
