use std::fmt;

use crate::media::{extract_media_url, infer_content_kind};
use crate::params::GenerationParams;

/// Opaque, locally generated identity of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemStatus {
    #[default]
    Generating,
    Done,
    Error,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ItemStatus::Generating)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Generating => "generating",
            ItemStatus::Done => "done",
            ItemStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentKind {
    #[default]
    Url,
    Html,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Url => "url",
            ContentKind::Html => "html",
        }
    }
}

/// How an in-flight attempt ended. Applied once, by id, to a `Generating` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The response was fully consumed. Empty content still finalizes as `Error`.
    Completed { content: String, elapsed_ms: u64 },
    /// Transport failure or hard cancellation.
    Failed { elapsed_ms: u64 },
}

/// One generation attempt.
///
/// `content` is empty while `status == Generating`; once the item is terminal
/// only deletion changes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationItem {
    pub id: ItemId,
    pub prompt: String,
    pub params: GenerationParams,
    pub status: ItemStatus,
    pub content: String,
    pub content_kind: ContentKind,
    pub created_at_ms: u64,
    pub elapsed_ms: u64,
}

impl GenerationItem {
    /// A fresh in-flight item.
    pub fn generating(
        id: ItemId,
        prompt: impl Into<String>,
        params: GenerationParams,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            params,
            status: ItemStatus::Generating,
            content: String::new(),
            content_kind: ContentKind::Url,
            created_at_ms,
            elapsed_ms: 0,
        }
    }

    /// Applies a finalization. Returns `false` (and leaves the item untouched)
    /// when the item is already terminal.
    pub fn finalize(&mut self, outcome: ItemOutcome) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        match outcome {
            ItemOutcome::Completed {
                content,
                elapsed_ms,
            } => {
                self.status = if content.is_empty() {
                    ItemStatus::Error
                } else {
                    ItemStatus::Done
                };
                self.content_kind = infer_content_kind(&content);
                self.content = content;
                self.elapsed_ms = elapsed_ms;
            }
            ItemOutcome::Failed { elapsed_ms } => {
                self.status = ItemStatus::Error;
                self.elapsed_ms = elapsed_ms;
            }
        }
        true
    }

    pub fn media_url(&self) -> Option<String> {
        extract_media_url(&self.content)
    }

    /// Completed with a resolvable media URL: selectable for download and
    /// visible in the lightbox.
    pub fn is_displayable(&self) -> bool {
        self.status == ItemStatus::Done && self.media_url().is_some()
    }
}
