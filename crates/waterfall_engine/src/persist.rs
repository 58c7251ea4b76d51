use std::sync::Arc;

use engine_logging::{engine_debug, engine_info, engine_warn};
use serde::{Deserialize, Serialize};
use waterfall_core::{
    compact_content, AspectRatio, ContentKind, GenerationItem, GenerationParams, ItemId,
    ItemStatus, Preset, Resolution, VideoLength, COMPACT_THRESHOLD,
};

use crate::storage::KeyValueStorage;
use crate::StorageError;

#[derive(Debug, Clone)]
pub struct PersistSettings {
    pub storage_key: String,
    /// Content longer than this many bytes is compacted before writing.
    pub compact_threshold: usize,
    /// Newest-first prefix written when the full snapshot is rejected.
    pub fallback_len: usize,
}

impl Default for PersistSettings {
    fn default() -> Self {
        Self {
            storage_key: "waterfall_items".to_string(),
            compact_threshold: COMPACT_THRESHOLD,
            fallback_len: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { items: usize },
    /// The full snapshot failed; only the newest `items` were written.
    SavedPrefix { items: usize },
    Abandoned,
}

/// Bounded snapshot persistence for the item list.
///
/// Neither `save` nor `load` ever fails outward: a rejected write degrades to
/// a shorter snapshot or is dropped, and unreadable data loads as empty.
#[derive(Clone)]
pub struct ItemPersistence {
    storage: Arc<dyn KeyValueStorage>,
    settings: PersistSettings,
}

impl ItemPersistence {
    pub fn new(storage: Arc<dyn KeyValueStorage>, settings: PersistSettings) -> Self {
        Self { storage, settings }
    }

    pub fn save(&self, items: &[GenerationItem]) -> SaveOutcome {
        match self.write(items) {
            Ok(()) => {
                engine_debug!("Persisted {} items", items.len());
                return SaveOutcome::Saved { items: items.len() };
            }
            Err(err) => {
                engine_warn!(
                    "Persisting {} items failed ({}); retrying with newest {}",
                    items.len(),
                    err,
                    self.settings.fallback_len
                );
            }
        }

        let prefix = &items[..items.len().min(self.settings.fallback_len)];
        match self.write(prefix) {
            Ok(()) => SaveOutcome::SavedPrefix {
                items: prefix.len(),
            },
            Err(err) => {
                engine_warn!("Abandoning persistence write: {}", err);
                SaveOutcome::Abandoned
            }
        }
    }

    pub fn load(&self) -> Vec<GenerationItem> {
        let key = &self.settings.storage_key;
        let bytes = match self.storage.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(err) => {
                engine_warn!("Failed to read persisted items from {:?}: {}", key, err);
                return Vec::new();
            }
        };

        let persisted: Vec<PersistedItem> = match serde_json::from_slice(&bytes) {
            Ok(items) => items,
            Err(err) => {
                engine_warn!("Failed to parse persisted items from {:?}: {}", key, err);
                return Vec::new();
            }
        };

        let items: Vec<GenerationItem> = persisted
            .into_iter()
            .map(PersistedItem::into_item)
            .collect();
        engine_info!("Loaded {} persisted items from {:?}", items.len(), key);
        items
    }

    fn write(&self, items: &[GenerationItem]) -> Result<(), WriteError> {
        let persisted: Vec<PersistedItem> = items
            .iter()
            .map(|item| PersistedItem::compacted(item, self.settings.compact_threshold))
            .collect();
        let bytes = serde_json::to_vec(&persisted)?;
        self.storage.set(&self.settings.storage_key, &bytes)?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
enum WriteError {
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedItem {
    id: String,
    prompt: String,
    #[serde(default)]
    content: String,
    #[serde(rename = "type", default)]
    kind: PersistedKind,
    status: PersistedStatus,
    #[serde(default)]
    params: PersistedParams,
    #[serde(rename = "timestamp", default)]
    created_at_ms: u64,
    #[serde(rename = "elapsed", default)]
    elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PersistedKind {
    #[default]
    Url,
    Html,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PersistedStatus {
    Generating,
    Done,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedParams {
    aspect_ratio: String,
    video_length: u32,
    resolution_name: String,
    preset: String,
}

impl Default for PersistedParams {
    fn default() -> Self {
        Self::from(GenerationParams::default())
    }
}

impl From<GenerationParams> for PersistedParams {
    fn from(params: GenerationParams) -> Self {
        Self {
            aspect_ratio: params.aspect_ratio.as_str().to_string(),
            video_length: params.video_length.seconds(),
            resolution_name: params.resolution.as_str().to_string(),
            preset: params.preset.as_str().to_string(),
        }
    }
}

impl PersistedParams {
    /// Unknown values fall back to defaults field by field.
    fn into_params(self) -> GenerationParams {
        GenerationParams {
            aspect_ratio: self.aspect_ratio.parse::<AspectRatio>().unwrap_or_default(),
            video_length: VideoLength::try_from(self.video_length).unwrap_or_default(),
            resolution: self.resolution_name.parse::<Resolution>().unwrap_or_default(),
            preset: self.preset.parse::<Preset>().unwrap_or_default(),
        }
    }
}

impl PersistedItem {
    fn compacted(item: &GenerationItem, threshold: usize) -> Self {
        let compacted = compact_content(&item.content, item.content_kind, threshold);
        Self {
            id: item.id.to_string(),
            prompt: item.prompt.clone(),
            content: compacted.content,
            kind: match compacted.kind {
                ContentKind::Url => PersistedKind::Url,
                ContentKind::Html => PersistedKind::Html,
            },
            status: match item.status {
                ItemStatus::Generating => PersistedStatus::Generating,
                ItemStatus::Done => PersistedStatus::Done,
                ItemStatus::Error => PersistedStatus::Error,
            },
            params: item.params.into(),
            created_at_ms: item.created_at_ms,
            elapsed_ms: item.elapsed_ms,
        }
    }

    fn into_item(self) -> GenerationItem {
        GenerationItem {
            id: ItemId::new(self.id),
            prompt: self.prompt,
            params: self.params.into_params(),
            status: match self.status {
                PersistedStatus::Generating => ItemStatus::Generating,
                PersistedStatus::Done => ItemStatus::Done,
                PersistedStatus::Error => ItemStatus::Error,
            },
            content: self.content,
            content_kind: match self.kind {
                PersistedKind::Url => ContentKind::Url,
                PersistedKind::Html => ContentKind::Html,
            },
            created_at_ms: self.created_at_ms,
            elapsed_ms: self.elapsed_ms,
        }
    }
}
