use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use engine_logging::{engine_info, engine_warn};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use waterfall_engine::{AtomicFileWriter, EngineConfig};

pub const DEFAULT_SETTINGS_FILE: &str = "waterfall.ron";

/// User-editable settings, stored as RON next to the data directory.
///
/// Missing fields take their defaults, so older files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub base_url: String,
    pub model: String,
    pub streaming: bool,
    pub concurrency: usize,
    pub retry_delay_ms: u64,
    pub max_consecutive_errors: u32,
    pub auto_download: bool,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: Option<u64>,
    pub data_dir: PathBuf,
    pub download_dir: PathBuf,
    /// Upper bound for the persisted item snapshot, in bytes.
    pub storage_quota_bytes: Option<usize>,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            base_url: engine.base_url,
            model: engine.model,
            streaming: engine.streaming,
            concurrency: 2,
            retry_delay_ms: engine.retry_delay.as_millis() as u64,
            max_consecutive_errors: engine.max_consecutive_errors,
            auto_download: engine.auto_download,
            connect_timeout_secs: engine.connect_timeout.as_secs(),
            request_timeout_secs: None,
            data_dir: PathBuf::from("./waterfall_data"),
            download_dir: PathBuf::from("./downloads"),
            storage_quota_bytes: Some(5 * 1024 * 1024),
            log_file: PathBuf::from("./waterfall.log"),
            log_level: "info".to_string(),
        }
    }
}

impl AppSettings {
    /// Read settings from `path`; a missing or unreadable file yields defaults.
    pub fn load_or_default(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Self::default();
            }
            Err(err) => {
                engine_warn!("Failed to read settings from {:?}: {}", path, err);
                return Self::default();
            }
        };

        match ron::from_str(&content) {
            Ok(settings) => {
                engine_info!("Loaded settings from {:?}", path);
                settings
            }
            Err(err) => {
                engine_warn!("Failed to parse settings from {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<PathBuf> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(self, pretty)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_SETTINGS_FILE.to_string());
        Ok(AtomicFileWriter::new(dir).write(&filename, content.as_bytes())?)
    }

    pub fn level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            streaming: self.streaming,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            max_consecutive_errors: self.max_consecutive_errors,
            auto_scroll: false,
            auto_download: self.auto_download,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            now_ms: Arc::new(|| Utc::now().timestamp_millis().max(0) as u64),
        }
    }
}
