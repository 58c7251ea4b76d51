use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock source for item creation timestamps, in Unix milliseconds.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

#[derive(Clone)]
pub struct EngineConfig {
    /// Service root; requests go to `{base_url}/v1/chat/completions`.
    pub base_url: String,
    pub model: String,
    /// Ask the service for an incremental stream rather than one document.
    pub streaming: bool,
    /// Fixed pause after a failed cycle before the worker tries again.
    pub retry_delay: Duration,
    /// Consecutive failures after which a worker slot gives up.
    pub max_consecutive_errors: u32,
    pub auto_scroll: bool,
    pub auto_download: bool,
    pub connect_timeout: Duration,
    /// Whole-request timeout; `None` leaves generation unbounded.
    pub request_timeout: Option<Duration>,
    pub now_ms: Clock,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            model: "grok-imagine-1.0-video".to_string(),
            streaming: true,
            retry_delay: Duration::from_secs(2),
            max_consecutive_errors: 5,
            auto_scroll: false,
            auto_download: false,
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            now_ms: Arc::new(system_now_ms),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("streaming", &self.streaming)
            .field("retry_delay", &self.retry_delay)
            .field("max_consecutive_errors", &self.max_consecutive_errors)
            .field("auto_scroll", &self.auto_scroll)
            .field("auto_download", &self.auto_download)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

fn system_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
