use std::path::PathBuf;
use std::sync::Arc;

use engine_logging::{engine_debug, engine_info, engine_warn};
use waterfall_core::Effect;
use waterfall_engine::MediaDownloader;

/// Runs the effects the item store hands back: downloads and media release.
/// Persistence and notifications never reach here.
pub struct EffectRunner {
    downloader: Arc<dyn MediaDownloader>,
}

impl EffectRunner {
    pub fn new(downloader: Arc<dyn MediaDownloader>) -> Self {
        Self { downloader }
    }

    /// Downloads are best effort: failures are logged and the rest continue.
    /// Returns the paths that were written.
    pub async fn run(&self, effects: Vec<Effect>) -> Vec<PathBuf> {
        let mut saved = Vec::new();
        for effect in effects {
            match effect {
                Effect::Download { url, prompt } => {
                    engine_info!("Download url_len={} url={}", url.len(), url);
                    match self.downloader.download(&url, &prompt).await {
                        Ok(path) => saved.push(path),
                        Err(err) => engine_warn!("Download of {} failed: {}", url, err),
                    }
                }
                Effect::ReleaseMedia => {
                    // Nothing holds media open in a terminal session.
                    engine_debug!("Released lightbox media");
                }
                Effect::PersistItems | Effect::Notify { .. } => {
                    engine_debug!("Effect already handled by the store: {:?}", effect);
                }
            }
        }
        saved
    }
}
