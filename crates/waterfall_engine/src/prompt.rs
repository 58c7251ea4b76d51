use std::sync::{Arc, Mutex, MutexGuard};

use waterfall_core::GenerationParams;

/// Live prompt and parameters, re-read by every worker at the top of each
/// cycle. Editing takes effect on the next cycle; clearing the prompt makes
/// workers exit instead of starting one.
#[derive(Debug, Clone, Default)]
pub struct PromptHandle {
    inner: Arc<Mutex<PromptState>>,
}

#[derive(Debug, Default)]
struct PromptState {
    prompt: String,
    params: GenerationParams,
}

impl PromptHandle {
    pub fn new(prompt: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PromptState {
                prompt: prompt.into(),
                params,
            })),
        }
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        self.lock().prompt = prompt.into();
    }

    pub fn set_params(&self, params: GenerationParams) {
        self.lock().params = params;
    }

    /// Trimmed prompt with its parameters, or `None` when the prompt is blank.
    pub fn current(&self) -> Option<(String, GenerationParams)> {
        let state = self.lock();
        let prompt = state.prompt.trim();
        if prompt.is_empty() {
            None
        } else {
            Some((prompt.to_string(), state.params))
        }
    }

    fn lock(&self) -> MutexGuard<'_, PromptState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waterfall_core::VideoLength;

    #[test]
    fn blank_prompt_reads_as_none() {
        let handle = PromptHandle::new("  \n", GenerationParams::default());
        assert!(handle.current().is_none());
        handle.set_prompt("  a waterfall  ");
        assert_eq!(
            handle.current().map(|(p, _)| p),
            Some("a waterfall".to_string())
        );
    }

    #[test]
    fn clones_share_the_same_prompt() {
        let handle = PromptHandle::new("first", GenerationParams::default());
        let worker_view = handle.clone();
        let params = GenerationParams {
            video_length: VideoLength::Ten,
            ..GenerationParams::default()
        };
        handle.set_params(params);
        handle.set_prompt("second");
        assert_eq!(worker_view.current(), Some(("second".to_string(), params)));
    }
}
