#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// The list changed in a way that must reach storage.
    PersistItems,
    /// Fetch and save one media file.
    Download { url: String, prompt: String },
    Notify { message: String, severity: Severity },
    /// The lightbox closed; stop and release its player.
    ReleaseMedia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Effect {
    pub fn notify(message: impl Into<String>, severity: Severity) -> Self {
        Effect::Notify {
            message: message.into(),
            severity,
        }
    }
}
