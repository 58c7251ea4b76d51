use std::sync::mpsc;

use engine_logging::{engine_error, engine_info, engine_warn};
use waterfall_core::Severity;

use crate::EngineEvent;

/// Observer for everything the engine reports: re-render hooks, progress and
/// user-facing notifications. Purely observational; nothing is read back.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: EngineEvent) {}
}

/// Writes notifications and worker exits to the log; ignores render events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::Notify(notification) => match notification.severity {
                Severity::Error => engine_error!("{}", notification.message),
                Severity::Warning => engine_warn!("{}", notification.message),
                Severity::Info | Severity::Success => engine_info!("{}", notification.message),
            },
            EngineEvent::WorkerExited { worker, exit } => {
                engine_info!("Worker {} exited: {:?}", worker, exit);
            }
            EngineEvent::StopCompleted => engine_info!("Graceful stop completed"),
            _ => {}
        }
    }
}

/// Forwards events over a channel to a UI or test thread.
pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}
