use engine_logging::{engine_debug, engine_info};
use waterfall_core::Severity;
use waterfall_engine::{EngineEvent, EventSink, LogEventSink};

/// Prints notifications for the user and forwards everything to the log.
#[derive(Debug, Default)]
pub struct ConsoleEventSink {
    log: LogEventSink,
}

impl EventSink for ConsoleEventSink {
    fn emit(&self, event: EngineEvent) {
        match &event {
            EngineEvent::Notify(notification) => {
                println!("{} {}", badge(notification.severity), notification.message);
            }
            EngineEvent::Progress {
                item_id,
                received_chars,
            } => engine_debug!("Item {} received {} chars", item_id, received_chars),
            EngineEvent::ItemsChanged(change) => engine_debug!("Items changed: {:?}", change),
            EngineEvent::ScrollToLatest => engine_info!("New result at the top of the list"),
            EngineEvent::StopCompleted | EngineEvent::WorkerExited { .. } => {}
        }
        self.log.emit(event);
    }
}

fn badge(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "[info]",
        Severity::Success => "[ok]",
        Severity::Warning => "[warn]",
        Severity::Error => "[error]",
    }
}
