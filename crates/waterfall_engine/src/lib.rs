//! Waterfall engine: worker pool, streaming client and persisted item store.
mod accumulator;
mod client;
mod config;
mod credential;
mod download;
mod engine;
mod error;
mod filename;
mod persist;
mod prompt;
mod sink;
mod state;
mod storage;
mod store;
mod types;
mod worker;

pub use accumulator::{accumulate, completed_text, StreamAccumulator};
pub use client::{
    ClientSettings, GenerationClient, GenerationRequest, GenerationResponse,
    ReqwestGenerationClient,
};
pub use config::{Clock, EngineConfig};
pub use credential::{Credential, CredentialProvider, StaticCredentialProvider};
pub use download::{MediaDownloader, ReqwestDownloader};
pub use engine::{EngineBuilder, StopOutcome, WaterfallEngine};
pub use error::{DownloadError, StartError, StorageError};
pub use filename::download_filename;
pub use persist::{ItemPersistence, PersistSettings, SaveOutcome};
pub use prompt::PromptHandle;
pub use sink::{ChannelEventSink, EventSink, LogEventSink, NullEventSink};
pub use state::EnginePhase;
pub use storage::{
    ensure_dir, AtomicFileWriter, FileStorage, KeyValueStorage, MemoryStorage, PendingFile,
};
pub use store::ItemStore;
pub use types::{
    EngineEvent, FailureKind, GenerationError, Notification, PoolReport, StoreChange, WorkerExit,
    WorkerId,
};
