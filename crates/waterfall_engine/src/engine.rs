use std::sync::{Arc, Mutex, MutexGuard};

use engine_logging::{engine_error, engine_info, engine_warn};
use tokio_util::sync::CancellationToken;
use waterfall_core::{Effect, GenerationItem, Severity};

use crate::client::GenerationClient;
use crate::credential::{Credential, CredentialProvider};
use crate::download::MediaDownloader;
use crate::prompt::PromptHandle;
use crate::sink::{EventSink, NullEventSink};
use crate::state::{EnginePhase, EngineState};
use crate::store::ItemStore;
use crate::worker::{
    announce_stop_completed, run_cycle, run_worker, WorkerContext, SINGLE_GENERATION,
};
use crate::{EngineConfig, EngineEvent, Notification, PoolReport, StartError, WorkerExit};

/// Result of a graceful `stop` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    NotRunning,
    /// A stop was already pending; nothing changed.
    AlreadyStopping,
    /// Nothing was generating; the engine is idle again.
    Stopped,
    /// In-flight items finish first; `StopCompleted` follows.
    Draining { generating: usize },
}

/// Releases the single-generation claim even if the caller drops the future.
struct SingleClaim<'a>(&'a EngineState);

impl Drop for SingleClaim<'_> {
    fn drop(&mut self) {
        self.0.end_single();
    }
}

/// Bounded pool of generation workers over one shared item store.
///
/// Cloning yields another handle to the same engine, so a UI can call
/// `stop` while another task is awaiting `start`.
#[derive(Clone)]
pub struct WaterfallEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: Arc<EngineConfig>,
    state: Arc<EngineState>,
    store: ItemStore,
    prompt: PromptHandle,
    client: Arc<dyn GenerationClient>,
    credentials: Arc<dyn CredentialProvider>,
    downloader: Option<Arc<dyn MediaDownloader>>,
    sink: Arc<dyn EventSink>,
    cancel: Mutex<CancellationToken>,
}

pub struct EngineBuilder {
    config: EngineConfig,
    store: ItemStore,
    prompt: PromptHandle,
    client: Arc<dyn GenerationClient>,
    credentials: Arc<dyn CredentialProvider>,
    downloader: Option<Arc<dyn MediaDownloader>>,
    sink: Arc<dyn EventSink>,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn prompt(mut self, prompt: PromptHandle) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn downloader(mut self, downloader: Arc<dyn MediaDownloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    /// Should be the same sink the store was built with.
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(self) -> WaterfallEngine {
        WaterfallEngine {
            inner: Arc::new(EngineInner {
                config: Arc::new(self.config),
                state: Arc::new(EngineState::default()),
                store: self.store,
                prompt: self.prompt,
                client: self.client,
                credentials: self.credentials,
                downloader: self.downloader,
                sink: self.sink,
                cancel: Mutex::new(CancellationToken::new()),
            }),
        }
    }
}

impl WaterfallEngine {
    pub fn builder(
        store: ItemStore,
        client: Arc<dyn GenerationClient>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> EngineBuilder {
        EngineBuilder {
            config: EngineConfig::default(),
            store,
            prompt: PromptHandle::default(),
            client,
            credentials,
            downloader: None,
            sink: Arc::new(NullEventSink),
        }
    }

    /// Run `concurrency` workers until every one of them has exited.
    ///
    /// Preconditions are checked in order: no pool running, a positive
    /// concurrency, a non-empty prompt, then a credential. A rejected start
    /// changes nothing.
    pub async fn start(&self, concurrency: usize) -> Result<PoolReport, StartError> {
        let inner = &self.inner;
        if inner.state.is_busy() {
            return Err(StartError::AlreadyRunning);
        }
        if concurrency == 0 {
            return Err(StartError::InvalidConcurrency);
        }
        if inner.prompt.current().is_none() {
            return Err(StartError::EmptyPrompt);
        }
        let credential = inner
            .credentials
            .ensure_credential()
            .await
            .ok_or(StartError::MissingCredential)?;
        if !inner.state.try_begin_run() {
            return Err(StartError::AlreadyRunning);
        }

        let cancel = CancellationToken::new();
        *self.cancel_token() = cancel.clone();
        engine_info!("Starting {} workers", concurrency);

        let handles: Vec<_> = (1..=concurrency)
            .map(|worker| {
                let ctx = self.worker_context(worker, credential.clone(), cancel.clone());
                (worker, tokio::spawn(run_worker(ctx)))
            })
            .collect();

        let mut report = PoolReport::default();
        for (worker, handle) in handles {
            let exit = match handle.await {
                Ok(exit) => exit,
                Err(err) => {
                    engine_error!("Worker {} terminated abnormally: {}", worker, err);
                    WorkerExit::Panicked
                }
            };
            inner.sink.emit(EngineEvent::WorkerExited {
                worker,
                exit: exit.clone(),
            });
            report.exits.push((worker, exit));
        }

        if inner.state.end_run() {
            announce_stop_completed(inner.sink.as_ref());
        }
        engine_info!("All {} workers exited: {:?}", concurrency, report.exits);
        Ok(report)
    }

    /// Generate a single item outside the pool and return it once finalized.
    ///
    /// Runs while the engine is otherwise idle, and blocks `start` until it
    /// returns. `abort` cancels the request, which leaves the item as an error. Returns `None` if the item was removed
    /// (for example by `clear`) before it finished.
    pub async fn generate_once(&self) -> Result<Option<GenerationItem>, StartError> {
        let inner = &self.inner;
        if inner.state.is_busy() {
            return Err(StartError::AlreadyRunning);
        }
        let Some((prompt, params)) = inner.prompt.current() else {
            return Err(StartError::EmptyPrompt);
        };
        let credential = inner
            .credentials
            .ensure_credential()
            .await
            .ok_or(StartError::MissingCredential)?;
        if !inner.state.try_begin_single() {
            return Err(StartError::AlreadyRunning);
        }
        let _claim = SingleClaim(&inner.state);

        // No pool can be live here, so the root token has no other children.
        let cancel = CancellationToken::new();
        *self.cancel_token() = cancel.clone();
        let ctx = self.worker_context(SINGLE_GENERATION, credential, cancel.child_token());
        Ok(run_cycle(&ctx, prompt, params)
            .await
            .and_then(|(id, _)| inner.store.get(&id)))
    }

    /// Graceful stop: no new cycles start, in-flight requests run to the end.
    pub fn stop(&self) -> StopOutcome {
        let inner = &self.inner;
        match inner.state.request_stop() {
            EnginePhase::Idle => StopOutcome::NotRunning,
            EnginePhase::Stopping => StopOutcome::AlreadyStopping,
            EnginePhase::Running => {
                let generating = inner.store.generating_count();
                if generating == 0 {
                    if inner.state.finish_stop() {
                        announce_stop_completed(inner.sink.as_ref());
                    }
                    StopOutcome::Stopped
                } else {
                    engine_info!("Stop requested; waiting for {} items", generating);
                    self.notify(
                        format!("Stopping, waiting for {generating} items"),
                        Severity::Info,
                    );
                    StopOutcome::Draining { generating }
                }
            }
        }
    }

    /// Hard stop: cancel every in-flight attempt. Aborted items end as errors.
    pub fn abort(&self) -> bool {
        let state = &self.inner.state;
        if state.request_stop() == EnginePhase::Idle && !state.is_busy() && state.active_count() == 0
        {
            return false;
        }
        engine_warn!("Aborting in-flight generations");
        self.cancel_token().cancel();
        true
    }

    /// Stop a running engine gracefully, then empty the list.
    pub fn clear(&self) -> Vec<Effect> {
        if self.inner.state.phase() == EnginePhase::Running {
            self.stop();
        }
        self.inner.store.clear()
    }

    pub fn phase(&self) -> EnginePhase {
        self.inner.state.phase()
    }

    /// Workers currently mid-request.
    pub fn active_count(&self) -> usize {
        self.inner.state.active_count()
    }

    pub fn store(&self) -> &ItemStore {
        &self.inner.store
    }

    pub fn prompt(&self) -> &PromptHandle {
        &self.inner.prompt
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    fn worker_context(
        &self,
        worker: usize,
        credential: Credential,
        cancel: CancellationToken,
    ) -> WorkerContext {
        let inner = &self.inner;
        WorkerContext {
            worker,
            config: Arc::clone(&inner.config),
            state: Arc::clone(&inner.state),
            store: inner.store.clone(),
            prompt: inner.prompt.clone(),
            client: Arc::clone(&inner.client),
            downloader: inner.downloader.clone(),
            sink: Arc::clone(&inner.sink),
            credential,
            cancel,
        }
    }

    fn notify(&self, message: String, severity: Severity) {
        self.inner
            .sink
            .emit(EngineEvent::Notify(Notification::new(message, severity)));
    }

    fn cancel_token(&self) -> MutexGuard<'_, CancellationToken> {
        self.inner
            .cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
