use std::sync::Arc;
use std::time::Instant;

use engine_logging::{engine_debug, engine_info, engine_warn};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use waterfall_core::{GenerationItem, GenerationParams, ItemId, ItemOutcome, Severity};

use crate::accumulator::accumulate;
use crate::client::{GenerationClient, GenerationRequest, GenerationResponse};
use crate::credential::Credential;
use crate::download::MediaDownloader;
use crate::prompt::PromptHandle;
use crate::sink::EventSink;
use crate::state::{EnginePhase, EngineState};
use crate::store::ItemStore;
use crate::{
    EngineConfig, EngineEvent, FailureKind, GenerationError, Notification, WorkerExit, WorkerId,
};

/// Worker id of the generation that runs outside the pool.
pub(crate) const SINGLE_GENERATION: WorkerId = 0;

/// Everything one worker loop shares with its siblings and the engine.
pub(crate) struct WorkerContext {
    pub worker: WorkerId,
    pub config: Arc<EngineConfig>,
    pub state: Arc<EngineState>,
    pub store: ItemStore,
    pub prompt: PromptHandle,
    pub client: Arc<dyn GenerationClient>,
    pub downloader: Option<Arc<dyn MediaDownloader>>,
    pub sink: Arc<dyn EventSink>,
    pub credential: Credential,
    /// Root token of the current run; each attempt waits on a child of it.
    pub cancel: CancellationToken,
}

pub(crate) enum CycleOutcome {
    Succeeded,
    Failed,
    Cancelled,
}

/// Generate items one after another until the engine stops, the prompt is
/// cleared, the run is aborted or too many cycles fail in a row.
pub(crate) async fn run_worker(ctx: WorkerContext) -> WorkerExit {
    let mut consecutive_errors: u32 = 0;
    engine_debug!("Worker {} started", ctx.worker);

    loop {
        if !ctx.state.is_running() {
            return WorkerExit::Stopped;
        }
        let Some((prompt, params)) = ctx.prompt.current() else {
            engine_info!("Worker {} exiting: prompt is empty", ctx.worker);
            return WorkerExit::PromptCleared;
        };

        let Some((_, outcome)) = run_cycle(&ctx, prompt, params).await else {
            complete_stop_if_drained(&ctx);
            return WorkerExit::Stopped;
        };
        let failed = match outcome {
            CycleOutcome::Cancelled => {
                complete_stop_if_drained(&ctx);
                return WorkerExit::Cancelled;
            }
            CycleOutcome::Succeeded => false,
            CycleOutcome::Failed => true,
        };

        // Stop is only observed between cycles, never mid-request.
        if ctx.state.phase() == EnginePhase::Stopping {
            complete_stop_if_drained(&ctx);
            return WorkerExit::Stopped;
        }

        if !failed {
            consecutive_errors = 0;
            continue;
        }

        consecutive_errors += 1;
        if consecutive_errors >= ctx.config.max_consecutive_errors {
            engine_warn!(
                "Worker {} reached {} consecutive errors",
                ctx.worker,
                consecutive_errors
            );
            notify(
                &ctx,
                format!(
                    "Worker {} failed {} times in a row, stopped",
                    ctx.worker, consecutive_errors
                ),
                Severity::Error,
            );
            return WorkerExit::ThresholdExceeded { consecutive_errors };
        }
        engine_debug!(
            "Worker {} retrying in {:?} ({} consecutive errors)",
            ctx.worker,
            ctx.config.retry_delay,
            consecutive_errors
        );
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return WorkerExit::Cancelled,
            _ = tokio::time::sleep(ctx.config.retry_delay) => {}
        }
    }
}

/// One create-request-finalize cycle. Returns the item's id and how it ended,
/// or `None` when a pooled cycle found the engine no longer running.
pub(crate) async fn run_cycle(
    ctx: &WorkerContext,
    prompt: String,
    params: GenerationParams,
) -> Option<(ItemId, CycleOutcome)> {
    let id = ItemId::new(Uuid::new_v4().to_string());
    let item = GenerationItem::generating(id.clone(), prompt.clone(), params, (ctx.config.now_ms)());

    if ctx.worker == SINGLE_GENERATION {
        ctx.state.begin_request();
        ctx.store.append(item);
    } else if !ctx.state.try_begin_cycle(|| ctx.store.append(item)) {
        engine_debug!("Worker {} found the engine stopped before its cycle", ctx.worker);
        return None;
    }
    engine_debug!("Worker {} generating item {} ({})", ctx.worker, id, params);

    let request = GenerationRequest {
        prompt,
        params,
        stream: ctx.config.streaming,
    };
    let attempt_token = ctx.cancel.child_token();
    let started = Instant::now();
    let result = tokio::select! {
        biased;
        _ = attempt_token.cancelled() => {
            Err(GenerationError::new(FailureKind::Cancelled, "generation aborted"))
        }
        result = attempt(ctx, &id, &request) => result,
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let outcome = match result {
        Ok(content) if !content.is_empty() => {
            engine_info!(
                "Worker {} finished item {} in {} ms ({} chars)",
                ctx.worker,
                id,
                elapsed_ms,
                content.chars().count()
            );
            ctx.store.update(&id, ItemOutcome::Completed { content, elapsed_ms });
            notify(ctx, "Generation complete", Severity::Success);
            run_auto_behaviors(ctx, &id);
            CycleOutcome::Succeeded
        }
        Ok(content) => {
            engine_warn!("Worker {} item {} produced no content", ctx.worker, id);
            ctx.store.update(&id, ItemOutcome::Completed { content, elapsed_ms });
            notify(
                ctx,
                format!("{}: generation returned no content", label(ctx)),
                Severity::Warning,
            );
            CycleOutcome::Failed
        }
        Err(err) if err.kind == FailureKind::Cancelled => {
            engine_info!("Worker {} item {} aborted", ctx.worker, id);
            ctx.store.update(&id, ItemOutcome::Failed { elapsed_ms });
            CycleOutcome::Cancelled
        }
        Err(err) => {
            engine_warn!("Worker {} item {} failed: {}", ctx.worker, id, err);
            ctx.store.update(&id, ItemOutcome::Failed { elapsed_ms });
            notify(ctx, format!("{}: {}", label(ctx), err), Severity::Error);
            CycleOutcome::Failed
        }
    };

    ctx.state.end_request();
    Some((id, outcome))
}

async fn attempt(
    ctx: &WorkerContext,
    id: &ItemId,
    request: &GenerationRequest,
) -> Result<String, GenerationError> {
    match ctx.client.generate(request, &ctx.credential).await? {
        GenerationResponse::Complete(text) => Ok(text),
        GenerationResponse::Stream(stream) => {
            accumulate(stream, |text| {
                ctx.sink.emit(EngineEvent::Progress {
                    item_id: id.clone(),
                    received_chars: text.chars().count(),
                });
            })
            .await
        }
    }
}

fn run_auto_behaviors(ctx: &WorkerContext, id: &ItemId) {
    if ctx.config.auto_scroll {
        ctx.sink.emit(EngineEvent::ScrollToLatest);
    }
    if !ctx.config.auto_download {
        return;
    }
    let Some(downloader) = ctx.downloader.clone() else {
        return;
    };
    let Some(item) = ctx.store.get(id) else {
        return;
    };
    let Some(url) = item.media_url() else {
        engine_debug!("Item {} has no media URL; skipping auto-download", id);
        return;
    };
    tokio::spawn(async move {
        if let Err(err) = downloader.download(&url, &item.prompt).await {
            engine_warn!("Auto-download of {} failed: {}", url, err);
        }
    });
}

/// Finalize a graceful stop once nothing is left generating.
fn complete_stop_if_drained(ctx: &WorkerContext) {
    if ctx.store.generating_count() == 0 && ctx.state.finish_stop() {
        engine_info!("Worker {} completed the graceful stop", ctx.worker);
        announce_stop_completed(ctx.sink.as_ref());
    }
}

pub(crate) fn announce_stop_completed(sink: &dyn EventSink) {
    sink.emit(EngineEvent::Notify(Notification::new(
        "Stopped",
        Severity::Info,
    )));
    sink.emit(EngineEvent::StopCompleted);
}

fn label(ctx: &WorkerContext) -> String {
    if ctx.worker == SINGLE_GENERATION {
        "Generation".to_string()
    } else {
        format!("Worker {}", ctx.worker)
    }
}

fn notify(ctx: &WorkerContext, message: impl Into<String>, severity: Severity) {
    ctx.sink
        .emit(EngineEvent::Notify(Notification::new(message, severity)));
}
