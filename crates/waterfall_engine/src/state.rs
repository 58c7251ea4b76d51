use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Engine lifecycle: `Idle -> Running -> (Stopping) -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnginePhase {
    #[default]
    Idle,
    Running,
    Stopping,
}

impl EnginePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            EnginePhase::Idle => "idle",
            EnginePhase::Running => "running",
            EnginePhase::Stopping => "stopping",
        }
    }
}

/// Process-wide phase plus the number of workers currently mid-request.
///
/// `pool_active` outlives the phase: a stop can reach `Idle` while workers
/// are still leaving their retry delay, and no new pool may start until the
/// old one has been joined. `single_active` marks a generation running
/// outside the pool; it excludes a pool and vice versa.
#[derive(Debug, Default)]
pub(crate) struct EngineState {
    inner: Mutex<PhaseState>,
    active: AtomicUsize,
}

#[derive(Debug, Default)]
struct PhaseState {
    phase: EnginePhase,
    pool_active: bool,
    single_active: bool,
}

impl PhaseState {
    fn is_busy(&self) -> bool {
        self.pool_active || self.single_active || self.phase != EnginePhase::Idle
    }
}

impl EngineState {
    pub(crate) fn phase(&self) -> EnginePhase {
        self.lock().phase
    }

    /// A pool is running or still draining.
    pub(crate) fn is_busy(&self) -> bool {
        self.lock().is_busy()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.phase() == EnginePhase::Running
    }

    /// `Idle -> Running`; false while any pool or single generation is live.
    pub(crate) fn try_begin_run(&self) -> bool {
        let mut state = self.lock();
        if state.is_busy() {
            return false;
        }
        state.phase = EnginePhase::Running;
        state.pool_active = true;
        self.active.store(0, Ordering::SeqCst);
        true
    }

    /// Claim the engine for one generation outside the pool.
    pub(crate) fn try_begin_single(&self) -> bool {
        let mut state = self.lock();
        if state.is_busy() {
            return false;
        }
        state.single_active = true;
        true
    }

    pub(crate) fn end_single(&self) {
        self.lock().single_active = false;
    }

    /// Start a pooled cycle: counts the request and runs `begin` (the item
    /// insert) while holding the phase lock, but only if the engine is still
    /// running. A `request_stop` therefore either precedes the cycle and
    /// prevents it, or follows it and sees its item.
    pub(crate) fn try_begin_cycle(&self, begin: impl FnOnce()) -> bool {
        let state = self.lock();
        if state.phase != EnginePhase::Running {
            return false;
        }
        self.active.fetch_add(1, Ordering::SeqCst);
        begin();
        true
    }

    /// `Running -> Stopping`; returns the phase seen before the call.
    pub(crate) fn request_stop(&self) -> EnginePhase {
        let mut state = self.lock();
        let previous = state.phase;
        if previous == EnginePhase::Running {
            state.phase = EnginePhase::Stopping;
        }
        previous
    }

    /// `Stopping -> Idle`; only the first caller gets `true`.
    pub(crate) fn finish_stop(&self) -> bool {
        let mut state = self.lock();
        if state.phase == EnginePhase::Stopping {
            state.phase = EnginePhase::Idle;
            true
        } else {
            false
        }
    }

    /// Called once every worker of the pool has exited. Returns whether a
    /// pending graceful stop was completed by this call.
    pub(crate) fn end_run(&self) -> bool {
        let mut state = self.lock();
        let completed_stop = state.phase == EnginePhase::Stopping;
        state.phase = EnginePhase::Idle;
        state.pool_active = false;
        self.active.store(0, Ordering::SeqCst);
        completed_stop
    }

    pub(crate) fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn begin_request(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn end_request(&self) {
        let _ = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    fn lock(&self) -> MutexGuard<'_, PhaseState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
