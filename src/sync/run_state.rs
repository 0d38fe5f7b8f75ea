//! Run gating: the process-wide enable flag, the single-run lock and the
//! per-run context handed to every checkpoint.

use crate::types::StopReason;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

/// Decides whether runs may start and makes sure at most one runs at a time
///
/// The gate starts enabled. It is disabled by the kill switch (an unsafe job
/// id) or by an explicit [`deactivate`](RunGate::deactivate), and stays disabled
/// until [`activate`](RunGate::activate) is called.
///
/// Every deactivation bumps a generation counter. A run remembers the
/// generation it started in, so re-activating the gate lets the next run start
/// but never revives a run that was already stopped.
#[derive(Debug)]
pub struct RunGate {
    enabled: AtomicBool,
    generation: AtomicU64,
    run_lock: Arc<Mutex<()>>,
}

impl Default for RunGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RunGate {
    /// Create an enabled gate
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            generation: AtomicU64::new(0),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Allow new runs again
    pub fn activate(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    /// Refuse new runs and stop the current one at its next checkpoint
    pub fn deactivate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.enabled.store(false, Ordering::SeqCst);
    }

    /// Whether runs may proceed
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Whether a run currently holds the single-run lock
    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Take the single-run lock without waiting
    ///
    /// Returns `None` if another run holds it. The lock is released when the
    /// returned context is dropped.
    pub fn begin(self: &Arc<Self>, cancel: CancellationToken) -> Option<RunContext> {
        let guard = self.run_lock.clone().try_lock_owned().ok()?;
        Some(self.context(guard, cancel))
    }

    /// Take the single-run lock, then re-enable the gate for the new run
    ///
    /// Nothing is re-enabled when the lock is held elsewhere, so a refused
    /// trigger cannot undo the kill switch or a deactivation of the run in
    /// progress.
    pub fn begin_activated(self: &Arc<Self>, cancel: CancellationToken) -> Option<RunContext> {
        let guard = self.run_lock.clone().try_lock_owned().ok()?;
        self.activate();
        Some(self.context(guard, cancel))
    }

    fn context(self: &Arc<Self>, guard: OwnedMutexGuard<()>, cancel: CancellationToken) -> RunContext {
        RunContext {
            gate: Arc::clone(self),
            generation: self.generation.load(Ordering::SeqCst),
            cancel,
            killed: AtomicBool::new(false),
            _guard: guard,
        }
    }
}

/// State of one run, passed explicitly to the page loop and the job processor
#[derive(Debug)]
pub struct RunContext {
    gate: Arc<RunGate>,
    generation: u64,
    cancel: CancellationToken,
    killed: AtomicBool,
    _guard: OwnedMutexGuard<()>,
}

impl RunContext {
    /// Checkpoint: may the run keep going?
    ///
    /// Once this returns false it keeps returning false for this run.
    pub fn is_active(&self) -> bool {
        !self.kill_switch_tripped()
            && self.gate.is_enabled()
            && self.gate.generation.load(Ordering::SeqCst) == self.generation
            && !self.cancel.is_cancelled()
    }

    /// Disable the gate because this run saw an unsafe identifier
    pub fn trip_kill_switch(&self) {
        self.killed.store(true, Ordering::SeqCst);
        self.gate.deactivate();
    }

    /// Whether this run tripped the kill switch
    pub fn kill_switch_tripped(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }

    /// Reason to report once a checkpoint has failed
    pub(crate) fn halt_reason(&self) -> StopReason {
        if self.kill_switch_tripped() {
            StopReason::KillSwitch
        } else {
            StopReason::Cancelled
        }
    }
}
