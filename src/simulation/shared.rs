use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::state::{LoopState, SimulationState};
use super::stepper::{Simulation, TickOutcome};
use crate::controller::FuzzyController;

// ============================================================================
// SIMULATION HANDLE - One lock around the whole tick, shared by callers
// ============================================================================

/// Cloneable handle for hosts that drive one simulation from several places.
///
/// Every tick runs under a single mutex so its sub-steps see a consistent
/// prior state; `run` keeps the lock for the whole batch. `infer` only needs
/// the immutable controller and never takes the lock.
pub struct SimulationHandle<R = StdRng> {
    inner: Arc<Mutex<Simulation<R>>>,
    controller: Arc<FuzzyController>,
    cancel: Arc<AtomicBool>,
}

impl<R> Clone for SimulationHandle<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            controller: Arc::clone(&self.controller),
            cancel: Arc::clone(&self.cancel),
        }
    }
}

impl<R: Rng> SimulationHandle<R> {
    pub fn new(simulation: Simulation<R>) -> Self {
        let controller = Arc::clone(simulation.controller());
        Self {
            inner: Arc::new(Mutex::new(simulation)),
            controller,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn step(&self) -> SimulationState {
        self.inner.lock().step()
    }

    pub fn step_with_alerts(&self) -> TickOutcome {
        self.inner.lock().step_with_alerts()
    }

    /// Runs up to `n` ticks. A `cancel` from another caller stops the batch
    /// between ticks; the states completed so far are returned.
    pub fn run(&self, n: usize) -> Vec<SimulationState> {
        let mut sim = self.inner.lock();
        let states = sim.run_cancellable(n, &self.cancel);
        self.cancel.store(false, Ordering::Relaxed);
        states
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    pub fn infer(
        &self,
        error: f64,
        error_delta: f64,
        external_temp: f64,
        thermal_load: f64,
    ) -> f64 {
        self.controller
            .infer(error, error_delta, external_temp, thermal_load)
    }

    /// Requests the batch currently in `run` to stop.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Clears a pending cancel request, reporting whether there was one.
    pub fn take_cancel(&self) -> bool {
        self.cancel.swap(false, Ordering::Relaxed)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn loop_state(&self) -> LoopState {
        *self.inner.lock().loop_state()
    }

    /// Runs `f` with exclusive access to the simulation.
    pub fn with<T>(&self, f: impl FnOnce(&mut Simulation<R>) -> T) -> T {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }
}
