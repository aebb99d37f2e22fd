//! Runtime module - Wall-clock paced driver for a shared simulation

use rand::Rng;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::simulation::SimulationHandle;

/// Steps `handle` once per `period` until `max_ticks` is reached, the handle
/// is cancelled, or Ctrl-C arrives. Returns the number of ticks executed.
pub async fn run_paced<R: Rng>(
    handle: SimulationHandle<R>,
    period: Duration,
    max_ticks: Option<u64>,
) -> u64 {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut ticks = 0u64;
    loop {
        if max_ticks.map_or(false, |max| ticks >= max) {
            break;
        }
        if handle.take_cancel() {
            info!(ticks, "paced run cancelled");
            break;
        }

        tokio::select! {
            _ = timer.tick() => {}
            _ = &mut shutdown => {
                info!(ticks, "interrupt received, stopping paced run");
                break;
            }
        }

        let outcome = handle.step_with_alerts();
        ticks += 1;
        if !outcome.alerts.is_empty() {
            info!(minute = outcome.state.minute, alerts = outcome.alerts.len(), "tick raised alerts");
        }
    }
    ticks
}
