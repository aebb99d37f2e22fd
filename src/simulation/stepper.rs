use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::state::{LoopState, SimulationState};
use crate::alert::{AlertDetector, AlertEvent};
use crate::config::{SimulationConfig, TemperatureClamp};
use crate::controller::{crac_controller_config, FuzzyController};
use crate::error::ConfigError;
use crate::metrics::TimingMetrics;
use crate::plant::{DisturbanceProfile, PlantModel};
use crate::telemetry::{Publisher, TelemetrySink, Topics};

/// Fixed parameters of the loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopParams {
    pub setpoint: f64,
    pub horizon: u32,
    pub temperature_clamp: Option<TemperatureClamp>,
}

/// Everything a tick reads without mutating.
pub struct TickContext<'a> {
    pub params: &'a LoopParams,
    pub controller: &'a FuzzyController,
    pub plant: &'a PlantModel,
    pub metrics: &'a TimingMetrics,
}

/// One closed-loop tick: sample disturbances, compute error terms, infer,
/// advance the plant, then roll the loop state forward.
pub fn advance<R: Rng>(
    state: &mut LoopState,
    disturbances: &mut DisturbanceProfile<R>,
    ctx: &TickContext<'_>,
) -> SimulationState {
    let minute = state.minute;
    let sample = disturbances.sample(minute);

    let error = state.temperature - ctx.params.setpoint;
    let error_delta = error - state.previous_error;

    let started = Instant::now();
    let control_output = ctx.controller.infer(
        error,
        error_delta,
        sample.external_temp,
        sample.thermal_load,
    );
    ctx.metrics.record_inference(started.elapsed());

    let mut temperature = ctx.plant.next_temperature(
        state.temperature,
        control_output,
        sample.thermal_load,
        sample.external_temp,
    );
    if let Some(clamp) = ctx.params.temperature_clamp {
        temperature = clamp.apply(temperature);
    }

    state.temperature = temperature;
    state.previous_error = error;
    state.minute = (minute + 1) % ctx.params.horizon;

    debug!(minute, temperature, error, error_delta, control_output, "tick");

    SimulationState {
        minute,
        temperature,
        error,
        error_delta,
        control_output,
        thermal_load: sample.thermal_load,
        external_temp: sample.external_temp,
    }
}

/// State emitted by a tick together with the alerts it raised.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub state: SimulationState,
    pub alerts: Vec<AlertEvent>,
}

// ============================================================================
// SIMULATION - Owns one closed loop, its alert windows and its telemetry
// ============================================================================

pub struct Simulation<R = StdRng> {
    params: LoopParams,
    controller: Arc<FuzzyController>,
    plant: PlantModel,
    loop_state: LoopState,
    disturbances: DisturbanceProfile<R>,
    detector: AlertDetector,
    publisher: Publisher,
    metrics: TimingMetrics,
}

/// Builds the controller a config asks for: its own rule base if present,
/// the CRAC default otherwise.
pub fn build_controller(config: &SimulationConfig) -> Result<FuzzyController, ConfigError> {
    let mut controller_config = config
        .controller
        .clone()
        .unwrap_or_else(crac_controller_config);
    if let Some(step) = config.output_resolution {
        controller_config.output.universe.resolution = step;
    }
    Ok(FuzzyController::new(controller_config, config.fallback_output)?)
}

impl Simulation<StdRng> {
    /// Seeds the disturbance source from `config.seed`.
    pub fn from_config(
        config: &SimulationConfig,
        sink: Box<dyn TelemetrySink>,
    ) -> Result<Self, ConfigError> {
        let controller = Arc::new(build_controller(config)?);
        Self::with_parts(config, controller, StdRng::seed_from_u64(config.seed), sink)
    }
}

impl<R: Rng> Simulation<R> {
    /// Assembles a simulation around an existing controller and random source.
    pub fn with_parts(
        config: &SimulationConfig,
        controller: Arc<FuzzyController>,
        rng: R,
        sink: Box<dyn TelemetrySink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let params = LoopParams {
            setpoint: config.setpoint,
            horizon: config.horizon,
            temperature_clamp: config.temperature_clamp,
        };
        Ok(Self {
            params,
            controller,
            plant: config.plant,
            loop_state: LoopState::initial(config.setpoint),
            disturbances: DisturbanceProfile::new(config.disturbances.clone(), rng)?,
            detector: AlertDetector::new(config.alerts.clone()),
            publisher: Publisher::new(sink, Topics::with_prefix(&config.telemetry.topic_prefix)),
            metrics: TimingMetrics::new(),
        })
    }

    /// Shares an existing metrics collector instead of the private one.
    pub fn with_metrics(mut self, metrics: TimingMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn step(&mut self) -> SimulationState {
        self.step_with_alerts().state
    }

    pub fn step_with_alerts(&mut self) -> TickOutcome {
        let started = Instant::now();
        let ctx = TickContext {
            params: &self.params,
            controller: &self.controller,
            plant: &self.plant,
            metrics: &self.metrics,
        };
        let state = advance(&mut self.loop_state, &mut self.disturbances, &ctx);
        let alerts = self.detector.observe(&state);

        let failed = self.publisher.publish_tick(&state, &alerts);
        self.metrics.record_publish_failures(failed);
        self.metrics.record_alerts(alerts.len());
        self.metrics.record_tick(started.elapsed());

        TickOutcome { state, alerts }
    }

    /// `n` consecutive steps, identical to calling `step` `n` times.
    pub fn run(&mut self, n: usize) -> Vec<SimulationState> {
        (0..n).map(|_| self.step()).collect()
    }

    /// Like `run`, but checks `cancel` between ticks and returns the states
    /// produced so far once it is set.
    pub fn run_cancellable(&mut self, n: usize, cancel: &AtomicBool) -> Vec<SimulationState> {
        let mut states = Vec::with_capacity(n);
        for _ in 0..n {
            if cancel.load(Ordering::Relaxed) {
                info!(completed = states.len(), requested = n, "run cancelled");
                break;
            }
            states.push(self.step());
        }
        states
    }

    /// Back to minute 0 at the setpoint with empty alert windows. The
    /// controller and the random source are left as they are.
    pub fn reset(&mut self) {
        self.loop_state = LoopState::initial(self.params.setpoint);
        self.detector.reset();
        info!(setpoint = self.params.setpoint, "simulation reset");
    }

    /// Direct controller call that bypasses the loop.
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

    pub fn loop_state(&self) -> &LoopState {
        &self.loop_state
    }

    pub fn params(&self) -> &LoopParams {
        &self.params
    }

    pub fn controller(&self) -> &Arc<FuzzyController> {
        &self.controller
    }

    pub fn metrics(&self) -> &TimingMetrics {
        &self.metrics
    }

    pub fn publish_failures(&self) -> u64 {
        self.publisher.failures()
    }
}

impl<R: Rng + SeedableRng> Simulation<R> {
    /// Restarts the disturbance stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.disturbances.reseed(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::NullSink;

    fn sim(config: &SimulationConfig) -> Simulation {
        Simulation::from_config(config, Box::new(NullSink)).unwrap()
    }

    #[test]
    fn first_tick_starts_at_setpoint() {
        let mut s = sim(&SimulationConfig::default());
        let first = s.step();
        assert_eq!(first.minute, 0);
        assert_eq!(first.error, 0.0);
        assert_eq!(first.error_delta, 0.0);
        assert_eq!(s.loop_state().minute, 1);
        assert_eq!(s.loop_state().temperature, first.temperature);
    }

    #[test]
    fn error_delta_tracks_previous_error() {
        let mut s = sim(&SimulationConfig::default());
        let states = s.run(5);
        for pair in states.windows(2) {
            let expected = pair[1].error - pair[0].error;
            assert!((pair[1].error_delta - expected).abs() < 1e-12);
            assert!((pair[1].error - (pair[0].temperature - 22.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn minute_wraps_at_horizon() {
        let config = SimulationConfig {
            horizon: 3,
            ..SimulationConfig::default()
        };
        let mut s = sim(&config);
        let minutes: Vec<u32> = s.run(7).iter().map(|st| st.minute).collect();
        assert_eq!(minutes, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn clamp_bounds_plant_output() {
        let config = SimulationConfig {
            temperature_clamp: Some(TemperatureClamp { min: 21.0, max: 22.5 }),
            ..SimulationConfig::default()
        };
        let mut s = sim(&config);
        assert!(s
            .run(200)
            .iter()
            .all(|st| (21.0..=22.5).contains(&st.temperature)));
    }

    #[test]
    fn reset_restores_loop_but_keeps_controller() {
        let mut s = sim(&SimulationConfig::default());
        let controller = Arc::clone(s.controller());
        s.run(30);
        s.reset();
        assert_eq!(*s.loop_state(), LoopState::initial(22.0));
        assert!(Arc::ptr_eq(&controller, s.controller()));
    }

    #[test]
    fn shared_metrics_count_both_loops() {
        let metrics = TimingMetrics::new();
        let config = SimulationConfig::default();
        let mut a = sim(&config).with_metrics(metrics.clone());
        let mut b = sim(&config).with_metrics(metrics.clone());
        a.run(3);
        b.run(4);
        assert_eq!(metrics.report().ticks, 7);
        assert_eq!(a.metrics().report().ticks, 7);
    }

    #[test]
    fn cancelled_run_returns_partial_results() {
        let mut s = sim(&SimulationConfig::default());
        let cancel = AtomicBool::new(true);
        assert!(s.run_cancellable(10, &cancel).is_empty());
        cancel.store(false, Ordering::Relaxed);
        assert_eq!(s.run_cancellable(10, &cancel).len(), 10);
    }
}
