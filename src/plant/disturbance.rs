use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::ConfigError;

pub const MINUTES_PER_DAY: u32 = 1440;

/// Thermal load base level starting at `start_minute` of the day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadBand {
    pub start_minute: u32,
    pub base: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisturbanceConfig {
    pub external_base: f64,
    pub external_amplitude: f64,
    /// Period of the external temperature sine, in minutes.
    pub external_period: u32,
    /// Standard deviation of the Gaussian noise on external temperature.
    pub external_noise_std: f64,
    pub load_bands: Vec<LoadBand>,
    /// Half-width of the uniform noise on thermal load.
    pub load_noise: f64,
}

impl Default for DisturbanceConfig {
    fn default() -> Self {
        Self {
            external_base: 20.0,
            external_amplitude: 10.0,
            external_period: MINUTES_PER_DAY,
            external_noise_std: 0.5,
            load_bands: vec![
                LoadBand { start_minute: 0, base: 35.0 },
                LoadBand { start_minute: 300, base: 70.0 },
                LoadBand { start_minute: 1000, base: 50.0 },
            ],
            load_noise: 5.0,
        }
    }
}

impl DisturbanceConfig {
    /// Same curves with every noise source switched off.
    pub fn noiseless(mut self) -> Self {
        self.external_noise_std = 0.0;
        self.load_noise = 0.0;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if !(self.external_base.is_finite() && self.external_amplitude.is_finite()) {
            return invalid("disturbances.external_base and external_amplitude must be finite".into());
        }
        if self.external_period == 0 {
            return invalid("disturbances.external_period must be positive".into());
        }
        if !(self.external_noise_std.is_finite() && self.external_noise_std >= 0.0) {
            return invalid("disturbances.external_noise_std must be >= 0".into());
        }
        if !(self.load_noise.is_finite() && self.load_noise >= 0.0) {
            return invalid("disturbances.load_noise must be >= 0".into());
        }
        if self.load_bands.is_empty() {
            return invalid("disturbances.load_bands must not be empty".into());
        }
        if let Some(band) = self.load_bands.iter().find(|b| !b.base.is_finite()) {
            return invalid(format!(
                "disturbances.load_bands base at minute {} must be finite",
                band.start_minute
            ));
        }
        if self
            .load_bands
            .windows(2)
            .any(|w| w[0].start_minute >= w[1].start_minute)
        {
            return invalid("disturbances.load_bands must be sorted by start_minute".into());
        }
        Ok(())
    }
}

/// One pair of disturbance samples for a minute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisturbanceSample {
    pub external_temp: f64,
    pub thermal_load: f64,
}

// ============================================================================
// DISTURBANCE PROFILE - Deterministic curves plus noise from an owned source
// ============================================================================

pub struct DisturbanceProfile<R = StdRng> {
    config: DisturbanceConfig,
    external_noise: Normal<f64>,
    rng: R,
}

impl DisturbanceProfile<StdRng> {
    pub fn seeded(config: DisturbanceConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> DisturbanceProfile<R> {
    pub fn new(config: DisturbanceConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let external_noise = Normal::new(0.0, config.external_noise_std)
            .map_err(|e| ConfigError::Invalid(format!("external noise: {}", e)))?;
        Ok(Self {
            config,
            external_noise,
            rng,
        })
    }

    pub fn config(&self) -> &DisturbanceConfig {
        &self.config
    }

    /// Base curve without noise.
    pub fn base_external_temp(&self, minute: u32) -> f64 {
        let phase = 2.0 * PI * f64::from(minute) / f64::from(self.config.external_period);
        self.config.external_base + self.config.external_amplitude * phase.sin()
    }

    /// Base level of the time-of-day band containing `minute`.
    pub fn base_thermal_load(&self, minute: u32) -> f64 {
        let minute_of_day = minute % MINUTES_PER_DAY;
        self.config
            .load_bands
            .iter()
            .take_while(|band| band.start_minute <= minute_of_day)
            .last()
            .unwrap_or(&self.config.load_bands[0])
            .base
    }

    pub fn external_temp(&mut self, minute: u32) -> f64 {
        let noise = if self.config.external_noise_std > 0.0 {
            self.external_noise.sample(&mut self.rng)
        } else {
            0.0
        };
        self.base_external_temp(minute) + noise
    }

    pub fn thermal_load(&mut self, minute: u32) -> f64 {
        let amplitude = self.config.load_noise;
        let noise = if amplitude > 0.0 {
            self.rng.gen_range(-amplitude..=amplitude)
        } else {
            0.0
        };
        (self.base_thermal_load(minute) + noise).clamp(0.0, 100.0)
    }

    /// External temperature first, then thermal load.
    pub fn sample(&mut self, minute: u32) -> DisturbanceSample {
        let external_temp = self.external_temp(minute);
        let thermal_load = self.thermal_load(minute);
        DisturbanceSample {
            external_temp,
            thermal_load,
        }
    }
}

impl<R: Rng + SeedableRng> DisturbanceProfile<R> {
    pub fn reseed(&mut self, seed: u64) {
        self.rng = R::seed_from_u64(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = DisturbanceProfile::seeded(DisturbanceConfig::default(), 7).unwrap();
        let mut b = DisturbanceProfile::seeded(DisturbanceConfig::default(), 7).unwrap();
        for minute in 0..100 {
            assert_eq!(a.sample(minute), b.sample(minute));
        }
    }

    #[test]
    fn reseed_restarts_stream() {
        let mut p = DisturbanceProfile::seeded(DisturbanceConfig::default(), 3).unwrap();
        let first: Vec<_> = (0..10).map(|m| p.sample(m)).collect();
        p.reseed(3);
        let again: Vec<_> = (0..10).map(|m| p.sample(m)).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn noiseless_profile_follows_base_curves() {
        let mut p =
            DisturbanceProfile::seeded(DisturbanceConfig::default().noiseless(), 0).unwrap();
        assert!((p.external_temp(0) - 20.0).abs() < 1e-12);
        assert!((p.external_temp(360) - 30.0).abs() < 1e-9);
        assert_eq!(p.thermal_load(0), 35.0);
        assert_eq!(p.thermal_load(299), 35.0);
        assert_eq!(p.thermal_load(300), 70.0);
        assert_eq!(p.thermal_load(1439), 50.0);
        assert_eq!(p.thermal_load(1440 + 300), 70.0);
    }

    #[test]
    fn load_noise_is_bounded_and_clamped() {
        let cfg = DisturbanceConfig {
            load_bands: vec![LoadBand { start_minute: 0, base: 98.0 }],
            load_noise: 5.0,
            ..DisturbanceConfig::default()
        };
        let mut p = DisturbanceProfile::seeded(cfg, 11).unwrap();
        for minute in 0..500 {
            let load = p.thermal_load(minute);
            assert!((93.0..=100.0).contains(&load), "load {load}");
        }
    }

    #[test]
    fn rejects_unsorted_bands_and_zero_period() {
        let cfg = DisturbanceConfig {
            load_bands: vec![
                LoadBand { start_minute: 300, base: 70.0 },
                LoadBand { start_minute: 0, base: 35.0 },
            ],
            ..DisturbanceConfig::default()
        };
        assert!(DisturbanceProfile::seeded(cfg, 0).is_err());

        let cfg = DisturbanceConfig {
            external_period: 0,
            ..DisturbanceConfig::default()
        };
        assert!(DisturbanceProfile::seeded(cfg, 0).is_err());
    }

    #[test]
    fn rejects_non_finite_levels() {
        let cfg = DisturbanceConfig {
            load_bands: vec![LoadBand { start_minute: 0, base: f64::NAN }],
            ..DisturbanceConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = DisturbanceConfig {
            external_amplitude: f64::INFINITY,
            ..DisturbanceConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
