//! Simulation configuration

use crate::error::{CdmaError, CdmaResult};
use crate::walsh::MAX_ORDER;

/// Parameters of a simulation run: one transmission round plus a BER sweep
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Walsh order n, giving 2^n stations
    pub order: u32,

    /// Channel noise standard deviation for the single round
    pub noise_sigma: f32,

    /// Noise levels for the BER sweep, in sweep order
    pub sigma_levels: Vec<f32>,

    /// Independent trials per noise level
    pub trials_per_level: usize,

    /// Seed for data bits and channel noise
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            order: 3,
            noise_sigma: 0.1,
            sigma_levels: vec![0.0, 0.25, 0.5, 1.0, 1.5, 2.0],
            trials_per_level: 200,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Default setup with a clean channel for the single round
    pub fn noiseless() -> Self {
        Self {
            noise_sigma: 0.0,
            ..Self::default()
        }
    }

    pub fn num_stations(&self) -> usize {
        1usize << self.order.min(MAX_ORDER)
    }

    /// Check every parameter before any work is done
    pub fn validate(&self) -> CdmaResult<()> {
        if self.order == 0 || self.order > MAX_ORDER {
            return Err(CdmaError::InvalidConfiguration(format!(
                "order must be in 1..={}, got {}",
                MAX_ORDER, self.order
            )));
        }
        if !self.noise_sigma.is_finite() || self.noise_sigma < 0.0 {
            return Err(CdmaError::InvalidConfiguration(format!(
                "noise sigma must be finite and >= 0, got {}",
                self.noise_sigma
            )));
        }
        if self.sigma_levels.is_empty() {
            return Err(CdmaError::InvalidConfiguration("no BER noise levels".to_string()));
        }
        if let Some(bad) = self.sigma_levels.iter().find(|s| !s.is_finite() || **s < 0.0) {
            return Err(CdmaError::InvalidConfiguration(format!(
                "BER noise level {} is not a finite sigma >= 0",
                bad
            )));
        }
        if self.trials_per_level == 0 {
            return Err(CdmaError::InvalidConfiguration(
                "trials per level must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
