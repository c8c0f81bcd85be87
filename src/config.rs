use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sampler configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Total number of iterations, warm-up included.
    pub n_iters: usize,

    /// Warm-up length. Adaptation is frozen once this many iterations ran.
    pub n_adapts: usize,

    /// Target acceptance statistic for dual averaging, in (0, 1).
    pub delta: f64,

    /// Energy error above which a leaf is considered divergent.
    pub max_delta: f64,

    /// Maximum doubling depth of the NUTS tree.
    pub max_depth: usize,

    /// Step-size-only iterations at the start of warm-up.
    pub init_buffer: usize,

    /// Step-size-only iterations at the end of warm-up.
    pub term_buffer: usize,

    /// Length of the first mass-matrix window; doubles every window.
    pub window_size: usize,

    pub adapt_step_size: bool,

    pub adapt_mass_matrix: bool,

    /// Skip the step size search and start from this value.
    pub initial_step_size: Option<f64>,

    /// Leapfrog steps per iteration for the static trajectory kernel.
    pub n_leapfrog: usize,

    /// Seed for the chain's RNG stream; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            n_iters: 2000,
            n_adapts: 1000,
            delta: 0.8,
            max_delta: 1000.0,
            max_depth: 5,
            init_buffer: 75,
            term_buffer: 50,
            window_size: 25,
            adapt_step_size: true,
            adapt_mass_matrix: true,
            initial_step_size: None,
            n_leapfrog: 10,
            seed: None,
        }
    }
}

impl SamplerConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<()> {
        if !(self.delta > 0.0 && self.delta < 1.0) {
            return Err(Error::Config(format!(
                "delta must be in (0, 1), got {}",
                self.delta
            )));
        }
        if self.n_adapts > self.n_iters {
            return Err(Error::Config(format!(
                "n_adapts ({}) must not exceed n_iters ({})",
                self.n_adapts, self.n_iters
            )));
        }
        if !(self.max_delta > 0.0) {
            return Err(Error::Config(format!(
                "max_delta must be > 0, got {}",
                self.max_delta
            )));
        }
        if self.window_size == 0 {
            return Err(Error::Config("window_size must be >= 1".to_string()));
        }
        // the last window end restarts dual averaging, at least one update must follow it
        if self.term_buffer == 0 {
            return Err(Error::Config("term_buffer must be >= 1".to_string()));
        }
        if self.n_leapfrog == 0 {
            return Err(Error::Config("n_leapfrog must be >= 1".to_string()));
        }
        if let Some(eps) = self.initial_step_size {
            if !(eps.is_finite() && eps > 0.0) {
                return Err(Error::Config(format!(
                    "initial_step_size must be finite and > 0, got {eps}"
                )));
            }
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("JSON parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
