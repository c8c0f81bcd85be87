use log::{debug, info};
use ndarray::Array1;

use crate::config::SamplerConfig;
use crate::mass_matrix::MassMatrixEstimator;
use crate::momentum::DiagonalMass;
use crate::step_size::DualAveraging;
use crate::window::{Phase, WindowSchedule};

/// Chain-local warm-up state: window schedule, dual averaging and the
/// mass-matrix accumulator, plus the step size and metric they produce.
#[derive(Debug, Clone)]
pub struct Adaptation {
    schedule: WindowSchedule,
    dual_averaging: DualAveraging,
    estimator: MassMatrixEstimator,
    metric: DiagonalMass,
    step_size: f64,
    adapt_step_size: bool,
    adapt_mass_matrix: bool,
}

impl Adaptation {
    pub fn new(config: &SamplerConfig, dim: usize, initial_step_size: f64) -> Self {
        Adaptation {
            schedule: WindowSchedule::new(
                config.n_adapts,
                config.init_buffer,
                config.term_buffer,
                config.window_size,
            ),
            dual_averaging: DualAveraging::new(config.delta, initial_step_size),
            estimator: MassMatrixEstimator::new(dim),
            metric: DiagonalMass::new(dim),
            step_size: initial_step_size,
            adapt_step_size: config.adapt_step_size,
            adapt_mass_matrix: config.adapt_mass_matrix,
        }
    }

    /// Feed the outcome of one iteration. No-op once warm-up is over.
    pub fn adapt(&mut self, accept_stat: f64, position: &Array1<f64>) {
        if !self.schedule.advance() {
            return;
        }
        if self.schedule.is_final() {
            if self.adapt_step_size {
                self.step_size = self.dual_averaging.final_step_size().min(1.0);
            }
            info!(
                "warm-up finished after {} iterations, step size {:.4}",
                self.schedule.iteration(),
                self.step_size
            );
            return;
        }

        let window_end = self.schedule.is_window_end();
        if self.adapt_step_size {
            self.dual_averaging.update(accept_stat, window_end);
            self.step_size = self.dual_averaging.step_size();
        }
        if self.adapt_mass_matrix {
            if self.schedule.in_adaptation() {
                self.estimator.add_sample(position);
            }
            if window_end {
                self.metric
                    .set_inverse(self.estimator.regularized_variance());
                debug!(
                    "iteration {}: refit mass matrix from {} samples",
                    self.schedule.iteration(),
                    self.estimator.count()
                );
                self.estimator.reset();
            }
        }
        if window_end {
            self.schedule.compute_next_window();
            debug!(
                "iteration {}: next window ends at {}",
                self.schedule.iteration(),
                self.schedule.next_window()
            );
        }
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn metric(&self) -> &DiagonalMass {
        &self.metric
    }

    pub fn schedule(&self) -> &WindowSchedule {
        &self.schedule
    }

    pub fn phase(&self) -> Phase {
        self.schedule.phase()
    }

    pub fn is_frozen(&self) -> bool {
        self.schedule.phase() == Phase::Frozen
    }
}
