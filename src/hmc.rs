use log::trace;
use ndarray::Array1;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::adaptation::Adaptation;
use crate::config::SamplerConfig;
use crate::error::Result;
use crate::integrator::{Direction, HamiltonianState, Leapfrog};
use crate::kernel::{
    find_reasonable_step_size, seeded_rng, validate_setup, HamiltonianKernel, TransitionStats,
};
use crate::momentum::DiagonalMass;
use crate::target::Target;

/// Hamiltonian Monte Carlo with a fixed number of leapfrog steps and a
/// Metropolis accept / reject step. Shares warm-up with [`crate::nuts::NUTS`].
pub struct HMC<D: Target> {
    target: D,
    config: SamplerConfig,
    adaptation: Adaptation,
    rng: SmallRng,
}

impl<D: Target> HMC<D> {
    pub fn new(target: D, config: SamplerConfig, initial_position: &Array1<f64>) -> Result<Self> {
        validate_setup(&target, &config, initial_position)?;
        let mut rng = seeded_rng(config.seed);
        let step_size = match config.initial_step_size {
            Some(step_size) => step_size,
            None => find_reasonable_step_size(
                &target,
                &DiagonalMass::new(target.dim()),
                initial_position,
                &mut rng,
            )?,
        };
        let adaptation = Adaptation::new(&config, target.dim(), step_size);
        Ok(Self {
            target,
            config,
            adaptation,
            rng,
        })
    }

    pub fn adaptation(&self) -> &Adaptation {
        &self.adaptation
    }

    fn is_accepted(&mut self, acceptance_probability: f64) -> bool {
        self.rng.gen_range(0.0..1.0) < acceptance_probability
    }
}

impl<D: Target> HamiltonianKernel for HMC<D> {
    fn config(&self) -> &SamplerConfig {
        &self.config
    }

    fn dim(&self) -> usize {
        self.target.dim()
    }

    fn step(&mut self, position: &Array1<f64>) -> Result<(Array1<f64>, TransitionStats)> {
        let metric = self.adaptation.metric().clone();
        let step_size = self.adaptation.step_size();
        let momentum = metric.sample(&mut self.rng);
        let start = HamiltonianState::new(&self.target, position.clone(), momentum)?;
        let h0 = start.hamiltonian(&metric);
        let (end, valid) = Leapfrog::new(&self.target, &metric).integrate(
            &start,
            step_size,
            Direction::Forward,
            self.config.n_leapfrog,
        )?;
        let h1 = if valid {
            end.hamiltonian(&metric)
        } else {
            f64::INFINITY
        };
        let divergent = !(h1 - h0 <= self.config.max_delta);
        let acceptance_probability = if divergent {
            trace!("divergent trajectory: energy {h1}, initial energy {h0}");
            0.
        } else {
            (h0 - h1).min(0.).exp()
        };

        let accepted = !divergent && self.is_accepted(acceptance_probability);
        let state = if accepted { end } else { start };
        let stats = TransitionStats {
            accept_stat: acceptance_probability,
            step_size,
            tree_depth: 0,
            n_leapfrog: self.config.n_leapfrog,
            divergent,
            max_depth_reached: false,
            energy: state.hamiltonian(&metric),
            log_density: state.log_density,
        };
        Ok((state.position, stats))
    }

    fn adapt(&mut self, accept_stat: f64, position: &Array1<f64>) {
        self.adaptation.adapt(accept_stat, position);
    }

    fn step_size(&self) -> f64 {
        self.adaptation.step_size()
    }

    fn inverse_mass(&self) -> &Array1<f64> {
        self.adaptation.metric().inverse()
    }
}
