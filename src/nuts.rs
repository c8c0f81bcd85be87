use log::debug;
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
use crate::tree_builder::{accept_new_subtree, no_u_turn, TreeBuilder};

/// No-U-Turn sampler with slice-based candidate selection and windowed
/// adaptation of the step size and a diagonal mass matrix.
pub struct NUTS<D: Target> {
    target: D,
    config: SamplerConfig,
    adaptation: Adaptation,
    rng: SmallRng,
}

impl<D: Target> NUTS<D> {
    /// Validates the configuration and picks the initial step size, searching
    /// for one from `initial_position` unless the configuration fixes it.
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
        debug!("initial step size {step_size}");
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

    pub fn target(&self) -> &D {
        &self.target
    }
}

impl<D: Target> HamiltonianKernel for NUTS<D> {
    fn config(&self) -> &SamplerConfig {
        &self.config
    }

    fn dim(&self) -> usize {
        self.target.dim()
    }

    fn step(&mut self, position: &Array1<f64>) -> Result<(Array1<f64>, TransitionStats)> {
        let metric = self.adaptation.metric();
        let step_size = self.adaptation.step_size();
        let momentum = metric.sample(&mut self.rng);
        let start = HamiltonianState::new(&self.target, position.clone(), momentum)?;
        let h0 = start.hamiltonian(metric);
        let log_slice = self.rng.gen_range(0.0..1.0_f64).ln() - h0;

        let mut builder = TreeBuilder::new(
            Leapfrog::new(&self.target, metric),
            &mut self.rng,
            step_size,
            log_slice,
            h0,
            self.config.max_delta,
        );
        let mut backward = start.clone();
        let mut forward = start.clone();
        let mut candidate = start;
        let mut n = 1;
        let mut continues = true;
        let mut depth = 0;
        let mut accept_stat = 0.;
        let mut divergent = false;
        while continues && depth <= self.config.max_depth {
            let direction = if builder.rng().gen_range(0.0..1.0) < 0.5_f64 {
                Direction::Backward
            } else {
                Direction::Forward
            };
            let tree = match direction {
                Direction::Backward => builder.build(&backward, direction, depth)?,
                Direction::Forward => builder.build(&forward, direction, depth)?,
            };
            accept_stat = tree.accept_stat();
            divergent |= tree.divergent;
            if tree.continues && accept_new_subtree(builder.rng(), n, tree.n_in_slice) {
                candidate = tree.candidate;
            }
            n += tree.n_in_slice;
            match direction {
                Direction::Backward => backward = tree.minus,
                Direction::Forward => forward = tree.plus,
            }
            continues = tree.continues && no_u_turn(&backward, &forward);
            depth += 1;
        }

        let stats = TransitionStats {
            accept_stat,
            step_size,
            tree_depth: depth,
            n_leapfrog: builder.n_leapfrog(),
            divergent,
            max_depth_reached: continues,
            energy: candidate.hamiltonian(metric),
            log_density: candidate.log_density,
        };
        Ok((candidate.position, stats))
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
