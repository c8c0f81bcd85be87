use ndarray::Array1;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::SamplerConfig;
use crate::error::{Error, Result};
use crate::integrator::{Direction, HamiltonianState, Leapfrog};
use crate::momentum::DiagonalMass;
use crate::target::{check_dim, Target};

/// Per-iteration diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionStats {
    /// Statistic fed to step size adaptation. For NUTS this is the mean
    /// acceptance probability over the last doubling, for the static kernel
    /// the Metropolis acceptance probability.
    pub accept_stat: f64,
    pub step_size: f64,
    pub tree_depth: usize,
    pub n_leapfrog: usize,
    pub divergent: bool,
    /// The tree was still growing when the depth limit stopped it.
    pub max_depth_reached: bool,
    /// Hamiltonian of the returned state.
    pub energy: f64,
    pub log_density: f64,
}

/// The capabilities shared by all Hamiltonian transition kernels.
pub trait HamiltonianKernel {
    fn config(&self) -> &SamplerConfig;

    fn dim(&self) -> usize;

    /// Propose the next state from `position`.
    fn step(&mut self, position: &Array1<f64>) -> Result<(Array1<f64>, TransitionStats)>;

    /// Update warm-up state with the statistic and state of the last step.
    fn adapt(&mut self, accept_stat: f64, position: &Array1<f64>);

    /// Step size the next `step` will use.
    fn step_size(&self) -> f64;

    /// Current inverse mass diagonal.
    fn inverse_mass(&self) -> &Array1<f64>;
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

/// Checks shared by kernel constructors.
pub(crate) fn validate_setup<D: Target>(
    target: &D,
    config: &SamplerConfig,
    initial_position: &Array1<f64>,
) -> Result<()> {
    config.validate()?;
    if target.dim() == 0 {
        return Err(Error::Config("target dimension must be positive".to_string()));
    }
    check_dim(target.dim(), initial_position.len())
}

const MAX_SEARCH_STEPS: usize = 100;

/// Heuristic initial step size (Hoffman & Gelman 2014, Algorithm 4).
///
/// Doubles or halves the step size until the acceptance ratio of a single
/// leapfrog step crosses one half.
pub fn find_reasonable_step_size<D: Target, R: Rng>(
    target: &D,
    metric: &DiagonalMass,
    position: &Array1<f64>,
    rng: &mut R,
) -> Result<f64> {
    let leapfrog = Leapfrog::new(target, metric);
    let start = HamiltonianState::new(target, position.clone(), metric.sample(rng))?;
    let h0 = start.hamiltonian(metric);
    let log_ratio = |step_size: f64| -> Result<f64> {
        let (next, valid) = leapfrog.integrate(&start, step_size, Direction::Forward, 1)?;
        let h1 = next.hamiltonian(metric);
        if !valid || !h1.is_finite() {
            return Ok(f64::NEG_INFINITY);
        }
        Ok(h0 - h1)
    };

    let mut step_size = 1.;
    let mut ratio = log_ratio(step_size)?;
    let a: f64 = if ratio > 0.5_f64.ln() { 1. } else { -1. };
    for _ in 0..MAX_SEARCH_STEPS {
        if a * ratio <= -a * 2_f64.ln() {
            break;
        }
        step_size *= 2_f64.powf(a);
        if !(1e-10..=1e3).contains(&step_size) {
            break;
        }
        ratio = log_ratio(step_size)?;
    }
    Ok(step_size.clamp(1e-10, 1e3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::StandardNormal;
    use ndarray::arr1;

    #[test]
    fn test_reasonable_step_size_for_unit_normal() {
        let target = StandardNormal::new(2);
        let metric = DiagonalMass::new(2);
        let mut rng = SmallRng::seed_from_u64(11);
        let eps =
            find_reasonable_step_size(&target, &metric, &arr1(&[0.5, -0.5]), &mut rng).unwrap();
        assert!(eps > 0.1 && eps < 8.0, "{eps}");
        // power of two by construction
        assert_eq!(eps.log2().fract(), 0.);
    }

    #[test]
    fn test_reasonable_step_size_shrinks_for_narrow_target() {
        let target =
            crate::target::DiagonalNormal::new(arr1(&[0.0]), arr1(&[1e-3])).unwrap();
        let metric = DiagonalMass::new(1);
        let mut rng = SmallRng::seed_from_u64(2);
        let eps = find_reasonable_step_size(&target, &metric, &arr1(&[0.0]), &mut rng).unwrap();
        assert!(eps < 0.01, "{eps}");
    }

    #[test]
    fn test_setup_rejects_zero_dimension() {
        let target = StandardNormal::new(0);
        let err = validate_setup(&target, &SamplerConfig::default(), &Array1::zeros(0));
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn test_setup_rejects_wrong_initial_position() {
        let target = StandardNormal::new(2);
        let err = validate_setup(&target, &SamplerConfig::default(), &arr1(&[1.0]));
        assert_eq!(err, Err(Error::Dimension { expected: 2, found: 1 }));
    }
}
