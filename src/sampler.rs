use log::{debug, info};
use ndarray::{Array1, Array2, Axis};

use crate::error::Result;
use crate::kernel::{HamiltonianKernel, TransitionStats};
use crate::target::check_dim;

/// Output of one chain.
#[derive(Debug, Clone)]
pub struct Chain {
    /// Post-warm-up draws, one row per iteration.
    pub samples: Array2<f64>,
    /// Diagnostics for every iteration, warm-up included.
    pub stats: Vec<TransitionStats>,
    pub step_size: f64,
    pub inverse_mass: Array1<f64>,
}

impl Chain {
    pub fn n_divergent(&self) -> usize {
        self.stats.iter().filter(|s| s.divergent).count()
    }

    pub fn mean(&self) -> Array1<f64> {
        self.samples
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::from_elem(self.samples.ncols(), f64::NAN))
    }

    /// Unbiased per-coordinate sample variance.
    pub fn variance(&self) -> Array1<f64> {
        if self.samples.nrows() < 2 {
            return Array1::from_elem(self.samples.ncols(), f64::NAN);
        }
        self.samples.var_axis(Axis(0), 1.0)
    }

    pub fn mean_accept_stat(&self) -> f64 {
        if self.stats.is_empty() {
            return f64::NAN;
        }
        self.stats.iter().map(|s| s.accept_stat).sum::<f64>() / self.stats.len() as f64
    }
}

/// Drives a kernel for `n_iters` iterations: step, then adapt, in order.
pub struct Sampler<K: HamiltonianKernel> {
    kernel: K,
}

impl<K: HamiltonianKernel> Sampler<K> {
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn into_kernel(self) -> K {
        self.kernel
    }

    pub fn run(&mut self, initial_position: Array1<f64>) -> Result<Chain> {
        check_dim(self.kernel.dim(), initial_position.len())?;
        let n_iters = self.kernel.config().n_iters;
        let n_adapts = self.kernel.config().n_adapts;
        let mut samples = Array2::zeros((n_iters - n_adapts, self.kernel.dim()));
        let mut stats = Vec::with_capacity(n_iters);
        let mut position = initial_position;
        debug!("sampling {n_iters} iterations, {n_adapts} of them warm-up");
        for i in 0..n_iters {
            let (next, transition) = self.kernel.step(&position)?;
            self.kernel.adapt(transition.accept_stat, &next);
            if i >= n_adapts {
                samples.row_mut(i - n_adapts).assign(&next);
            }
            stats.push(transition);
            position = next;
        }
        let chain = Chain {
            samples,
            stats,
            step_size: self.kernel.step_size(),
            inverse_mass: self.kernel.inverse_mass().clone(),
        };
        info!(
            "chain finished: step size {:.4}, {} divergent transitions, mean acceptance {:.3}",
            chain.step_size,
            chain.n_divergent(),
            chain.mean_accept_stat()
        );
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplerConfig;
    use crate::error::Error;
    use crate::hmc::HMC;
    use crate::nuts::NUTS;
    use crate::target::{DiagonalNormal, StandardNormal};
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    #[test]
    fn test_nuts_recovers_standard_normal() {
        let config = SamplerConfig {
            n_iters: 5000,
            n_adapts: 1000,
            seed: Some(2024),
            ..Default::default()
        };
        let init = arr1(&[1.5]);
        let nuts = NUTS::new(StandardNormal::new(1), config, &init).unwrap();
        let chain = Sampler::new(nuts).run(init).unwrap();
        assert_eq!(chain.samples.dim(), (4000, 1));
        assert_eq!(chain.stats.len(), 5000);
        assert!(chain.samples.iter().all(|x| x.is_finite()));
        assert_abs_diff_eq!(chain.mean()[0], 0.0, epsilon = 0.05);
        assert_abs_diff_eq!(chain.variance()[0], 1.0, epsilon = 0.1);
        // warm-up may diverge right after a step size restart, sampling may not
        assert!(chain.stats[1000..].iter().all(|s| !s.divergent));
        assert!(chain.step_size > 0.0 && chain.step_size <= 1.0);
    }

    #[test]
    fn test_mass_matrix_learns_scales() {
        let config = SamplerConfig {
            n_iters: 3000,
            n_adapts: 1000,
            seed: Some(8),
            ..Default::default()
        };
        let init = arr1(&[0.5, 0.5]);
        let target = DiagonalNormal::new(arr1(&[0.0, 3.0]), arr1(&[0.1, 4.0])).unwrap();
        let nuts = NUTS::new(target, config, &init).unwrap();
        let chain = Sampler::new(nuts).run(init).unwrap();
        // inverse mass tracks the posterior variances 0.01 and 16
        let ratio = chain.inverse_mass[1] / chain.inverse_mass[0];
        assert!(ratio > 300.0 && ratio < 5000.0, "{ratio}");
        assert_abs_diff_eq!(chain.mean()[1], 3.0, epsilon = 0.5);
        assert_abs_diff_eq!(chain.mean()[0], 0.0, epsilon = 0.02);
    }

    #[test]
    fn test_adapted_acceptance_near_target() {
        let config = SamplerConfig {
            n_iters: 3000,
            n_adapts: 1000,
            delta: 0.8,
            seed: Some(99),
            ..Default::default()
        };
        let init = arr1(&[0.0, 0.0, 0.0]);
        let nuts = NUTS::new(StandardNormal::new(3), config, &init).unwrap();
        let chain = Sampler::new(nuts).run(init).unwrap();
        let post: Vec<f64> = chain.stats[1000..].iter().map(|s| s.accept_stat).collect();
        let mean_accept = post.iter().sum::<f64>() / post.len() as f64;
        assert!(mean_accept > 0.6 && mean_accept < 0.97, "{mean_accept}");
    }

    #[test]
    fn test_static_hmc_through_sampler() {
        let config = SamplerConfig {
            n_iters: 300,
            n_adapts: 100,
            n_leapfrog: 8,
            seed: Some(5),
            ..Default::default()
        };
        let init = arr1(&[0.2, -0.4]);
        let hmc = HMC::new(StandardNormal::new(2), config, &init).unwrap();
        let mut sampler = Sampler::new(hmc);
        let chain = sampler.run(init).unwrap();
        assert_eq!(chain.samples.dim(), (200, 2));
        assert_eq!(chain.stats.len(), 300);
        assert!(sampler.kernel().adaptation().is_frozen());
        assert!(chain.stats.iter().all(|s| s.n_leapfrog == 8));
    }

    #[test]
    fn test_rejects_mismatched_initial_position() {
        let config = SamplerConfig {
            seed: Some(1),
            ..Default::default()
        };
        let nuts = NUTS::new(StandardNormal::new(2), config, &arr1(&[0.0, 0.0])).unwrap();
        let err = Sampler::new(nuts).run(arr1(&[0.0])).unwrap_err();
        assert_eq!(err, Error::Dimension { expected: 2, found: 1 });
    }
}
