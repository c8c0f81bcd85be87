use ndarray::Array1;

use crate::error::{Error, Result};

/// Distributions that can be targeted with the samplers in this crate.
///
/// Implementations act as the log-density / gradient oracle. Returning a
/// non-finite value is allowed and is handled as a divergence by the
/// integrator; returning `Err` aborts the chain.
pub trait Target {
    /// Dimensionality of the (unconstrained) position.
    fn dim(&self) -> usize;

    /// Logarithm of the unnormalized target density.
    fn log_density(&self, position: &Array1<f64>) -> Result<f64>;

    /// Log density and its gradient with respect to `position`.
    fn log_density_gradient(&self, position: &Array1<f64>) -> Result<(f64, Array1<f64>)>;
}

pub(crate) fn check_dim(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::Dimension { expected, found });
    }
    Ok(())
}

/// Independent standard normals in `dim` dimensions.
#[derive(Debug, Clone)]
pub struct StandardNormal {
    dim: usize,
    log_sqrt_2_pi: f64,
}

impl StandardNormal {
    pub fn new(dim: usize) -> Self {
        StandardNormal {
            dim,
            log_sqrt_2_pi: (2.0 * std::f64::consts::PI).sqrt().ln(),
        }
    }
}

impl Target for StandardNormal {
    fn dim(&self) -> usize {
        self.dim
    }

    fn log_density(&self, position: &Array1<f64>) -> Result<f64> {
        check_dim(self.dim, position.len())?;
        Ok(-0.5 * position.dot(position) - self.dim as f64 * self.log_sqrt_2_pi)
    }

    fn log_density_gradient(&self, position: &Array1<f64>) -> Result<(f64, Array1<f64>)> {
        let logp = self.log_density(position)?;
        Ok((logp, -position))
    }
}

/// Normal with diagonal covariance.
#[derive(Debug, Clone)]
pub struct DiagonalNormal {
    mean: Array1<f64>,
    precision: Array1<f64>,
}

impl DiagonalNormal {
    pub fn new(mean: Array1<f64>, std_dev: Array1<f64>) -> Result<Self> {
        check_dim(mean.len(), std_dev.len())?;
        if std_dev.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(Error::Config(
                "standard deviations must be finite and positive".to_string(),
            ));
        }
        Ok(DiagonalNormal {
            mean,
            precision: std_dev.mapv(|s| 1.0 / (s * s)),
        })
    }
}

impl Target for DiagonalNormal {
    fn dim(&self) -> usize {
        self.mean.len()
    }

    fn log_density(&self, position: &Array1<f64>) -> Result<f64> {
        check_dim(self.dim(), position.len())?;
        let diff = position - &self.mean;
        Ok(-0.5 * (&diff * &diff * &self.precision).sum())
    }

    fn log_density_gradient(&self, position: &Array1<f64>) -> Result<(f64, Array1<f64>)> {
        check_dim(self.dim(), position.len())?;
        let diff = position - &self.mean;
        let grad = -(&diff * &self.precision);
        Ok((-0.5 * (&diff * &diff * &self.precision).sum(), grad))
    }
}

/// Equal-weight mixture of two unit-variance normals.
#[derive(Debug, Clone)]
pub struct Bimodal {
    mode_a: Array1<f64>,
    mode_b: Array1<f64>,
}

impl Bimodal {
    pub fn new(mode_a: Array1<f64>, mode_b: Array1<f64>) -> Result<Self> {
        check_dim(mode_a.len(), mode_b.len())?;
        Ok(Bimodal { mode_a, mode_b })
    }

    fn component_log_densities(&self, position: &Array1<f64>) -> (f64, f64) {
        let da = position - &self.mode_a;
        let db = position - &self.mode_b;
        (-0.5 * da.dot(&da), -0.5 * db.dot(&db))
    }
}

impl Target for Bimodal {
    fn dim(&self) -> usize {
        self.mode_a.len()
    }

    fn log_density(&self, position: &Array1<f64>) -> Result<f64> {
        check_dim(self.dim(), position.len())?;
        let (la, lb) = self.component_log_densities(position);
        let max = la.max(lb);
        Ok(max + ((la - max).exp() + (lb - max).exp()).ln())
    }

    fn log_density_gradient(&self, position: &Array1<f64>) -> Result<(f64, Array1<f64>)> {
        let logp = self.log_density(position)?;
        let (la, lb) = self.component_log_densities(position);
        // posterior responsibilities of each component
        let wa = (la - logp).exp();
        let wb = (lb - logp).exp();
        let grad = (&self.mode_a - position) * wa + (&self.mode_b - position) * wb;
        Ok((logp, grad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    fn finite_difference<T: Target>(target: &T, position: &Array1<f64>) -> Array1<f64> {
        let h = 1e-6;
        Array1::from_shape_fn(position.len(), |i| {
            let mut up = position.clone();
            let mut down = position.clone();
            up[i] += h;
            down[i] -= h;
            (target.log_density(&up).unwrap() - target.log_density(&down).unwrap()) / (2.0 * h)
        })
    }

    #[test]
    fn test_standard_normal_density() {
        let target = StandardNormal::new(1);
        let logp = target.log_density(&arr1(&[0.0])).unwrap();
        assert_abs_diff_eq!(logp, -(2.0 * std::f64::consts::PI).sqrt().ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_gradients_match_finite_differences() {
        let x = arr1(&[0.3, -1.2]);
        let normal = DiagonalNormal::new(arr1(&[1.0, -2.0]), arr1(&[0.5, 2.0])).unwrap();
        let (_, grad) = normal.log_density_gradient(&x).unwrap();
        assert_abs_diff_eq!(grad, finite_difference(&normal, &x), epsilon = 1e-5);

        let bimodal = Bimodal::new(arr1(&[-2.0, -2.0]), arr1(&[2.0, 2.0])).unwrap();
        let (_, grad) = bimodal.log_density_gradient(&x).unwrap();
        assert_abs_diff_eq!(grad, finite_difference(&bimodal, &x), epsilon = 1e-5);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let target = StandardNormal::new(3);
        let err = target.log_density_gradient(&arr1(&[0.0])).unwrap_err();
        assert_eq!(err, Error::Dimension { expected: 3, found: 1 });
    }

    #[test]
    fn test_rejects_non_positive_std_dev() {
        assert!(DiagonalNormal::new(arr1(&[0.0]), arr1(&[0.0])).is_err());
    }
}
