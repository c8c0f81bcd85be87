use ndarray::Array1;

use crate::error::Result;
use crate::momentum::DiagonalMass;
use crate::target::{check_dim, Target};

/// Point in phase space together with the cached log density and gradient
/// at `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct HamiltonianState {
    pub position: Array1<f64>,
    pub momentum: Array1<f64>,
    pub log_density: f64,
    pub gradient: Array1<f64>,
}

impl HamiltonianState {
    /// Evaluate the oracle at `position` and pair it with `momentum`.
    pub fn new<D: Target>(
        target: &D,
        position: Array1<f64>,
        momentum: Array1<f64>,
    ) -> Result<Self> {
        let (log_density, gradient) = target.log_density_gradient(&position)?;
        check_dim(position.len(), gradient.len())?;
        Ok(HamiltonianState {
            position,
            momentum,
            log_density,
            gradient,
        })
    }

    pub fn hamiltonian(&self, metric: &DiagonalMass) -> f64 {
        metric.hamiltonian(self.log_density, &self.momentum)
    }

    pub fn is_finite(&self) -> bool {
        self.log_density.is_finite()
            && self.position.iter().all(|x| x.is_finite())
            && self.momentum.iter().all(|x| x.is_finite())
    }
}

/// Trajectory direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Backward => -1.0,
            Direction::Forward => 1.0,
        }
    }
}

/// Symplectic leapfrog integrator over a target and a diagonal metric.
pub struct Leapfrog<'a, D: Target> {
    target: &'a D,
    metric: &'a DiagonalMass,
}

impl<'a, D: Target> Leapfrog<'a, D> {
    pub fn new(target: &'a D, metric: &'a DiagonalMass) -> Self {
        Leapfrog { target, metric }
    }

    pub fn metric(&self) -> &'a DiagonalMass {
        self.metric
    }

    /// Take `n_steps` leapfrog steps of size `step_size` in `direction`.
    ///
    /// Returns the end state and whether it is valid. Integration stops at the
    /// first step whose position, momentum or log density is non-finite; the
    /// invalid state is returned as is. Oracle failures are propagated.
    pub fn integrate(
        &self,
        state: &HamiltonianState,
        step_size: f64,
        direction: Direction,
        n_steps: usize,
    ) -> Result<(HamiltonianState, bool)> {
        let eps = direction.sign() * step_size;
        let mut current = state.clone();
        for _ in 0..n_steps {
            current = self.step(&current, eps)?;
            if !current.is_finite() {
                return Ok((current, false));
            }
        }
        Ok((current, true))
    }

    fn step(&self, state: &HamiltonianState, eps: f64) -> Result<HamiltonianState> {
        let mut momentum = &state.momentum + &(&state.gradient * (eps / 2.0));
        let position = &state.position + &(self.metric.velocity(&momentum) * eps);
        let (log_density, gradient) = self.target.log_density_gradient(&position)?;
        check_dim(position.len(), gradient.len())?;
        momentum += &(&gradient * (eps / 2.0));
        Ok(HamiltonianState {
            position,
            momentum,
            log_density,
            gradient,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::target::StandardNormal;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    struct FailingTarget;

    impl Target for FailingTarget {
        fn dim(&self) -> usize {
            1
        }

        fn log_density(&self, _position: &Array1<f64>) -> Result<f64> {
            Ok(0.0)
        }

        fn log_density_gradient(&self, position: &Array1<f64>) -> Result<(f64, Array1<f64>)> {
            if position[0] == 0.0 {
                Ok((0.0, arr1(&[0.0])))
            } else {
                Err(Error::Gradient("no gradient away from the origin".to_string()))
            }
        }
    }

    struct NanTarget;

    impl Target for NanTarget {
        fn dim(&self) -> usize {
            1
        }

        fn log_density(&self, position: &Array1<f64>) -> Result<f64> {
            Ok(self.log_density_gradient(position)?.0)
        }

        fn log_density_gradient(&self, position: &Array1<f64>) -> Result<(f64, Array1<f64>)> {
            if position[0].abs() < 1.0 {
                Ok((-0.5 * position[0] * position[0], -position))
            } else {
                Ok((f64::NAN, arr1(&[f64::NAN])))
            }
        }
    }

    #[test]
    fn test_reversibility() {
        let target = StandardNormal::new(2);
        let metric = DiagonalMass::from_inverse(arr1(&[1.5, 0.7]));
        let leapfrog = Leapfrog::new(&target, &metric);
        let start = HamiltonianState::new(&target, arr1(&[0.4, -1.3]), arr1(&[0.9, 0.2])).unwrap();
        for &eps in &[0.01, 0.1, 0.4] {
            let (end, valid) = leapfrog.integrate(&start, eps, Direction::Forward, 1).unwrap();
            assert!(valid);
            let mut flipped = end.clone();
            flipped.momentum = -&end.momentum;
            let (back, valid) = leapfrog.integrate(&flipped, eps, Direction::Forward, 1).unwrap();
            assert!(valid);
            assert_abs_diff_eq!(back.position, start.position, epsilon = 1e-12);
            assert_abs_diff_eq!(back.momentum, -&start.momentum, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_backward_undoes_forward() {
        let target = StandardNormal::new(1);
        let metric = DiagonalMass::new(1);
        let leapfrog = Leapfrog::new(&target, &metric);
        let start = HamiltonianState::new(&target, arr1(&[1.0]), arr1(&[-0.5])).unwrap();
        let (mid, _) = leapfrog.integrate(&start, 0.2, Direction::Forward, 7).unwrap();
        let (back, _) = leapfrog.integrate(&mid, 0.2, Direction::Backward, 7).unwrap();
        assert_abs_diff_eq!(back.position, start.position, epsilon = 1e-10);
        assert_abs_diff_eq!(back.momentum, start.momentum, epsilon = 1e-10);
    }

    fn max_energy_error(eps: f64) -> f64 {
        let target = StandardNormal::new(1);
        let metric = DiagonalMass::new(1);
        let leapfrog = Leapfrog::new(&target, &metric);
        let mut state = HamiltonianState::new(&target, arr1(&[1.0]), arr1(&[0.0])).unwrap();
        let h0 = state.hamiltonian(&metric);
        let n_steps = (10.0 / eps).round() as usize;
        let mut max_err: f64 = 0.0;
        for _ in 0..n_steps {
            state = leapfrog.integrate(&state, eps, Direction::Forward, 1).unwrap().0;
            max_err = max_err.max((state.hamiltonian(&metric) - h0).abs());
        }
        max_err
    }

    #[test]
    fn test_energy_error_is_second_order() {
        let coarse = max_energy_error(0.2);
        let fine = max_energy_error(0.1);
        let finer = max_energy_error(0.05);
        assert!(coarse < 0.02, "coarse drift {coarse}");
        assert!(fine < coarse && finer < fine);
        // halving the step size divides the error by about four
        assert!((fine / finer) > 3.0 && (fine / finer) < 5.0, "{}", fine / finer);
        assert!((coarse / fine) > 3.0 && (coarse / fine) < 5.0, "{}", coarse / fine);
    }

    #[test]
    fn test_non_finite_marks_invalid() {
        let target = NanTarget;
        let metric = DiagonalMass::new(1);
        let leapfrog = Leapfrog::new(&target, &metric);
        let start = HamiltonianState::new(&target, arr1(&[0.5]), arr1(&[3.0])).unwrap();
        let (end, valid) = leapfrog.integrate(&start, 0.5, Direction::Forward, 10).unwrap();
        assert!(!valid);
        assert!(!end.is_finite());
    }

    #[test]
    fn test_oracle_failure_propagates() {
        let target = FailingTarget;
        let metric = DiagonalMass::new(1);
        let leapfrog = Leapfrog::new(&target, &metric);
        let start = HamiltonianState::new(&target, arr1(&[0.0]), arr1(&[1.0])).unwrap();
        let err = leapfrog.integrate(&start, 0.1, Direction::Backward, 1).unwrap_err();
        assert!(matches!(err, Error::Gradient(_)));
    }
}
