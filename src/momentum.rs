use ndarray::Array1;
use rand::Rng;
use rand_distr::StandardNormal;

/// Diagonal Euclidean metric.
///
/// Stores the inverse mass diagonal `M⁻¹`, which is what the warm-up
/// estimates (the posterior variance). Momenta are drawn from `N(0, M)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalMass {
    inv_mass: Array1<f64>,
}

impl DiagonalMass {
    /// Unit metric in `dim` dimensions.
    pub fn new(dim: usize) -> Self {
        DiagonalMass {
            inv_mass: Array1::ones(dim),
        }
    }

    pub fn from_inverse(inv_mass: Array1<f64>) -> Self {
        DiagonalMass { inv_mass }
    }

    pub fn dim(&self) -> usize {
        self.inv_mass.len()
    }

    pub fn inverse(&self) -> &Array1<f64> {
        &self.inv_mass
    }

    pub fn set_inverse(&mut self, inv_mass: Array1<f64>) {
        debug_assert_eq!(inv_mass.len(), self.inv_mass.len());
        self.inv_mass = inv_mass;
    }

    /// Draw a momentum `r ~ N(0, M)`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Array1<f64> {
        self.inv_mass.mapv(|minv| {
            let z: f64 = rng.sample(StandardNormal);
            z / minv.sqrt()
        })
    }

    /// `M⁻¹ r`
    pub fn velocity(&self, momentum: &Array1<f64>) -> Array1<f64> {
        momentum * &self.inv_mass
    }

    /// `½ rᵀ M⁻¹ r`
    pub fn kinetic_energy(&self, momentum: &Array1<f64>) -> f64 {
        0.5 * (momentum * momentum * &self.inv_mass).sum()
    }

    /// Total energy `-log p(θ) + ½ rᵀ M⁻¹ r`.
    pub fn hamiltonian(&self, log_density: f64, momentum: &Array1<f64>) -> f64 {
        -log_density + self.kinetic_energy(momentum)
    }
}
