use ndarray::Array1;

/// Online mean / variance accumulator (Welford) used to estimate a diagonal
/// mass matrix during warm-up.
#[derive(Debug, Clone, PartialEq)]
pub struct MassMatrixEstimator {
    mean: Array1<f64>,
    // sum of squared deviations from the running mean
    m2: Array1<f64>,
    count: usize,
}

impl MassMatrixEstimator {
    pub fn new(dim: usize) -> Self {
        MassMatrixEstimator {
            mean: Array1::zeros(dim),
            m2: Array1::zeros(dim),
            count: 0,
        }
    }

    pub fn add_sample(&mut self, position: &Array1<f64>) {
        debug_assert_eq!(position.len(), self.mean.len());
        self.count += 1;
        let n = self.count as f64;
        let delta = position - &self.mean;
        self.mean.scaled_add(1.0 / n, &delta);
        let delta2 = position - &self.mean;
        self.m2 += &(&delta * &delta2);
    }

    pub fn reset(&mut self) {
        self.mean.fill(0.0);
        self.m2.fill(0.0);
        self.count = 0;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Unbiased per-coordinate variance, 1.0 everywhere below two samples.
    pub fn variance(&self) -> Array1<f64> {
        if self.count < 2 {
            return Array1::ones(self.mean.len());
        }
        &self.m2 / (self.count as f64 - 1.0)
    }

    /// Variance shrunk towards 1e-3, used as the inverse mass diagonal.
    pub fn regularized_variance(&self) -> Array1<f64> {
        if self.count < 2 {
            return Array1::ones(self.mean.len());
        }
        let n = self.count as f64;
        self.variance()
            .mapv(|v| (n / (n + 5.0)) * v + 1e-3 * (5.0 / (n + 5.0)))
    }
}
