use serde::{Deserialize, Serialize};

const KAPPA: f64 = 0.75;
const GAMMA: f64 = 0.05;
const T0: f64 = 10.;

/// Dual averaging step size adaptation (Nesterov 2009, Hoffman & Gelman 2014).
///
/// Works on `x = log ε`. The sampler uses `exp(x)` while warming up and the
/// smoothed `exp(x_bar)` afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualAveraging {
    /// Number of updates since the last restart.
    m: usize,
    x: f64,
    x_bar: f64,
    h_bar: f64,
    mu: f64,
    delta: f64,
}

impl DualAveraging {
    pub fn new(delta: f64, initial_step_size: f64) -> Self {
        DualAveraging {
            m: 0,
            x: initial_step_size.ln(),
            x_bar: 0.,
            h_bar: 0.,
            mu: (10. * initial_step_size).ln(),
            delta,
        }
    }

    /// Feed one acceptance statistic.
    ///
    /// With `update_mu` set, averaging restarts around the step size just
    /// produced, which is what happens at the end of each adaptation window.
    pub fn update(&mut self, accept_stat: f64, update_mu: bool) {
        let accept_stat = if accept_stat.is_nan() {
            0.
        } else {
            accept_stat.clamp(0., 1.)
        };
        self.m += 1;
        let m = self.m as f64;
        let eta = 1. / (m + T0);
        self.h_bar = (1. - eta) * self.h_bar + eta * (self.delta - accept_stat);
        self.x = self.mu - (m.sqrt() / GAMMA) * self.h_bar;
        let weight = m.powf(-KAPPA);
        self.x_bar = weight * self.x + (1. - weight) * self.x_bar;
        if update_mu {
            self.restart();
        }
    }

    /// Re-centre the averaging on the current step size.
    pub fn restart(&mut self) {
        self.mu = (10. * self.x.exp()).ln();
        self.m = 0;
        self.h_bar = 0.;
        self.x_bar = 0.;
    }

    /// Step size to use while adapting.
    pub fn step_size(&self) -> f64 {
        self.x.exp()
    }

    /// Smoothed step size to freeze once warm-up ends.
    pub fn final_step_size(&self) -> f64 {
        self.x_bar.exp()
    }

    pub fn n_updates(&self) -> usize {
        self.m
    }
}
