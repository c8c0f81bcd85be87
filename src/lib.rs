//! Hamiltonian Monte Carlo and No-U-Turn samplers with Stan-style windowed
//! warm-up of the step size and a diagonal mass matrix.
//!
//! A chain is driven by a [`Sampler`] over any [`HamiltonianKernel`]; the
//! target is supplied as a log-density / gradient oracle through [`Target`].

pub mod adaptation;
pub mod config;
pub mod error;
pub mod hmc;
pub mod integrator;
pub mod kernel;
pub mod mass_matrix;
pub mod momentum;
pub mod nuts;
pub mod sampler;
pub mod step_size;
pub mod target;
pub mod tree_builder;
pub mod window;

pub use config::SamplerConfig;
pub use error::{Error, Result};
pub use hmc::HMC;
pub use kernel::{HamiltonianKernel, TransitionStats};
pub use nuts::NUTS;
pub use sampler::{Chain, Sampler};
pub use target::Target;
