use ndarray::arr1;
use rs_nuts::target::StandardNormal;
use rs_nuts::{Sampler, SamplerConfig, HMC};

/// Samples from a standard normal using the library's HMC implementation.
fn main() -> rs_nuts::Result<()> {
    let config = SamplerConfig {
        n_iters: 2000,
        n_adapts: 1000,
        n_leapfrog: 100,
        initial_step_size: Some(0.01),
        adapt_step_size: false,
        ..Default::default()
    };
    let init = arr1(&[0.1]);
    let _chain = Sampler::new(HMC::new(StandardNormal::new(1), config, &init)?).run(init)?;
    Ok(())
}
