use ndarray::arr1;
use rs_nuts::target::StandardNormal;
use rs_nuts::{Sampler, SamplerConfig, NUTS};

/// Samples from a standard normal using the library's NUTS implementation.
fn main() -> rs_nuts::Result<()> {
    let config = SamplerConfig {
        n_iters: 11000,
        n_adapts: 1000,
        ..Default::default()
    };
    let init = arr1(&[2.]);
    let chain = Sampler::new(NUTS::new(StandardNormal::new(1), config, &init)?).run(init)?;
    chain.samples.iter().for_each(|v| println!("{v}"));
    Ok(())
}
