use ndarray::arr1;
use rs_nuts::target::Bimodal;
use rs_nuts::{Sampler, SamplerConfig, NUTS};

/// Samples from an equal mixture of two bivariate normals using the library's NUTS implementation.
fn main() -> rs_nuts::Result<()> {
    let config = SamplerConfig {
        n_iters: 11000,
        n_adapts: 1000,
        max_depth: 8,
        ..Default::default()
    };
    let init = arr1(&[1., -1.]);
    let target = Bimodal::new(arr1(&[-2., -2.]), arr1(&[2., 2.]))?;
    let chain = Sampler::new(NUTS::new(target, config, &init)?).run(init)?;
    chain.samples.rows().into_iter().for_each(|v| println!("{v}"));
    Ok(())
}
