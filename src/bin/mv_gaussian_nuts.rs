use ndarray::arr1;
use rs_nuts::target::DiagonalNormal;
use rs_nuts::{Sampler, SamplerConfig, NUTS};

/// Samples from a bivariate normal with unequal scales using the library's NUTS implementation.
fn main() -> rs_nuts::Result<()> {
    let config = SamplerConfig {
        n_iters: 2000,
        n_adapts: 1000,
        ..Default::default()
    };
    let init = arr1(&[2., 5.]);
    let target = DiagonalNormal::new(arr1(&[0., 1.]), arr1(&[1., 10.]))?;
    let chain = Sampler::new(NUTS::new(target, config, &init)?).run(init)?;
    eprintln!(
        "step size {:.4}, inverse mass {}, divergent {}",
        chain.step_size,
        chain.inverse_mass,
        chain.n_divergent()
    );
    chain.samples.rows().into_iter().for_each(|v| println!("{v}"));
    Ok(())
}
