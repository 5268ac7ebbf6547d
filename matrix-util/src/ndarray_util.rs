use crate::traits::*;
use ndarray::prelude::*;
use ndarray::Zip;
use num_traits::Float;
use rand::distr::{Open01, StandardUniform};
use rand::Rng;
use rand_distr::{Distribution, Exp1, Gamma, StandardNormal};

impl<T> SampleOps for ndarray::Array2<T>
where
    T: Float,
    StandardUniform: Distribution<T>,
    StandardNormal: Distribution<T>,
    Exp1: Distribution<T>,
    Open01: Distribution<T>,
{
    type Mat = Self;
    type Scalar = T;

    fn runif_with<R: Rng + ?Sized>(dd: usize, nn: usize, rng: &mut R) -> Self::Mat {
        Array2::from_shape_simple_fn((dd, nn), || StandardUniform.sample(rng))
    }

    fn rgamma_with<R: Rng + ?Sized>(
        shape: &Self::Mat,
        rate: &Self::Mat,
        rng: &mut R,
    ) -> anyhow::Result<Self::Mat> {
        if shape.dim() != rate.dim() {
            anyhow::bail!(
                "shape {:?} and rate {:?} dimensions differ",
                shape.dim(),
                rate.dim()
            );
        }

        // row-major order, so the draw sequence is fixed by the generator
        let mut ret = Array2::<T>::zeros(shape.dim());
        let mut failed = None;
        Zip::from(&mut ret)
            .and(shape)
            .and(rate)
            .for_each(|x, &a, &b| {
                if failed.is_some() {
                    return;
                }
                match Gamma::new(a, T::one() / b) {
                    Ok(rgamma) => *x = rgamma.sample(rng),
                    Err(e) => {
                        failed = Some(format!(
                            "Gamma(shape={:?}, rate={:?}): {}",
                            a.to_f64(),
                            b.to_f64(),
                            e
                        ))
                    }
                }
            });

        match failed {
            Some(msg) => Err(anyhow::anyhow!(msg)),
            None => Ok(ret),
        }
    }
}
