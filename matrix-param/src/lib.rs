/// Floored log-gamma, digamma and the Gamma log-density
pub mod special_fn;

pub mod traits;

/// Gamma variational family over an `ndarray::Array2`
pub mod ndarray_gamma;
