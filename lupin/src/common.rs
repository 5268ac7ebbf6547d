pub use log::{debug, info, warn};

pub use matrix_param::special_fn::MIN_POSITIVE;
pub use matrix_param::traits::{Inference, ScoreFunctionParam, TwoStatParam};

pub use ndarray::prelude::*;

pub type Mat = ndarray::Array2<f64>;
pub type DVec = ndarray::Array1<f64>;

/// stop after this many consecutive decreases of the held-out likelihood
pub const MAX_CONSECUTIVE_DECREASES: usize = 3;

/// fraction of the documents held out for the validation likelihood
pub const VALIDATION_FRACTION: f64 = 0.05;

/// clipping floor for the entity shape and rate
pub const ENTITY_PARAM_FLOOR: f64 = 1e-3;

/// clipping floor for the event shape and rate
pub const EVENT_PARAM_FLOOR: f64 = 1e-5;

/// Checkpoint tag: zero-padded iteration number
pub fn iteration_tag(iteration: usize) -> String {
    format!("{:04}", iteration)
}

pub const FINAL_TAG: &str = "final";
