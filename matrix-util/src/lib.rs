/// reading and writing text files, either gzipped or not
pub mod common_io;

/// `IoOps` for `ndarray::Array2`
pub mod ndarray_io;

/// sampling `ndarray::Array2` with a caller-provided generator
pub mod ndarray_util;

pub mod traits;
