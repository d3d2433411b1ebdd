//! Error types for halogrid-core.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("no valid partition of a {width}x{height} raster across {procs} nodes")]
    NoValidPartition {
        width: usize,
        height: usize,
        procs: usize,
    },

    #[error("kernel weights sum to zero, cannot normalize")]
    ZeroKernelSum,
}

pub type Result<T> = std::result::Result<T, Error>;
