// navrs-transect/src/resample/errors.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResampleError {
    #[error("Unknown interpolation method: {0} (expected inverse, bilinear, gaussian or nearest)")]
    InvalidConfiguration(String),
    #[error("Source field shape {0:?} does not match coordinate shape {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),
    #[error(transparent)]
    ThreadPoolBuildError(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Error, Debug)]
pub enum ResampleConfigBuilderError {
    #[error("neighbours must be >= 1, but got {0}")]
    InvalidNeighbours(usize),
    #[error("radius_of_influence must be finite and > 0, but got {0}")]
    InvalidRadius(f64),
    #[error("nprocs must be >= 1, but got {0}")]
    InvalidNprocs(usize),
    #[error("Inverse distance power must be finite and > 0, but got {0}")]
    InvalidPower(f64),
    #[error("Gaussian sigma must be finite and > 0, but got {0}")]
    InvalidSigma(f64),
}
