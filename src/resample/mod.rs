// navrs-transect/src/resample/mod.rs

mod config;
mod errors;
mod resampler;

pub use config::{ResampleConfig, ResampleConfigBuilder, ResampleMethod};
pub use errors::{ResampleConfigBuilderError, ResampleError};
pub use resampler::{resample, SPHERE_RADIUS};
