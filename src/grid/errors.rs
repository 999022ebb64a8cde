// navrs-transect/src/grid/errors.rs

use crate::field::FieldError;
use crate::index::SpatialIndexError;
use crate::path::PathError;
use crate::resample::ResampleError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("No grid cells found near the requested points: {0}")]
    OutOfRange(String),
    #[error("Field horizontal shape {0:?} does not match grid shape {1:?}")]
    FieldShapeMismatch((usize, usize), (usize, usize)),
    #[error("Velocity components have different shapes: {0:?} and {1:?}")]
    ComponentShapeMismatch(Vec<usize>, Vec<usize>),
    #[error(transparent)]
    FieldError(#[from] FieldError),
    #[error(transparent)]
    PathError(#[from] PathError),
    #[error(transparent)]
    SpatialIndexError(#[from] SpatialIndexError),
    #[error(transparent)]
    ResampleError(#[from] ResampleError),
}
