// navrs-transect/src/index/errors.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpatialIndexError {
    #[error("Latitude shape {0:?} does not match longitude shape {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),
    #[error("Cannot build a spatial index from an empty grid")]
    EmptyGrid,
    #[error("Neighbour count must be >= 1, but got {0}")]
    InvalidNeighbourCount(usize),
    #[error("A query needs at least one point")]
    EmptyQuery,
}
