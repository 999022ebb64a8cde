// navrs-transect/src/index/mod.rs

mod cache;
mod errors;
mod spatial_index;

pub use cache::{SpatialIndexCache, SpatialIndexCacheStats, DEFAULT_CAPACITY};
pub use errors::SpatialIndexError;
pub use spatial_index::{unit_vector, Neighbour, NeighbourQuery, SpatialIndex};
