// navrs-transect/src/grid/mod.rs

mod errors;
mod grid;

pub use errors::GridError;
pub use grid::{DepthSelector, Grid, TransectSection, VelocitySection};
