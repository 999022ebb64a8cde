use pretty_env_logger;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn _setup_pretty_env_logger_default() {
    INIT.call_once(|| {
        pretty_env_logger::init();
    });
}

pub use bathymetry::{bathymetry, BathymetryError};
pub use field::{FieldError, MaskedField, Window};
pub use geodesy::{Point, Vincenty};
pub use grid::{DepthSelector, Grid, GridError, TransectSection, VelocitySection};
pub use index::{SpatialIndex, SpatialIndexCache};
pub use path::{path_to_points, points_between, PathError, Transect};
pub use resample::{ResampleConfig, ResampleConfigBuilder, ResampleMethod};
pub mod bathymetry;
pub mod field;
pub mod gap_fill;
pub mod geodesy;
pub mod grid;
pub mod index;
pub mod path;
pub mod resample;
