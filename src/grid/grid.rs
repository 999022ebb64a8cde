// navrs-transect/src/grid/grid.rs

use super::errors::GridError;
use crate::field::{FieldError, MaskedField, Window};
use crate::gap_fill::fill_invalid_shift;
use crate::geodesy::Point;
use crate::index::{Neighbour, NeighbourQuery, SpatialIndex, SpatialIndexCache};
use crate::path::{path_to_points, Transect};
use crate::resample::{resample, ResampleConfig};
use libm::atan2;
use log::{debug, info};
use ndarray::{Array1, Array2, Ix1, Ix2, Ix3, IxDyn};
use ndarray_stats::errors::MinMaxError;
use ndarray_stats::QuantileExt;
use std::sync::Arc;

/// Candidate neighbours gathered per path point when sizing a window.
const WINDOW_NEIGHBOURS: usize = 10;

/// Which depth level a point extraction reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthSelector {
    Level(usize),
    /// The deepest valid level of each water column.
    Bottom,
}

/// A resampled section along a transect.
#[derive(Clone, Debug)]
pub struct TransectSection<D: ndarray::Dimension> {
    pub transect: Transect,
    pub values: MaskedField<D>,
}

impl<D: ndarray::Dimension> TransectSection<D> {
    /// 2×n sampled (lat, lon).
    pub fn coordinates(&self) -> Array2<f64> {
        self.transect.coordinates()
    }

    pub fn distances(&self) -> &[f64] {
        &self.transect.distances
    }
}

/// Velocity decomposed relative to the local transect bearing.
#[derive(Clone, Debug)]
pub struct VelocitySection {
    pub transect: Transect,
    pub along: MaskedField<Ix2>,
    pub cross: MaskedField<Ix2>,
}

/// A curvilinear latitude/longitude grid with its spatial index.
pub struct Grid {
    key: String,
    latitudes: Array2<f64>,
    longitudes: Array2<f64>,
    index: Arc<SpatialIndex>,
    config: ResampleConfig,
}

impl Grid {
    /// Builds a grid for the source `key`, reusing the index cached
    /// under that key when there is one.
    pub fn new(
        key: &str,
        latitudes: Array2<f64>,
        longitudes: Array2<f64>,
        cache: &SpatialIndexCache,
    ) -> Result<Self, GridError> {
        let index = cache.get_or_build(key, latitudes.view(), longitudes.view())?;
        Ok(Self {
            key: key.to_string(),
            latitudes,
            longitudes,
            index,
            config: ResampleConfig::default(),
        })
    }

    pub fn with_config(mut self, config: ResampleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn shape(&self) -> (usize, usize) {
        self.latitudes.dim()
    }

    pub fn latitudes(&self) -> &Array2<f64> {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &Array2<f64> {
        &self.longitudes
    }

    pub fn index(&self) -> Arc<SpatialIndex> {
        self.index.clone()
    }

    pub fn config(&self) -> &ResampleConfig {
        &self.config
    }

    /// The `k` cells nearest to `point`.
    pub fn find_nearest(&self, point: &Point, k: usize) -> Result<Vec<Neighbour>, GridError> {
        Ok(self.index.query_one(point, k)?)
    }

    /// The `k` cells nearest to each of `points`.
    pub fn find_index(&self, points: &[Point], k: usize) -> Result<NeighbourQuery, GridError> {
        Ok(self.index.query_many(points, k)?)
    }

    /// Row/column extremes of the `k` nearest cells of every point.
    fn candidate_extent(
        &self,
        points: &[Point],
        k: usize,
    ) -> Result<(usize, usize, usize, usize), GridError> {
        if points.is_empty() {
            return Err(GridError::OutOfRange(format!("no points given for {}", self.key)));
        }
        let query = self.find_index(points, k)?;
        let empty = |_: MinMaxError| GridError::OutOfRange(format!("{} points", points.len()));
        Ok((
            *query.rows.min().map_err(empty)?,
            *query.rows.max().map_err(empty)?,
            *query.cols.min().map_err(empty)?,
            *query.cols.max().map_err(empty)?,
        ))
    }

    /// Smallest window holding the nearest candidates of every point.
    fn candidate_window(&self, points: &[Point]) -> Result<Window, GridError> {
        let (min_row, max_row, min_col, max_col) =
            self.candidate_extent(points, WINDOW_NEIGHBOURS)?;
        let window = Window {
            row_start: min_row,
            row_end: max_row + 1,
            col_start: min_col,
            col_end: max_col + 1,
        };
        debug!("Candidate window for {}: {:?}", self.key, window);
        Ok(window)
    }

    /// Candidate window padded by a quarter of its extent on each side, or
    /// by 2 cells when the extent is under 2, clipped to the grid.
    pub fn bounding_box(&self, points: &[Point], k: usize) -> Result<Window, GridError> {
        let (min_row, max_row, min_col, max_col) = self.candidate_extent(points, k)?;
        let (nrows, ncols) = self.shape();
        let (row_start, row_end) = pad_limits(min_row, max_row, nrows);
        let (col_start, col_end) = pad_limits(min_col, max_col, ncols);
        Ok(Window {
            row_start,
            row_end,
            col_start,
            col_end,
        })
    }

    fn check_field(&self, field: &MaskedField<IxDyn>) -> Result<(), GridError> {
        let spatial = field.spatial_shape()?;
        if spatial != self.shape() {
            return Err(GridError::FieldShapeMismatch(spatial, self.shape()));
        }
        Ok(())
    }

    fn resample_window(
        &self,
        window: &Window,
        layers: &MaskedField<Ix3>,
        targets: &[Point],
    ) -> Result<MaskedField<Ix2>, GridError> {
        Ok(resample(
            window.slice(self.latitudes.view()),
            window.slice(self.longitudes.view()),
            layers,
            targets,
            &self.config,
        )?)
    }

    fn section(
        &self,
        field: &MaskedField<IxDyn>,
        transect: &Transect,
        window: &Window,
        time: usize,
    ) -> Result<MaskedField<Ix2>, GridError> {
        let layers = field.layers(time, window)?;
        let mut values = self.resample_window(window, &layers, &transect.points())?;
        fill_invalid_shift(&mut values);
        Ok(values)
    }

    /// Vertical section of `field` at `time` along the path through
    /// `waypoints`, shaped (position, depth) and gap filled.
    pub fn transect(
        &self,
        field: &MaskedField<IxDyn>,
        waypoints: &[Point],
        time: usize,
        n: usize,
    ) -> Result<TransectSection<Ix2>, GridError> {
        self.check_field(field)?;
        info!(
            "Extracting transect of {} points through {} waypoints from {}",
            n,
            waypoints.len(),
            self.key
        );
        let transect = path_to_points(waypoints, n)?;
        let window = self.candidate_window(&transect.points())?;
        let values = self.section(field, &transect, &window, time)?;
        Ok(TransectSection { transect, values })
    }

    /// Top level (or the only level) of `field` along the path. Not gap filled.
    pub fn surface_transect(
        &self,
        field: &MaskedField<IxDyn>,
        waypoints: &[Point],
        time: usize,
        n: usize,
    ) -> Result<TransectSection<Ix1>, GridError> {
        self.check_field(field)?;
        let transect = path_to_points(waypoints, n)?;
        let points = transect.points();
        let window = self.candidate_window(&points)?;
        let surface = field.level(time, 0, &window)?;
        let values = self.resample_window(&window, &surface, &points)?.column(0);
        Ok(TransectSection { transect, values })
    }

    /// Resamples the x and y velocity components along the path and splits
    /// them into along-path and cross-path components.
    pub fn velocity_transect(
        &self,
        x_field: &MaskedField<IxDyn>,
        y_field: &MaskedField<IxDyn>,
        waypoints: &[Point],
        time: usize,
        n: usize,
    ) -> Result<VelocitySection, GridError> {
        if x_field.shape() != y_field.shape() {
            return Err(GridError::ComponentShapeMismatch(
                x_field.shape().to_vec(),
                y_field.shape().to_vec(),
            ));
        }
        self.check_field(x_field)?;
        let transect = path_to_points(waypoints, n)?;
        let window = self.candidate_window(&transect.points())?;
        let x = self.section(x_field, &transect, &window, time)?;
        let y = self.section(y_field, &transect, &window, time)?;
        let (along, cross) = rotate_to_bearing(&x, &y, &transect.bearings, self.config.fill_value);
        Ok(VelocitySection {
            transect,
            along,
            cross,
        })
    }

    /// Values of `field` at arbitrary points, one depth level (or the
    /// bottom) at `time`.
    pub fn point(
        &self,
        field: &MaskedField<IxDyn>,
        points: &[Point],
        time: usize,
        depth: DepthSelector,
    ) -> Result<MaskedField<Ix1>, GridError> {
        self.check_field(field)?;
        let window = self.bounding_box(points, WINDOW_NEIGHBOURS)?;
        let layer = match depth {
            DepthSelector::Level(level) => field.level(time, level, &window)?,
            DepthSelector::Bottom => field.layers(time, &window)?.bottom(),
        };
        Ok(self.resample_window(&window, &layer, points)?.column(0))
    }

    /// Like [`Grid::point`], also returning the depth each value was read
    /// at. `levels` holds the depth of every level of `field`; for the
    /// bottom the per-column bottom depth is resampled with the values.
    pub fn point_with_depth(
        &self,
        field: &MaskedField<IxDyn>,
        points: &[Point],
        time: usize,
        depth: DepthSelector,
        levels: &[f64],
    ) -> Result<(MaskedField<Ix1>, MaskedField<Ix1>), GridError> {
        self.check_field(field)?;
        let depth_count = field.depth_count()?;
        if levels.len() != depth_count {
            return Err(FieldError::DepthLevelsMismatch(levels.len(), depth_count).into());
        }
        let window = self.bounding_box(points, WINDOW_NEIGHBOURS)?;
        match depth {
            DepthSelector::Level(level) => {
                let layer = field.level(time, level, &window)?;
                let values = self.resample_window(&window, &layer, points)?.column(0);
                let depths = MaskedField::from_values(Array1::from_elem(points.len(), levels[level]));
                Ok((values, depths))
            }
            DepthSelector::Bottom => {
                let layers = field.layers(time, &window)?;
                let values = self
                    .resample_window(&window, &layers.bottom(), points)?
                    .column(0);
                let depths = self
                    .resample_window(&window, &layers.bottom_depths(levels)?, points)?
                    .column(0);
                Ok((values, depths))
            }
        }
    }

    /// Every depth level of `field` at arbitrary points, shaped (point, depth).
    pub fn profile(
        &self,
        field: &MaskedField<IxDyn>,
        points: &[Point],
        time: usize,
    ) -> Result<MaskedField<Ix2>, GridError> {
        self.check_field(field)?;
        let window = self.bounding_box(points, WINDOW_NEIGHBOURS)?;
        let layers = field.layers(time, &window)?;
        self.resample_window(&window, &layers, points)
    }
}

/// Pads a [min, max] index range and returns it as a half-open range
/// clipped to `limit`.
fn pad_limits(min: usize, max: usize, limit: usize) -> (usize, usize) {
    let (mut lo, mut hi) = (min as f64, max as f64);
    let extent = hi - lo;
    if extent < 2.0 {
        lo -= 2.0;
        hi += 2.0;
    }
    let lo = (lo - extent / 4.0).trunc() as i64;
    let hi = (hi + extent / 4.0).trunc() as i64 + 1;
    (
        lo.clamp(0, limit as i64) as usize,
        hi.clamp(0, limit as i64) as usize,
    )
}

/// Rotates (x, y) vectors into the frame of the local bearing.
///
/// Entries where either component is invalid are invalid in both outputs.
fn rotate_to_bearing(
    x: &MaskedField<Ix2>,
    y: &MaskedField<Ix2>,
    bearings: &[f64],
    fill_value: f64,
) -> (MaskedField<Ix2>, MaskedField<Ix2>) {
    let shape = x.values().dim();
    let mut along = MaskedField::masked(shape).with_fill_value(fill_value);
    let mut cross = MaskedField::masked(shape).with_fill_value(fill_value);
    for (i, &b) in bearings.iter().enumerate().take(shape.0) {
        let r = (90.0 - b).to_radians();
        for d in 0..shape.1 {
            if let (Some(u), Some(v)) = (x.get([i, d]), y.get([i, d])) {
                let theta = atan2(v, u) - r;
                let magnitude = u.hypot(v);
                along.set([i, d], Some(magnitude * theta.cos()));
                cross.set([i, d], Some(magnitude * theta.sin()));
            }
        }
    }
    (along, cross)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::_setup_pretty_env_logger_default;
    use ndarray::{Array3, Array4};

    const SPACING: f64 = 0.25;

    fn axes() -> (Vec<f64>, Vec<f64>) {
        let lats = (0..41).map(|i| 40.0 + i as f64 * SPACING).collect();
        let lons = (0..41).map(|j| -60.0 + j as f64 * SPACING).collect();
        (lats, lons)
    }

    fn make_grid(key: &str, cache: &SpatialIndexCache) -> Grid {
        let (lats, lons) = axes();
        let lat = Array2::from_shape_fn((lats.len(), lons.len()), |(i, _)| lats[i]);
        let lon = Array2::from_shape_fn((lats.len(), lons.len()), |(_, j)| lons[j]);
        Grid::new(key, lat, lon, cache).unwrap()
    }

    fn analytic(t: usize, d: usize, lat: f64, lon: f64) -> f64 {
        1000.0 * t as f64 + 100.0 * d as f64 + lat + lon
    }

    fn depth_field() -> MaskedField<IxDyn> {
        let (lats, lons) = axes();
        let values = Array4::from_shape_fn((2, 3, lats.len(), lons.len()), |(t, d, i, j)| {
            analytic(t, d, lats[i], lons[j])
        });
        MaskedField::from_values(values.into_dyn())
    }

    fn tolerance() -> f64 {
        1.5 * SPACING * 2f64.sqrt()
    }

    #[test]
    fn test_transect_follows_smooth_field() {
        _setup_pretty_env_logger_default();
        let cache = SpatialIndexCache::default();
        let grid = make_grid("smooth", &cache);
        let field = depth_field();
        let waypoints = [Point::new(42.0, -58.0), Point::new(48.0, -52.0)];
        let section = grid.transect(&field, &waypoints, 1, 30).unwrap();

        let n = section.transect.len();
        assert_eq!(section.values.shape(), &[n, 3]);
        assert_eq!(section.coordinates().shape(), &[2, n]);
        assert!(section.values.is_fully_valid());
        assert!(section.distances().windows(2).all(|w| w[0] <= w[1]));
        for i in 0..n {
            let (lat, lon) = (section.transect.latitudes[i], section.transect.longitudes[i]);
            for d in 0..3 {
                let got = section.values.get([i, d]).unwrap();
                assert!((got - analytic(1, d, lat, lon)).abs() < tolerance());
            }
        }
    }

    #[test]
    fn test_transect_gap_fills_masked_bottom() {
        let cache = SpatialIndexCache::default();
        let grid = make_grid("bottomless", &cache);
        let (values, mut valid, _) = depth_field().into_parts();
        valid.slice_mut(ndarray::s![.., 2, .., ..]).fill(false);
        let field = MaskedField::new(values, valid).unwrap();
        let waypoints = [Point::new(45.0, -58.0), Point::new(45.0, -52.0)];
        let section = grid.transect(&field, &waypoints, 0, 20).unwrap();
        assert!(section.values.is_fully_valid());
        for i in 0..section.transect.len() {
            assert_eq!(section.values.get([i, 2]), section.values.get([i, 1]));
        }
    }

    #[test]
    fn test_surface_transect_of_three_dimensional_field() {
        let cache = SpatialIndexCache::default();
        let grid = make_grid("surface", &cache);
        let (lats, lons) = axes();
        let values = Array3::from_shape_fn((1, lats.len(), lons.len()), |(_, i, j)| {
            analytic(0, 0, lats[i], lons[j])
        });
        let field = MaskedField::from_values(values.into_dyn());
        let waypoints = [
            Point::new(41.0, -59.0),
            Point::new(44.0, -55.0),
            Point::new(44.0, -51.0),
        ];
        let section = grid.surface_transect(&field, &waypoints, 0, 40).unwrap();
        assert_eq!(section.values.shape(), &[section.transect.len()]);
        for (i, p) in section.transect.points().iter().enumerate() {
            let got = section.values.get(i).unwrap();
            assert!((got - analytic(0, 0, p.latitude, p.longitude)).abs() < tolerance());
        }
    }

    fn uniform_components(u: f64, v: f64) -> (MaskedField<IxDyn>, MaskedField<IxDyn>) {
        let (lats, lons) = axes();
        let shape = (1, 2, lats.len(), lons.len());
        (
            MaskedField::from_values(Array4::from_elem(shape, u).into_dyn()),
            MaskedField::from_values(Array4::from_elem(shape, v).into_dyn()),
        )
    }

    #[test]
    fn test_velocity_transect_eastbound() {
        let cache = SpatialIndexCache::default();
        let grid = make_grid("velocity-east", &cache);
        let (x, y) = uniform_components(1.0, 0.0);
        let waypoints = [Point::new(45.0, -58.0), Point::new(45.0, -52.0)];
        let section = grid.velocity_transect(&x, &y, &waypoints, 0, 20).unwrap();
        assert!(section.transect.bearings.iter().all(|&b| b == 90.0));
        for i in 0..section.transect.len() {
            for d in 0..2 {
                assert!((section.along.get([i, d]).unwrap() - 1.0).abs() < 1e-9);
                assert!(section.cross.get([i, d]).unwrap().abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_velocity_transect_northbound() {
        let cache = SpatialIndexCache::default();
        let grid = make_grid("velocity-north", &cache);
        let (x, y) = uniform_components(1.0, 0.0);
        let waypoints = [Point::new(41.0, -55.0), Point::new(49.0, -55.0)];
        let section = grid.velocity_transect(&x, &y, &waypoints, 0, 20).unwrap();
        for i in 0..section.transect.len() {
            assert!(section.along.get([i, 0]).unwrap().abs() < 1e-9);
            assert!((section.cross.get([i, 0]).unwrap() + 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_velocity_components_must_match() {
        let cache = SpatialIndexCache::default();
        let grid = make_grid("velocity-mismatch", &cache);
        let (x, _) = uniform_components(1.0, 0.0);
        let y = MaskedField::from_values(ndarray::ArrayD::zeros(IxDyn(&[1, 41, 41])));
        let waypoints = [Point::new(41.0, -55.0), Point::new(49.0, -55.0)];
        assert!(matches!(
            grid.velocity_transect(&x, &y, &waypoints, 0, 10),
            Err(GridError::ComponentShapeMismatch(_, _))
        ));
    }

    #[test]
    fn test_point_and_bottom() {
        let cache = SpatialIndexCache::default();
        let grid = make_grid("point", &cache);
        let (values, mut valid, _) = depth_field().into_parts();
        // the water column at (row 20, col 20) is only one level deep
        valid[[0, 1, 20, 20]] = false;
        valid[[0, 2, 20, 20]] = false;
        let field = MaskedField::new(values, valid).unwrap();
        let at_cell = Point::new(45.0, -55.0);

        let level = grid
            .point(&field, &[at_cell], 0, DepthSelector::Level(2))
            .unwrap();
        assert_eq!(level.shape(), &[1]);
        let got = level.get(0).unwrap();
        assert!((got - analytic(0, 2, 45.0, -55.0)).abs() < tolerance());

        let bottom = grid
            .point(&field, &[at_cell], 0, DepthSelector::Bottom)
            .unwrap();
        assert!((bottom.get(0).unwrap() - analytic(0, 0, 45.0, -55.0)).abs() < 1e-6);
    }

    #[test]
    fn test_profile_shape() {
        let cache = SpatialIndexCache::default();
        let grid = make_grid("profile", &cache);
        let points = [Point::new(43.1, -57.2), Point::new(47.6, -53.9)];
        let profile = grid.profile(&depth_field(), &points, 1).unwrap();
        assert_eq!(profile.shape(), &[2, 3]);
        for (i, p) in points.iter().enumerate() {
            for d in 0..3 {
                let got = profile.get([i, d]).unwrap();
                assert!((got - analytic(1, d, p.latitude, p.longitude)).abs() < tolerance());
            }
        }
    }

    #[test]
    fn test_bounding_box_is_padded_and_clipped() {
        let cache = SpatialIndexCache::default();
        let grid = make_grid("bbox", &cache);
        let window = grid.bounding_box(&[Point::new(40.0, -60.0)], 1).unwrap();
        assert_eq!(window.row_start, 0);
        assert_eq!(window.col_start, 0);
        assert_eq!(window.row_end, 3);
        assert_eq!(window.col_end, 3);

        let window = grid
            .bounding_box(&[Point::new(42.0, -58.0), Point::new(46.0, -54.0)], 1)
            .unwrap();
        // rows 8..=24 padded by 4 either side
        assert_eq!(window.row_start, 4);
        assert_eq!(window.row_end, 29);
    }

    #[test]
    fn test_grids_share_cached_index() {
        let cache = SpatialIndexCache::default();
        let first = make_grid("shared.nc", &cache);
        let second = make_grid("shared.nc", &cache);
        assert!(Arc::ptr_eq(&first.index(), &second.index()));
        let nearest = second.find_nearest(&Point::new(45.05, -54.95), 1).unwrap();
        assert_eq!((nearest[0].row, nearest[0].col), (20, 20));
    }

    #[test]
    fn test_field_errors() {
        let cache = SpatialIndexCache::default();
        let grid = make_grid("errors", &cache);
        let waypoints = [Point::new(42.0, -58.0), Point::new(48.0, -52.0)];
        let wrong = MaskedField::from_values(ndarray::ArrayD::zeros(IxDyn(&[1, 3, 5, 5])));
        assert!(matches!(
            grid.transect(&wrong, &waypoints, 0, 10),
            Err(GridError::FieldShapeMismatch(_, _))
        ));
        assert!(matches!(
            grid.transect(&depth_field(), &waypoints, 5, 10),
            Err(GridError::FieldError(_))
        ));
        assert!(matches!(
            grid.transect(&depth_field(), &waypoints[..1], 0, 10),
            Err(GridError::PathError(_))
        ));
    }

    #[test]
    fn test_point_with_depth() {
        let cache = SpatialIndexCache::default();
        let grid = make_grid("point-depth", &cache);
        let levels = [0.5, 10.0, 50.0];
        let (values, mut valid, _) = depth_field().into_parts();
        valid.slice_mut(ndarray::s![.., 2, .., ..]).fill(false);
        let field = MaskedField::new(values, valid).unwrap();
        let points = [Point::new(43.1, -57.2), Point::new(47.6, -53.9)];

        let (values, depths) = grid
            .point_with_depth(&field, &points, 0, DepthSelector::Level(1), &levels)
            .unwrap();
        assert_eq!(values.shape(), &[2]);
        assert_eq!(depths.get(0), Some(10.0));
        assert_eq!(depths.get(1), Some(10.0));

        let (values, depths) = grid
            .point_with_depth(&field, &points, 0, DepthSelector::Bottom, &levels)
            .unwrap();
        for (i, p) in points.iter().enumerate() {
            let got = values.get(i).unwrap();
            assert!((got - analytic(0, 1, p.latitude, p.longitude)).abs() < tolerance());
            assert!((depths.get(i).unwrap() - 10.0).abs() < 1e-9);
        }

        assert!(matches!(
            grid.point_with_depth(&field, &points, 0, DepthSelector::Bottom, &levels[..2]),
            Err(GridError::FieldError(FieldError::DepthLevelsMismatch(2, 3)))
        ));
    }

    #[test]
    fn test_empty_point_set_is_out_of_range() {
        let cache = SpatialIndexCache::default();
        let grid = make_grid("empty", &cache);
        assert!(matches!(
            grid.point(&depth_field(), &[], 0, DepthSelector::Level(0)),
            Err(GridError::OutOfRange(_))
        ));
        assert!(matches!(
            grid.profile(&depth_field(), &[], 0),
            Err(GridError::OutOfRange(_))
        ));
        assert!(matches!(
            grid.bounding_box(&[], 1),
            Err(GridError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_single_row_grid_window() {
        let cache = SpatialIndexCache::default();
        let (_, lons) = axes();
        let lat = Array2::from_elem((1, lons.len()), 45.0);
        let lon = Array2::from_shape_fn((1, lons.len()), |(_, j)| lons[j]);
        let grid = Grid::new("row", lat, lon, &cache).unwrap();
        let values = Array3::from_shape_fn((1, 1, lons.len()), |(_, _, j)| lons[j]);
        let field = MaskedField::from_values(values.into_dyn());
        let waypoints = [Point::new(45.0, -58.0), Point::new(45.0, -52.0)];

        let points = path_to_points(&waypoints, 20).unwrap().points();
        let window = grid.candidate_window(&points).unwrap();
        assert_eq!(window.nrows(), 1);
        assert!(window.ncols() > 1);

        let section = grid.surface_transect(&field, &waypoints, 0, 20).unwrap();
        assert!(section.values.is_fully_valid());
        for (i, p) in section.transect.points().iter().enumerate() {
            assert!((section.values.get(i).unwrap() - p.longitude).abs() < 1.5 * SPACING);
        }
    }
}
