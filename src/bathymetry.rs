//! Depth profile along a path over a rectilinear bathymetry grid.
//!
//! Path samples are snapped to grid rows and columns to pick the
//! covering window. The window's depths are then interpolated
//! piecewise-linearly: along a single axis when the window is one row or
//! one column wide, otherwise over the triangulated cells. Samples that
//! fall outside the window take the depth of the nearest grid point.

use crate::geodesy::Point;
use crate::path::{path_to_points, PathError};
use interpn::multilinear::rectilinear;
use log::debug;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rstar::primitives::GeomWithData;
use rstar::RTree;
use thiserror::Error;

pub const DEFAULT_BATHYMETRY_SAMPLES: usize = 200;

/// Grid index nearest to `value` on an evenly spaced `axis`, clamped.
fn axis_index(axis: &ArrayView1<f64>, value: f64) -> usize {
    let n = axis.len();
    if n < 2 {
        return 0;
    }
    let span = axis[n - 1] - axis[0];
    if span == 0.0 {
        return 0;
    }
    let idx = ((value - axis[0]) * (n - 1) as f64 / span).round();
    idx.clamp(0.0, (n - 1) as f64) as usize
}

/// Wraps `lon` into the 360° span starting at the first axis longitude.
fn wrap_longitude(axis: &ArrayView1<f64>, lon: f64) -> f64 {
    match axis.first() {
        Some(&start) if lon.is_finite() => start + (lon - start).rem_euclid(360.0),
        _ => lon,
    }
}

/// Piecewise-linear interpolation on ascending `xs`, extrapolating past
/// either end with the outermost segment.
fn interp_linear(xs: &[f64], ys: &[f64], locs: &[f64]) -> Result<Vec<f64>, BathymetryError> {
    match xs.len() {
        0 => Err(BathymetryError::EmptyAxis),
        1 => Ok(vec![ys[0]; locs.len()]),
        _ => Ok(rectilinear::interpn_alloc(&[xs], ys, &[locs])?),
    }
}

/// Position of each of `locs` along ascending `xs` in fractional grid
/// indices, so cell `floor(f)` holds the location at offset `f - floor(f)`.
fn fractional_index(xs: &[f64], locs: &[f64]) -> Result<Vec<f64>, BathymetryError> {
    let indices: Vec<f64> = (0..xs.len()).map(|i| i as f64).collect();
    interp_linear(xs, &indices, locs)
}

/// Rectilinear window of the depth grid, axes ascending.
struct DepthWindow {
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    /// (latitude, longitude) indexed.
    depths: Vec<Vec<f64>>,
}

impl DepthWindow {
    fn new(
        lat_axis: &ArrayView1<f64>,
        lon_axis: &ArrayView1<f64>,
        depth: &ArrayView2<f64>,
        mut rows: Vec<usize>,
        mut cols: Vec<usize>,
    ) -> Self {
        rows.sort_unstable();
        rows.dedup();
        cols.sort_unstable();
        cols.dedup();
        rows.sort_by(|&a, &b| lat_axis[a].total_cmp(&lat_axis[b]));
        cols.sort_by(|&a, &b| lon_axis[a].total_cmp(&lon_axis[b]));
        Self {
            latitudes: rows.iter().map(|&r| lat_axis[r]).collect(),
            longitudes: cols.iter().map(|&c| lon_axis[c]).collect(),
            depths: rows
                .iter()
                .map(|&r| cols.iter().map(|&c| depth[[r, c]]).collect())
                .collect(),
        }
    }

    /// Every (latitude, longitude) pair of the window with its depth.
    fn points(&self) -> Vec<GeomWithData<[f64; 2], f64>> {
        let mut points = Vec::with_capacity(self.latitudes.len() * self.longitudes.len());
        for (i, &lat) in self.latitudes.iter().enumerate() {
            for (j, &lon) in self.longitudes.iter().enumerate() {
                points.push(GeomWithData::new([lat, lon], self.depths[i][j]));
            }
        }
        points
    }

    /// Cell and offset for a fractional index along an axis of `len`
    /// points, or `None` off the axis.
    fn cell(fraction: f64, len: usize) -> Option<(usize, f64)> {
        const TOLERANCE: f64 = 1e-9;
        let last = (len - 1) as f64;
        if !(-TOLERANCE..=last + TOLERANCE).contains(&fraction) {
            return None;
        }
        let i = (fraction.floor().max(0.0) as usize).min(len - 2);
        Some((i, fraction - i as f64))
    }

    /// Linear interpolation over the cell triangles, split on the diagonal
    /// from the low corner. `None` outside the window.
    fn interpolate(&self, lat_index: f64, lon_index: f64) -> Option<f64> {
        let (i, ty) = Self::cell(lat_index, self.latitudes.len())?;
        let (j, tx) = Self::cell(lon_index, self.longitudes.len())?;
        let v00 = self.depths[i][j];
        let v10 = self.depths[i][j + 1];
        let v01 = self.depths[i + 1][j];
        let v11 = self.depths[i + 1][j + 1];
        if tx >= ty {
            Some(v00 + tx * (v10 - v00) + ty * (v11 - v10))
        } else {
            Some(v00 + ty * (v01 - v00) + tx * (v11 - v01))
        }
    }
}

/// Samples `depth` (indexed by `lat_axis`, `lon_axis`) along the path
/// through `waypoints`, returning cumulative distances and depths.
pub fn bathymetry(
    lat_axis: ArrayView1<f64>,
    lon_axis: ArrayView1<f64>,
    depth: ArrayView2<f64>,
    waypoints: &[Point],
    n: usize,
) -> Result<(Vec<f64>, Array1<f64>), BathymetryError> {
    if lat_axis.is_empty() || lon_axis.is_empty() {
        return Err(BathymetryError::EmptyAxis);
    }
    if depth.dim() != (lat_axis.len(), lon_axis.len()) {
        return Err(BathymetryError::ShapeMismatch(
            depth.dim(),
            (lat_axis.len(), lon_axis.len()),
        ));
    }
    let transect = path_to_points(waypoints, n)?;
    let longitudes: Vec<f64> = transect
        .longitudes
        .iter()
        .map(|&lon| wrap_longitude(&lon_axis, lon))
        .collect();
    let rows = transect
        .latitudes
        .iter()
        .map(|&lat| axis_index(&lat_axis, lat))
        .collect();
    let cols = longitudes
        .iter()
        .map(|&lon| axis_index(&lon_axis, lon))
        .collect();
    let window = DepthWindow::new(&lat_axis, &lon_axis, &depth, rows, cols);
    debug!(
        "Bathymetry window of {}x{} grid points for {} samples",
        window.latitudes.len(),
        window.longitudes.len(),
        transect.len()
    );

    let latitudes = &transect.latitudes;
    let depths: Vec<f64> = match (window.latitudes.len(), window.longitudes.len()) {
        (1, _) => interp_linear(&window.longitudes, &window.depths[0], &longitudes)?,
        (_, 1) => {
            let column: Vec<f64> = window.depths.iter().map(|row| row[0]).collect();
            interp_linear(&window.latitudes, &column, latitudes)?
        }
        _ => {
            let lat_indices = fractional_index(&window.latitudes, latitudes)?;
            let lon_indices = fractional_index(&window.longitudes, &longitudes)?;
            let tree = RTree::bulk_load(window.points());
            let mut fallbacks = 0;
            let depths = lat_indices
                .iter()
                .zip(lon_indices.iter())
                .enumerate()
                .map(|(k, (&fy, &fx))| {
                    window.interpolate(fy, fx).unwrap_or_else(|| {
                        fallbacks += 1;
                        tree.nearest_neighbor(&[latitudes[k], longitudes[k]])
                            .map_or(f64::NAN, |nearest| nearest.data)
                    })
                })
                .collect();
            if fallbacks > 0 {
                debug!("{} bathymetry samples used the nearest grid point", fallbacks);
            }
            depths
        }
    };
    Ok((transect.distances, Array1::from(depths)))
}

#[derive(Error, Debug)]
pub enum BathymetryError {
    #[error("Depth grid has shape {0:?} but the axes describe {1:?}")]
    ShapeMismatch((usize, usize), (usize, usize)),
    #[error("Latitude and longitude axes must not be empty")]
    EmptyAxis,
    #[error("Interpolation failed: {0}")]
    Interpolation(&'static str),
    #[error(transparent)]
    PathError(#[from] PathError),
}

impl From<&'static str> for BathymetryError {
    fn from(message: &'static str) -> Self {
        BathymetryError::Interpolation(message)
    }
}
