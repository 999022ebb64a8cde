// navrs-transect/src/resample/resampler.rs

use super::config::{ResampleConfig, ResampleMethod};
use super::errors::ResampleError;
use crate::field::MaskedField;
use crate::geodesy::Point;
use crate::index::unit_vector;
use humantime::format_duration;
use log::{debug, trace};
use ndarray::{ArrayView2, Ix2, Ix3};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::time::Instant;

/// Radius in meters of the sphere source and target points are placed on.
pub const SPHERE_RADIUS: f64 = 6_370_997.0;

/// Source sample: position on the sphere and (row, col) in the window.
type Sample = GeomWithData<[f64; 3], (usize, usize)>;

fn to_sphere(latitude: f64, longitude: f64) -> [f64; 3] {
    let [x, y, z] = unit_vector(latitude, longitude);
    [x * SPHERE_RADIUS, y * SPHERE_RADIUS, z * SPHERE_RADIUS]
}

/// Resamples every level of `source` (depth, y, x) onto `targets`.
///
/// The result is (position, depth). A target with no valid source sample
/// within the radius of influence is invalid at that level.
pub fn resample(
    latitudes: ArrayView2<f64>,
    longitudes: ArrayView2<f64>,
    source: &MaskedField<Ix3>,
    targets: &[Point],
    config: &ResampleConfig,
) -> Result<MaskedField<Ix2>, ResampleError> {
    let (depth, rows, cols) = source.values().dim();
    if latitudes.dim() != (rows, cols) || longitudes.dim() != (rows, cols) {
        return Err(ResampleError::ShapeMismatch(
            source.shape().to_vec(),
            latitudes.shape().to_vec(),
        ));
    }
    let now = Instant::now();
    let valid = source.valid();
    let mut samples: Vec<Sample> = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let (lat, lon) = (latitudes[[r, c]], longitudes[[r, c]]);
            let any_valid = (0..depth).any(|d| valid[[d, r, c]]);
            if any_valid && lat.is_finite() && lon.is_finite() {
                samples.push(GeomWithData::new(to_sphere(lat, lon), (r, c)));
            }
        }
    }

    let mut output =
        MaskedField::masked((targets.len(), depth)).with_fill_value(config.fill_value);
    if samples.is_empty() {
        debug!(
            "No valid source samples in a {}x{} window; output fully masked",
            rows, cols
        );
        return Ok(output);
    }
    trace!("Resampling from {} source samples", samples.len());
    let tree = RTree::bulk_load(samples);

    let pool = ThreadPoolBuilder::new().num_threads(config.nprocs).build()?;
    let columns: Vec<Vec<Option<f64>>> = pool.install(|| {
        targets
            .par_iter()
            .map(|target| resample_point(&tree, source, target, depth, config))
            .collect()
    });

    for (i, column) in columns.into_iter().enumerate() {
        for (d, value) in column.into_iter().enumerate() {
            output.set([i, d], value);
        }
    }
    debug!(
        "Resampled {} targets x {} levels in {} ({} masked)",
        targets.len(),
        depth,
        format_duration(now.elapsed()),
        output.count_invalid()
    );
    Ok(output)
}

fn resample_point(
    tree: &RTree<Sample>,
    source: &MaskedField<Ix3>,
    target: &Point,
    depth: usize,
    config: &ResampleConfig,
) -> Vec<Option<f64>> {
    let query = to_sphere(target.latitude, target.longitude);
    let radius = config.radius_of_influence;
    let neighbours: Vec<(&Sample, f64)> = tree
        .nearest_neighbor_iter_with_distance_2(&query)
        .map(|(sample, distance_2)| (sample, distance_2.sqrt()))
        .take_while(|(_, distance)| *distance <= radius)
        .take(config.neighbours)
        .collect();

    (0..depth)
        .map(|d| {
            let mut usable = neighbours
                .iter()
                .filter(|(sample, _)| source.valid()[[d, sample.data.0, sample.data.1]]);
            match config.method {
                ResampleMethod::Nearest => usable
                    .next()
                    .map(|(sample, _)| source.values()[[d, sample.data.0, sample.data.1]]),
                method => {
                    let (mut weighted, mut total) = (0.0, 0.0);
                    for (sample, distance) in usable {
                        let w = method.weight(*distance, radius);
                        weighted += w * source.values()[[d, sample.data.0, sample.data.1]];
                        total += w;
                    }
                    if total > 0.0 {
                        Some(weighted / total)
                    } else {
                        None
                    }
                }
            }
        })
        .collect()
}
