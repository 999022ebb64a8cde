use crate::geodesy::{bearing, is_close, normalize_longitude, Point, Vincenty};
use log::{debug, trace};
use ndarray::{Array, Array1};
use thiserror::Error;

/// Evenly spaced samples along a multi-segment geodesic path.
#[derive(Clone, Debug, Default)]
pub struct Transect {
    /// Cumulative distance from the first waypoint, in meters.
    pub distances: Vec<f64>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    /// Bearing of the segment each sample belongs to, in degrees.
    pub bearings: Vec<f64>,
}

impl Transect {
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn points(&self) -> Vec<Point> {
        self.latitudes
            .iter()
            .zip(self.longitudes.iter())
            .map(|(&lat, &lon)| Point::new(lat, lon))
            .collect()
    }

    /// Sampled coordinates as a 2×n array: latitudes in row 0, longitudes in row 1.
    pub fn coordinates(&self) -> ndarray::Array2<f64> {
        let n = self.len();
        let mut coords = ndarray::Array2::zeros((2, n));
        for i in 0..n {
            coords[[0, i]] = self.latitudes[i];
            coords[[1, i]] = self.longitudes[i];
        }
        coords
    }

    pub fn total_distance(&self) -> f64 {
        self.distances.last().copied().unwrap_or(0.0)
    }
}

/// Brings longitudes pushed past ±180 by unwrapping back into range.
fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 || lon < -180.0 {
        normalize_longitude(lon)
    } else {
        lon
    }
}

/// Samples on one segment, as produced by [`points_between`].
#[derive(Clone, Debug)]
pub struct SegmentSamples {
    pub distances: Array1<f64>,
    pub latitudes: Array1<f64>,
    pub longitudes: Array1<f64>,
    pub bearing: f64,
}

/// Generates `n` points from `start` to `end`.
///
/// Segments along a parallel or a meridian are interpolated linearly in
/// the varying coordinate; every other segment follows the geodesic.
pub fn points_between(start: &Point, end: &Point, n: usize) -> Result<SegmentSamples, PathError> {
    if n < 2 {
        return Err(PathError::TooFewSamples(n));
    }
    let vincenty = Vincenty::default();
    let (lat0, lon0) = (start.latitude, start.longitude);
    let (lat1, lon1) = (end.latitude, end.longitude);
    // shortest way round, so segments across the antimeridian stay short
    let dlon = normalize_longitude(lon1 - lon0);

    if is_close(lat0, lat1) {
        trace!("Constant latitude segment {} -> {}", start, end);
        let latitudes = Array1::from_elem(n, lat0);
        let longitudes = Array::linspace(lon0, lon0 + dlon, n).mapv(wrap_longitude);
        let distances = longitudes
            .iter()
            .map(|&lon| vincenty.distance(start, &Point::new(lat0, lon)))
            .collect();
        let bearing = if dlon > 0.0 { 90.0 } else { -90.0 };
        Ok(SegmentSamples {
            distances,
            latitudes,
            longitudes,
            bearing,
        })
    } else if is_close(lon0, lon0 + dlon) {
        trace!("Constant longitude segment {} -> {}", start, end);
        let latitudes = Array::linspace(lat0, lat1, n);
        let longitudes = Array1::from_elem(n, lon0);
        let distances = latitudes
            .iter()
            .map(|&lat| vincenty.distance(start, &Point::new(lat, lon0)))
            .collect();
        let bearing = if lat1 > lat0 { 0.0 } else { 180.0 };
        Ok(SegmentSamples {
            distances,
            latitudes,
            longitudes,
            bearing,
        })
    } else {
        let inverse = vincenty.inverse(start, end);
        let distances = Array::linspace(0.0, inverse.distance, n);
        let mut latitudes = Array1::zeros(n);
        let mut longitudes = Array1::zeros(n);
        for (i, &d) in distances.iter().enumerate() {
            let p = vincenty.destination(start, inverse.azimuth, d);
            latitudes[i] = p.latitude;
            longitudes[i] = p.longitude;
        }
        Ok(SegmentSamples {
            distances,
            latitudes,
            longitudes,
            bearing: bearing(lat0, lon0, lat1, lon1),
        })
    }
}

/// Samples roughly `n` points along the path through `waypoints`.
///
/// Each segment receives `ceil(n * length / total)` samples (at least 2).
/// Distances are cumulative across segments.
pub fn path_to_points(waypoints: &[Point], n: usize) -> Result<Transect, PathError> {
    if waypoints.len() < 2 {
        return Err(PathError::TooFewWaypoints(waypoints.len()));
    }
    let vincenty = Vincenty::default();
    let segment_lengths: Vec<f64> = waypoints
        .windows(2)
        .map(|pair| vincenty.distance(&pair[0], &pair[1]))
        .collect();
    let total_distance: f64 = segment_lengths.iter().sum();
    debug!(
        "Sampling {} points along {} segments ({:.1} m)",
        n,
        segment_lengths.len(),
        total_distance
    );

    let mut transect = Transect::default();
    for (pair, &length) in waypoints.windows(2).zip(segment_lengths.iter()) {
        let npts = if total_distance > 0.0 {
            (n as f64 * (length / total_distance)).ceil() as usize
        } else {
            2
        };
        let segment = points_between(&pair[0], &pair[1], npts.max(2))?;
        let offset = transect.total_distance();
        transect
            .distances
            .extend(segment.distances.iter().map(|d| d + offset));
        transect.latitudes.extend(segment.latitudes.iter());
        transect.longitudes.extend(segment.longitudes.iter());
        transect
            .bearings
            .extend(std::iter::repeat(segment.bearing).take(segment.distances.len()));
    }
    Ok(transect)
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("A path needs at least 2 waypoints, but got {0}")]
    TooFewWaypoints(usize),
    #[error("A segment needs at least 2 samples, but got {0}")]
    TooFewSamples(usize),
}
