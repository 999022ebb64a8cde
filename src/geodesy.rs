use libm::{atan, atan2};
use log::warn;
use std::fmt;

/// WGS-84 semi-major axis in meters.
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// Mean earth radius used for spherical fallbacks.
pub const MEAN_EARTH_RADIUS: f64 = 6_371_008.8;

const VINCENTY_MAX_ITERATIONS: usize = 200;
const VINCENTY_TOLERANCE: f64 = 1e-12;

/// A geographic position in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<(f64, f64)> for Point {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Same tolerance rule as numpy's `isclose` with default arguments.
pub fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-8 + 1e-5 * b.abs()
}

/// Wraps a longitude into (-180, 180].
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// Initial bearing from one point to another on a sphere, in degrees within (-180, 180].
pub fn bearing(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> f64 {
    let lat0_rad = lat0.to_radians();
    let lat1_rad = lat1.to_radians();
    let diff_rad = (lon1 - lon0).to_radians();

    let x = lat1_rad.cos() * diff_rad.sin();
    let y = lat0_rad.cos() * lat1_rad.sin() - lat0_rad.sin() * lat1_rad.cos() * diff_rad.cos();
    let b = atan2(x, y).to_degrees();
    if b == -180.0 {
        180.0
    } else {
        b
    }
}

/// Great-circle distance in meters on a sphere of the given radius.
pub fn spherical_distance(start: &Point, end: &Point, radius: f64) -> f64 {
    let lat0 = start.latitude.to_radians();
    let lat1 = end.latitude.to_radians();
    let dlat = lat1 - lat0;
    let dlon = (end.longitude - start.longitude).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat0.cos() * lat1.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * radius * h.sqrt().min(1.0).asin()
}

/// Result of the inverse geodesic problem.
#[derive(Clone, Copy, Debug)]
pub struct Inverse {
    /// Distance in meters.
    pub distance: f64,
    /// Forward azimuth at the start point, degrees clockwise from north.
    pub azimuth: f64,
}

/// Vincenty's formulae on the WGS-84 ellipsoid.
#[derive(Clone, Copy, Debug)]
pub struct Vincenty {
    a: f64,
    f: f64,
}

impl Default for Vincenty {
    fn default() -> Self {
        Self {
            a: WGS84_A,
            f: WGS84_F,
        }
    }
}

impl Vincenty {
    fn b(&self) -> f64 {
        (1.0 - self.f) * self.a
    }

    fn reduced_latitude(&self, lat: f64) -> f64 {
        atan((1.0 - self.f) * lat.to_radians().tan())
    }

    fn series_a_b(&self, cos_sq_alpha: f64) -> (f64, f64) {
        let b = self.b();
        let u_sq = cos_sq_alpha * (self.a * self.a - b * b) / (b * b);
        let big_a =
            1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
        let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
        (big_a, big_b)
    }

    fn delta_sigma(big_b: f64, sin_sigma: f64, cos_sigma: f64, cos_2sm: f64) -> f64 {
        big_b
            * sin_sigma
            * (cos_2sm
                + big_b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_2sm * cos_2sm)
                        - big_b / 6.0
                            * cos_2sm
                            * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                            * (-3.0 + 4.0 * cos_2sm * cos_2sm)))
    }

    /// Solves the inverse problem. Falls back to a spherical solution when the
    /// iteration does not converge (nearly antipodal points).
    pub fn inverse(&self, start: &Point, end: &Point) -> Inverse {
        let f = self.f;
        let l = (end.longitude - start.longitude).to_radians();
        let u1 = self.reduced_latitude(start.latitude);
        let u2 = self.reduced_latitude(end.latitude);
        let (sin_u1, cos_u1) = u1.sin_cos();
        let (sin_u2, cos_u2) = u2.sin_cos();

        let mut lambda = l;
        for _ in 0..VINCENTY_MAX_ITERATIONS {
            let (sin_lambda, cos_lambda) = lambda.sin_cos();
            let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
                + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
            .sqrt();
            if sin_sigma == 0.0 {
                return Inverse {
                    distance: 0.0,
                    azimuth: 0.0,
                };
            }
            let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
            let sigma = atan2(sin_sigma, cos_sigma);
            let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
            let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
            let cos_2sm = if cos_sq_alpha != 0.0 {
                cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
            } else {
                0.0
            };
            let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
            let previous = lambda;
            lambda = l
                + (1.0 - c)
                    * f
                    * sin_alpha
                    * (sigma
                        + c * sin_sigma
                            * (cos_2sm + c * cos_sigma * (-1.0 + 2.0 * cos_2sm * cos_2sm)));
            if (lambda - previous).abs() < VINCENTY_TOLERANCE {
                let (big_a, big_b) = self.series_a_b(cos_sq_alpha);
                let d_sigma = Self::delta_sigma(big_b, sin_sigma, cos_sigma, cos_2sm);
                let (sin_lambda, cos_lambda) = lambda.sin_cos();
                let azimuth = atan2(
                    cos_u2 * sin_lambda,
                    cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda,
                )
                .to_degrees();
                return Inverse {
                    distance: self.b() * big_a * (sigma - d_sigma),
                    azimuth,
                };
            }
        }
        warn!(
            "Vincenty inverse did not converge between {} and {}, using spherical distance",
            start, end
        );
        Inverse {
            distance: spherical_distance(start, end, MEAN_EARTH_RADIUS),
            azimuth: bearing(
                start.latitude,
                start.longitude,
                end.latitude,
                end.longitude,
            ),
        }
    }

    pub fn distance(&self, start: &Point, end: &Point) -> f64 {
        self.inverse(start, end).distance
    }

    /// Point reached by travelling `distance` meters from `start` along the
    /// geodesic leaving at `azimuth` degrees.
    pub fn destination(&self, start: &Point, azimuth: f64, distance: f64) -> Point {
        let f = self.f;
        let alpha1 = azimuth.to_radians();
        let (sin_alpha1, cos_alpha1) = alpha1.sin_cos();
        let u1 = self.reduced_latitude(start.latitude);
        let (sin_u1, cos_u1) = u1.sin_cos();
        let sigma1 = atan2(u1.tan(), cos_alpha1);
        let sin_alpha = cos_u1 * sin_alpha1;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        let (big_a, big_b) = self.series_a_b(cos_sq_alpha);

        let first = distance / (self.b() * big_a);
        let mut sigma = first;
        let mut cos_2sm = (2.0 * sigma1 + sigma).cos();
        for _ in 0..VINCENTY_MAX_ITERATIONS {
            cos_2sm = (2.0 * sigma1 + sigma).cos();
            let (sin_sigma, cos_sigma) = sigma.sin_cos();
            let previous = sigma;
            sigma = first + Self::delta_sigma(big_b, sin_sigma, cos_sigma, cos_2sm);
            if (sigma - previous).abs() < VINCENTY_TOLERANCE {
                break;
            }
        }

        let (sin_sigma, cos_sigma) = sigma.sin_cos();
        let x = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
        let lat2 = atan2(
            sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1,
            (1.0 - f) * (sin_alpha * sin_alpha + x * x).sqrt(),
        );
        let lambda = atan2(
            sin_sigma * sin_alpha1,
            cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1,
        );
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let l = lambda
            - (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma * (cos_2sm + c * cos_sigma * (-1.0 + 2.0 * cos_2sm * cos_2sm)));

        Point::new(
            lat2.to_degrees(),
            normalize_longitude(start.longitude + l.to_degrees()),
        )
    }
}
