// navrs-transect/src/index/spatial_index.rs

use super::errors::SpatialIndexError;
use crate::geodesy::Point;
use humantime::format_duration;
use log::{debug, info};
use ndarray::{Array2, ArrayView2};
use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::time::Instant;

type Cell = GeomWithData<[f64; 3], usize>;

/// Embeds a latitude/longitude pair (degrees) on the unit sphere.
pub fn unit_vector(latitude: f64, longitude: f64) -> [f64; 3] {
    let (slat, clat) = latitude.to_radians().sin_cos();
    let (slon, clon) = longitude.to_radians().sin_cos();
    [clat * clon, clat * slon, slat]
}

/// One nearest-neighbour hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbour {
    /// Chordal distance on the unit sphere.
    pub distance: f64,
    pub row: usize,
    pub col: usize,
}

/// Results of a multi-point query, one row per query point ordered by
/// ascending distance.
#[derive(Clone, Debug)]
pub struct NeighbourQuery {
    pub distances: Array2<f64>,
    pub rows: Array2<usize>,
    pub cols: Array2<usize>,
}

/// Nearest-neighbour index over the cells of a curvilinear grid.
///
/// Cells with non-finite coordinates are left out of the index.
pub struct SpatialIndex {
    tree: RTree<Cell>,
    shape: (usize, usize),
}

impl SpatialIndex {
    pub fn build(
        latitudes: ArrayView2<f64>,
        longitudes: ArrayView2<f64>,
    ) -> Result<Self, SpatialIndexError> {
        if latitudes.shape() != longitudes.shape() {
            return Err(SpatialIndexError::ShapeMismatch(
                latitudes.shape().to_vec(),
                longitudes.shape().to_vec(),
            ));
        }
        let shape = latitudes.dim();
        info!("Building spatial index for a {}x{} grid", shape.0, shape.1);
        let now = Instant::now();
        let cells: Vec<Cell> = latitudes
            .iter()
            .zip(longitudes.iter())
            .enumerate()
            .filter(|(_, (lat, lon))| lat.is_finite() && lon.is_finite())
            .map(|(flat, (&lat, &lon))| GeomWithData::new(unit_vector(lat, lon), flat))
            .collect();
        if cells.is_empty() {
            return Err(SpatialIndexError::EmptyGrid);
        }
        let ncells = cells.len();
        let tree = RTree::bulk_load(cells);
        debug!(
            "Took {} to index {} cells.",
            format_duration(now.elapsed()),
            ncells
        );
        Ok(Self { tree, shape })
    }

    /// Grid shape used to unravel flat cell indices.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of indexed cells.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    fn unravel(&self, flat: usize) -> (usize, usize) {
        (flat / self.shape.1, flat % self.shape.1)
    }

    /// The `k` cells nearest to `point`, closest first.
    pub fn query_one(&self, point: &Point, k: usize) -> Result<Vec<Neighbour>, SpatialIndexError> {
        if k == 0 {
            return Err(SpatialIndexError::InvalidNeighbourCount(k));
        }
        let query = unit_vector(point.latitude, point.longitude);
        Ok(self
            .tree
            .nearest_neighbor_iter_with_distance_2(&query)
            .take(k)
            .map(|(cell, distance_2)| {
                let (row, col) = self.unravel(cell.data);
                Neighbour {
                    distance: distance_2.sqrt(),
                    row,
                    col,
                }
            })
            .collect())
    }

    /// The `k` nearest cells for each of `points`.
    ///
    /// When the index holds fewer than `k` cells every row is truncated to
    /// the index size.
    pub fn query_many(
        &self,
        points: &[Point],
        k: usize,
    ) -> Result<NeighbourQuery, SpatialIndexError> {
        if points.is_empty() {
            return Err(SpatialIndexError::EmptyQuery);
        }
        let width = k.min(self.len());
        let mut result = NeighbourQuery {
            distances: Array2::zeros((points.len(), width)),
            rows: Array2::zeros((points.len(), width)),
            cols: Array2::zeros((points.len(), width)),
        };
        for (i, point) in points.iter().enumerate() {
            for (j, hit) in self.query_one(point, k)?.into_iter().enumerate() {
                result.distances[[i, j]] = hit.distance;
                result.rows[[i, j]] = hit.row;
                result.cols[[i, j]] = hit.col;
            }
        }
        Ok(result)
    }
}
