//! Latitude-band spatial index for nearest-neighbor search over geolocated
//! points.
//!
//! The sphere is cut into latitude bands one block-arc tall; each interior
//! band is split into longitude blocks roughly one block-arc wide at the
//! band's poleward edge, and the first and last bands are single blocks
//! covering the full longitude range (polar caps). A query only has to look
//! at the 3x3 neighborhood of blocks around its own, with longitude columns
//! wrapping at the antimeridian.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::core::geo::{arc_between, deg_to_rad};
use crate::types::{SwathError, SwathResult, EARTH_RADIUS_M};

/// Block layout of one latitude band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowLayout {
    /// Longitude extent of each block in the band, radians.
    pub block_size: f64,
    /// Number of longitude blocks in the band.
    pub n_blocks: i32,
}

/// Spatial index over a set of geolocated points.
///
/// Coordinates are taken in degrees and held in radians internally. Blocks
/// holding no points are never materialized, so the index stays small even
/// for sub-kilometer radii where the full layout would have hundreds of
/// millions of blocks.
#[derive(Debug)]
pub struct BlockIndex {
    n_rows: i32,
    /// Latitude extent of each band, radians.
    lat_band: f64,
    /// Block sizing arc: the search radius, floored at 1 km of arc.
    block_arc: f64,
    /// Acceptance radius as a central angle, radians (no floor applied).
    max_arc: f64,
    lat_rad: Vec<f64>,
    lon_rad: Vec<f64>,
    buckets: HashMap<(i32, i32), Vec<u32>>,
}

impl BlockIndex {
    /// Build an index over parallel lat/lon arrays (degrees) for searches
    /// within `radius_m` meters of arc.
    ///
    /// Points whose band or block falls outside the layout (for example a
    /// latitude of exactly +90 degrees) are silently left out of the index,
    /// matching the behavior of the windowed scan they would never satisfy.
    pub fn build(lat_deg: &[f64], lon_deg: &[f64], radius_m: f64) -> SwathResult<Self> {
        if !(radius_m.is_finite() && radius_m > 0.0) {
            return Err(SwathError::InvalidRadius(radius_m));
        }
        debug_assert_eq!(lat_deg.len(), lon_deg.len());

        let max_arc = radius_m / EARTH_RADIUS_M;
        // Below 1 km the blocks would get so small that the bookkeeping
        // dominates; the acceptance radius is unaffected by this floor.
        let block_arc = if radius_m < 1000.0 {
            1000.0 / EARTH_RADIUS_M
        } else {
            max_arc
        };
        let n_rows = ((PI / block_arc) as i32).max(1);
        let lat_band = PI / n_rows as f64;

        let lat_rad: Vec<f64> = lat_deg.iter().map(|&d| deg_to_rad(d)).collect();
        let lon_rad: Vec<f64> = lon_deg.iter().map(|&d| deg_to_rad(d)).collect();

        let mut index = Self {
            n_rows,
            lat_band,
            block_arc,
            max_arc,
            lat_rad,
            lon_rad,
            buckets: HashMap::new(),
        };

        for i in 0..index.lat_rad.len() {
            let row = ((index.lat_rad[i] + PI / 2.0) / index.lat_band) as i32;
            if row < 0 || row >= index.n_rows {
                continue;
            }
            let layout = index.row_layout(row);
            let col = ((index.lon_rad[i] + PI) / layout.block_size) as i32;
            if col < 0 || col >= layout.n_blocks {
                continue;
            }
            index.buckets.entry((row, col)).or_default().push(i as u32);
        }

        log::debug!(
            "block index: {} points in {} buckets over {} latitude bands",
            index.lat_rad.len(),
            index.buckets.len(),
            index.n_rows
        );

        Ok(index)
    }

    /// Number of indexed points (points dropped at the layout edge excluded).
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Block layout of latitude band `row`.
    pub fn row_layout(&self, row: i32) -> RowLayout {
        if row == 0 || row == self.n_rows - 1 {
            return RowLayout {
                block_size: 2.0 * PI,
                n_blocks: 1,
            };
        }
        // Longitude blocks are sized by the circumference at the poleward
        // edge of the band, so every block is at least one block-arc wide.
        let highest_lat = if row < (self.n_rows + 1) / 2 {
            -PI / 2.0 + self.lat_band * row as f64
        } else {
            -PI / 2.0 + self.lat_band * (row + 1) as f64
        };
        let mut n_blocks = (2.0 * PI * highest_lat.cos() / self.block_arc) as i32;
        if n_blocks < 4 {
            n_blocks = 1;
        }
        RowLayout {
            block_size: 2.0 * PI / n_blocks as f64,
            n_blocks,
        }
    }

    /// Nearest indexed point within the search radius of a query position
    /// (degrees). Returns the point's original id and its separation in
    /// meters of arc, or `None` when no indexed point qualifies.
    pub fn nearest(&self, lat_deg: f64, lon_deg: f64) -> Option<(usize, f64)> {
        let t_lat = deg_to_rad(lat_deg);
        let t_lon = deg_to_rad(lon_deg);

        let row = ((t_lat + PI / 2.0) / self.lat_band) as i32;
        let mut best_arc = -1.0_f64;
        let mut best_id: i64 = -1;

        for j in (row - 1)..=(row + 1) {
            if j < 0 || j >= self.n_rows {
                continue;
            }
            let layout = self.row_layout(j);
            let col = ((t_lon + PI) / layout.block_size) as i32;

            if layout.n_blocks == 1 {
                self.scan_bucket(j, 0, t_lat, t_lon, &mut best_arc, &mut best_id);
            } else {
                for k in (col - 1)..=(col + 1) {
                    let mut kk = k;
                    if kk < 0 {
                        kk = layout.n_blocks - 1;
                    }
                    if kk >= layout.n_blocks {
                        kk = 0;
                    }
                    self.scan_bucket(j, kk, t_lat, t_lon, &mut best_arc, &mut best_id);
                }
            }
        }

        if best_arc < 0.0 {
            None
        } else {
            Some((best_id as usize, best_arc * EARTH_RADIUS_M))
        }
    }

    fn scan_bucket(
        &self,
        row: i32,
        col: i32,
        t_lat: f64,
        t_lon: f64,
        best_arc: &mut f64,
        best_id: &mut i64,
    ) {
        let Some(ids) = self.buckets.get(&(row, col)) else {
            return;
        };
        for &id in ids {
            let arc = arc_between(
                t_lat,
                t_lon,
                self.lat_rad[id as usize],
                self.lon_rad[id as usize],
            );
            // NaN separations fail both comparisons and are skipped; a tie
            // keeps the earlier point, matching the scan order.
            if (*best_arc < 0.0 || *best_arc > arc) && arc <= self.max_arc {
                *best_arc = arc;
                *best_id = id as i64;
            }
        }
    }
}
