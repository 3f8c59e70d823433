use ndarray::ArrayD;

/// Value written to every output cell that receives no source contribution.
pub const FILL_VALUE: f64 = -999.0;

/// Mean Earth radius in meters, used to turn a metric search radius into a
/// central angle on the unit sphere.
pub const EARTH_RADIUS_M: f64 = 6_371_009.0;

/// Dynamic-rank grid of doubles (swaths are 1-D tracks or 2-D scan grids).
pub type GeoArray = ArrayD<f64>;

/// Per-cell contributor counts produced by summary resampling.
pub type CountArray = ArrayD<i32>;

/// A geolocated swath: parallel latitude/longitude arrays in degrees.
///
/// The two arrays must share a shape; the shape itself is free (a 1-D point
/// list and a 2-D scanline grid are both valid and can be mixed between the
/// source and target sides of a resampling operation).
#[derive(Debug, Clone)]
pub struct Swath {
    lat: GeoArray,
    lon: GeoArray,
}

impl Swath {
    /// Build a swath from parallel latitude/longitude arrays in degrees.
    pub fn new(lat: GeoArray, lon: GeoArray) -> SwathResult<Self> {
        if lat.shape() != lon.shape() {
            return Err(SwathError::ShapeMismatch(format!(
                "latitude shape {:?} != longitude shape {:?}",
                lat.shape(),
                lon.shape()
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Latitudes in degrees.
    pub fn lat(&self) -> &GeoArray {
        &self.lat
    }

    /// Longitudes in degrees.
    pub fn lon(&self) -> &GeoArray {
        &self.lon
    }

    /// Grid shape shared by both coordinate arrays.
    pub fn shape(&self) -> &[usize] {
        self.lat.shape()
    }

    /// Number of axes of the coordinate arrays.
    pub fn ndim(&self) -> usize {
        self.lat.ndim()
    }

    /// Number of geolocated points in the swath.
    pub fn len(&self) -> usize {
        self.lat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lat.is_empty()
    }
}

/// Error types for swath resampling
#[derive(Debug, thiserror::Error)]
pub enum SwathError {
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("search radius must be positive and finite, got {0}")]
    InvalidRadius(f64),
}

/// Result type for swath operations
pub type SwathResult<T> = Result<T, SwathError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_swath_accepts_matching_shapes() {
        let lat = Array1::from_vec(vec![0.0, 1.0, 2.0]).into_dyn();
        let lon = Array1::from_vec(vec![10.0, 11.0, 12.0]).into_dyn();
        let swath = Swath::new(lat, lon).unwrap();
        assert_eq!(swath.len(), 3);
        assert_eq!(swath.ndim(), 1);
    }

    #[test]
    fn test_swath_rejects_mismatched_shapes() {
        let lat = Array1::from_vec(vec![0.0, 1.0, 2.0]).into_dyn();
        let lon = Array1::from_vec(vec![10.0, 11.0]).into_dyn();
        let err = Swath::new(lat, lon).unwrap_err();
        assert!(matches!(err, SwathError::ShapeMismatch(_)));
    }
}
