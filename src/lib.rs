//! swath-resample: nearest-neighbor resampling between geolocated swaths
//!
//! This library maps values between arbitrarily shaped satellite swaths by
//! great-circle nearest-neighbor search within a radius, using a
//! latitude-band block index so the search stays local. It provides a pull
//! operation (each target cell takes its nearest source value), a push
//! operation (each source point deposits on its nearest target cell, which
//! reports mean, standard deviation and contributor count), and fill-mask
//! propagation between companion planes.

pub mod core;
pub mod types;

// Re-export main types and functions for easier access
pub use crate::core::{BlockIndex, ResampleParams, SwathResampler};
pub use types::{
    CountArray, GeoArray, Swath, SwathError, SwathResult, EARTH_RADIUS_M, FILL_VALUE,
};
