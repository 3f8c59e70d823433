//! Core resampling modules

pub mod geo;
pub mod index;
pub mod resample;

// Re-export main types
pub use index::{BlockIndex, RowLayout};
pub use resample::{ResampleParams, SwathResampler};
