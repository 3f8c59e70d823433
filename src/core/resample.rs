//! Swath-to-swath resampling operations.
//!
//! Two directions are provided. `resample_nearest` pulls: every target cell
//! takes the value of its nearest source point within the search radius.
//! `resample_summary` pushes: every source point deposits its value on its
//! nearest target cell, and each cell reports the mean, standard deviation
//! and count of what landed on it. Cells left empty in either direction get
//! the fill value.

use ndarray::ArrayD;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::index::BlockIndex;
use crate::types::{CountArray, GeoArray, Swath, SwathError, SwathResult, FILL_VALUE};

/// Resampling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResampleParams {
    /// Search radius in meters of arc on the mean-radius sphere.
    pub radius_m: f64,
    /// Value marking target cells with no qualifying source point.
    pub fill_value: f64,
}

impl ResampleParams {
    pub fn new(radius_m: f64) -> Self {
        Self {
            radius_m,
            fill_value: FILL_VALUE,
        }
    }
}

/// Nearest-neighbor swath resampler.
pub struct SwathResampler {
    params: ResampleParams,
}

impl SwathResampler {
    pub fn new(params: ResampleParams) -> Self {
        Self { params }
    }

    /// Resampler with the given search radius and the standard fill value.
    pub fn with_radius(radius_m: f64) -> Self {
        Self::new(ResampleParams::new(radius_m))
    }

    pub fn params(&self) -> &ResampleParams {
        &self.params
    }

    /// Map each target cell to the value of its nearest source point within
    /// the search radius; cells with no source point in range get the fill
    /// value. Source and target grids may have any rank, independently.
    pub fn resample_nearest(
        &self,
        source: &Swath,
        data: &GeoArray,
        target: &Swath,
    ) -> SwathResult<GeoArray> {
        check_same_shape("source data vs source swath", data.shape(), source.shape())?;

        log::info!(
            "nearest resample: {} source points -> {} target cells, radius {} m",
            source.len(),
            target.len(),
            self.params.radius_m
        );

        let src_lat = flat(source.lat());
        let src_lon = flat(source.lon());
        let index = BlockIndex::build(&src_lat, &src_lon, self.params.radius_m)?;

        let tar_lat = flat(target.lat());
        let tar_lon = flat(target.lon());
        let nearest: Vec<Option<(usize, f64)>> = (0..tar_lat.len())
            .into_par_iter()
            .map(|i| index.nearest(tar_lat[i], tar_lon[i]))
            .collect();

        let data_flat = flat(data);
        let fill = self.params.fill_value;
        let values: Vec<f64> = nearest
            .iter()
            .map(|nn| match nn {
                Some((id, _)) => data_flat[*id],
                None => fill,
            })
            .collect();

        let matched = nearest.iter().filter(|nn| nn.is_some()).count();
        log::debug!("nearest resample: {}/{} cells matched", matched, tar_lat.len());

        ArrayD::from_shape_vec(target.shape().to_vec(), values)
            .map_err(|e| SwathError::ShapeMismatch(e.to_string()))
    }

    /// Aggregate source values onto the target grid: each source point finds
    /// its nearest target cell within the search radius and deposits its
    /// value there. Every cell of `out` receives the mean of its deposits,
    /// `sd` (when given) their standard deviation, and `counts` how many
    /// there were; cells with no deposits get fill / fill / 0. All three
    /// planes are rewritten in full.
    ///
    /// Zero and negative source values are treated as no-data and never
    /// deposit. Candidates are drawn only from rank-1 source geolocation; a
    /// gridded source swath yields a fully filled target.
    pub fn resample_summary(
        &self,
        source: &Swath,
        data: &GeoArray,
        target: &Swath,
        out: &mut GeoArray,
        sd: Option<&mut GeoArray>,
        counts: &mut CountArray,
    ) -> SwathResult<()> {
        if !(self.params.radius_m.is_finite() && self.params.radius_m > 0.0) {
            return Err(SwathError::InvalidRadius(self.params.radius_m));
        }
        check_same_shape("source data vs source swath", data.shape(), source.shape())?;
        check_same_shape("output vs target swath", out.shape(), target.shape())?;
        check_same_shape("counts vs target swath", counts.shape(), target.shape())?;
        if let Some(ref sd) = sd {
            check_same_shape("sd vs target swath", sd.shape(), target.shape())?;
        }

        log::info!(
            "summary resample: {} source points -> {} target cells, radius {} m",
            source.len(),
            target.len(),
            self.params.radius_m
        );

        let n_tar = target.len();
        let mut sums = vec![0.0_f64; n_tar];
        let mut sq_sums = vec![0.0_f64; n_tar];
        let mut cell_counts = vec![0_i32; n_tar];

        if source.ndim() == 1 {
            let tar_lat = flat(target.lat());
            let tar_lon = flat(target.lon());
            let index = BlockIndex::build(&tar_lat, &tar_lon, self.params.radius_m)?;

            let src_lat = flat(source.lat());
            let src_lon = flat(source.lon());
            let nearest_cell: Vec<Option<(usize, f64)>> = (0..src_lat.len())
                .into_par_iter()
                .map(|i| index.nearest(src_lat[i], src_lon[i]))
                .collect();

            let data_flat = flat(data);
            for (i, nn) in nearest_cell.iter().enumerate() {
                let Some((cell, _)) = nn else { continue };
                let value = data_flat[i];
                if value > 0.0 {
                    sums[*cell] += value;
                    sq_sums[*cell] += value * value;
                    cell_counts[*cell] += 1;
                }
            }
        } else {
            log::warn!(
                "summary resample: rank-{} source geolocation is not indexed; \
                 filling the whole target",
                source.ndim()
            );
        }

        let fill = self.params.fill_value;
        let mut sd_values = sd.map(|plane| (plane, vec![fill; n_tar]));

        for cell in 0..n_tar {
            let n = cell_counts[cell];
            if n > 0 {
                let mean = sums[cell] / n as f64;
                sums[cell] = mean;
                if let Some((_, ref mut sd_flat)) = sd_values {
                    let variance = sq_sums[cell] / n as f64 - mean * mean;
                    sd_flat[cell] = if variance < 0.0 { 0.0 } else { variance.sqrt() };
                }
            } else {
                sums[cell] = fill;
            }
        }

        for (dst, v) in out.iter_mut().zip(&sums) {
            *dst = *v;
        }
        for (dst, c) in counts.iter_mut().zip(&cell_counts) {
            *dst = *c;
        }
        if let Some((plane, sd_flat)) = sd_values {
            for (dst, v) in plane.iter_mut().zip(&sd_flat) {
                *dst = *v;
            }
        }

        let filled = cell_counts.iter().filter(|&&c| c > 0).count();
        log::debug!("summary resample: {}/{} cells received data", filled, n_tar);

        Ok(())
    }

    /// Propagate fill through a companion plane: wherever `mask` holds the
    /// fill value, the matching cell of `values` is set to fill as well.
    pub fn apply_fill_mask(&self, values: &mut GeoArray, mask: &GeoArray) -> SwathResult<()> {
        check_same_shape("values vs mask", values.shape(), mask.shape())?;
        let fill = self.params.fill_value;
        for (v, m) in values.iter_mut().zip(mask.iter()) {
            if *m == fill {
                *v = fill;
            }
        }
        Ok(())
    }
}

fn check_same_shape(context: &str, actual: &[usize], expected: &[usize]) -> SwathResult<()> {
    if actual != expected {
        return Err(SwathError::ShapeMismatch(format!(
            "{}: {:?} vs {:?}",
            context, actual, expected
        )));
    }
    Ok(())
}

fn flat(a: &GeoArray) -> Vec<f64> {
    a.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, Array2};

    fn swath_1d(lat: Vec<f64>, lon: Vec<f64>) -> Swath {
        Swath::new(
            Array1::from_vec(lat).into_dyn(),
            Array1::from_vec(lon).into_dyn(),
        )
        .unwrap()
    }

    #[test]
    fn test_summary_averages_multiple_sources() {
        // Two sources ~111 m from the single target cell, radius 1 km.
        let source = swath_1d(vec![0.001, -0.001], vec![0.0, 0.0]);
        let data = Array1::from_vec(vec![2.0, 4.0]).into_dyn();
        let target = swath_1d(vec![0.0], vec![0.0]);

        let mut out = Array1::from_elem(1, f64::NAN).into_dyn();
        let mut sd = Array1::from_elem(1, f64::NAN).into_dyn();
        let mut counts = Array1::from_elem(1, 7_i32).into_dyn();

        let resampler = SwathResampler::with_radius(1000.0);
        resampler
            .resample_summary(&source, &data, &target, &mut out, Some(&mut sd), &mut counts)
            .unwrap();

        assert_abs_diff_eq!(out[[0]], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sd[[0]], 1.0, epsilon = 1e-12);
        assert_eq!(counts[[0]], 2);
    }

    #[test]
    fn test_summary_skips_non_positive_values() {
        let source = swath_1d(vec![0.001, -0.001, 0.0005], vec![0.0, 0.0, 0.0]);
        let data = Array1::from_vec(vec![6.0, -5.0, 0.0]).into_dyn();
        let target = swath_1d(vec![0.0], vec![0.0]);

        let mut out = Array1::zeros(1).into_dyn();
        let mut counts = Array1::zeros(1).into_dyn();

        let resampler = SwathResampler::with_radius(1000.0);
        resampler
            .resample_summary(&source, &data, &target, &mut out, None, &mut counts)
            .unwrap();

        // Only the positive value deposits.
        assert_abs_diff_eq!(out[[0]], 6.0, epsilon = 1e-12);
        assert_eq!(counts[[0]], 1);
    }

    #[test]
    fn test_summary_out_of_range_cell_gets_fill() {
        let source = swath_1d(vec![0.0], vec![0.001]);
        let data = Array1::from_vec(vec![9.0]).into_dyn();
        let target = swath_1d(vec![0.0, 1.0], vec![0.0, 1.0]);

        let mut out = Array1::zeros(2).into_dyn();
        let mut counts = Array1::zeros(2).into_dyn();

        let resampler = SwathResampler::with_radius(1000.0);
        resampler
            .resample_summary(&source, &data, &target, &mut out, None, &mut counts)
            .unwrap();

        assert_abs_diff_eq!(out[[0]], 9.0, epsilon = 1e-12);
        assert_eq!(out[[1]], FILL_VALUE);
        assert_eq!(counts[[1]], 0);
    }

    #[test]
    fn test_nearest_prefers_closer_source() {
        let source = swath_1d(vec![0.0, 1.0], vec![0.0, 1.0]);
        let data = Array1::from_vec(vec![10.0, 20.0]).into_dyn();
        // ~63 km from the first source, ~94 km from the second.
        let target = swath_1d(vec![0.4], vec![0.4]);

        let resampler = SwathResampler::with_radius(100_000.0);
        let out = resampler.resample_nearest(&source, &data, &target).unwrap();
        assert_abs_diff_eq!(out[[0]], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nearest_rejects_mismatched_data_shape() {
        let source = swath_1d(vec![0.0, 1.0], vec![0.0, 1.0]);
        let data = Array1::from_vec(vec![10.0]).into_dyn();
        let target = swath_1d(vec![0.4], vec![0.4]);

        let resampler = SwathResampler::with_radius(100_000.0);
        let err = resampler.resample_nearest(&source, &data, &target).unwrap_err();
        assert!(matches!(err, SwathError::ShapeMismatch(_)));
    }

    #[test]
    fn test_nearest_accepts_gridded_source() {
        // Pull-direction resampling flattens gridded geolocation.
        let lat = Array2::from_shape_vec((2, 2), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let lon = Array2::from_shape_vec((2, 2), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let source = Swath::new(lat.into_dyn(), lon.into_dyn()).unwrap();
        let data = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .into_dyn();
        let target = swath_1d(vec![1.1], vec![1.1]);

        let resampler = SwathResampler::with_radius(100_000.0);
        let out = resampler.resample_nearest(&source, &data, &target).unwrap();
        assert_abs_diff_eq!(out[[0]], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_apply_fill_mask() {
        let resampler = SwathResampler::with_radius(1000.0);
        let mut values = Array1::from_vec(vec![1.0, 2.0, 3.0]).into_dyn();
        let mask = Array1::from_vec(vec![0.5, FILL_VALUE, 0.5]).into_dyn();
        resampler.apply_fill_mask(&mut values, &mask).unwrap();
        assert_eq!(values[[1]], FILL_VALUE);
        assert_eq!(values[[0]], 1.0);
        assert_eq!(values[[2]], 3.0);
    }

    #[test]
    fn test_apply_fill_mask_shape_check() {
        let resampler = SwathResampler::with_radius(1000.0);
        let mut values = Array1::from_vec(vec![1.0, 2.0]).into_dyn();
        let mask = Array1::from_vec(vec![0.5]).into_dyn();
        assert!(resampler.apply_fill_mask(&mut values, &mask).is_err());
    }
}
