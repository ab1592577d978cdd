// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Robust statistics and some other helper mathematics.


use crate::constants::WINSOR_MAD_FACTOR;

/// Statistics of the unflagged samples of a series. The mean and standard
/// deviation are winsorized: values further than [`WINSOR_MAD_FACTOR`]
/// median-absolute-deviations from the median are clamped to that boundary
/// rather than discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RobustStatistics {
    pub mean: f32,
    pub median: f32,
    pub std_dev: f32,
}

impl RobustStatistics {
    /// Calculate statistics over the samples of `series` whose corresponding
    /// entry in `flags` is `false`. If every sample is flagged, all statistics
    /// are zero.
    ///
    /// # Panics
    ///
    /// Panics if `series` and `flags` have different lengths.
    pub fn new(series: &[f32], flags: &[bool]) -> RobustStatistics {
        assert_eq!(
            series.len(),
            flags.len(),
            "series and flags must have the same length"
        );

        let mut unflagged: Vec<f32> = series
            .iter()
            .zip(flags)
            .filter(|(_, &flagged)| !flagged)
            .map(|(&v, _)| v)
            .collect();
        if unflagged.is_empty() {
            return RobustStatistics::default();
        }

        let median = median_in_place(&mut unflagged);
        let mut deviations: Vec<f32> = unflagged.iter().map(|v| (v - median).abs()).collect();
        let mad = median_in_place(&mut deviations);
        let low = median - WINSOR_MAD_FACTOR * mad;
        let high = median + WINSOR_MAD_FACTOR * mad;

        // Accumulate in double precision; series can be long.
        let n = unflagged.len() as f64;
        let mean = unflagged
            .iter()
            .map(|&v| f64::from(v.clamp(low, high)))
            .sum::<f64>()
            / n;
        let variance = unflagged
            .iter()
            .map(|&v| {
                let d = f64::from(v.clamp(low, high)) - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        RobustStatistics {
            mean: mean as f32,
            median,
            std_dev: variance.sqrt() as f32,
        }
    }
}

/// Get the median of some values. The values are sorted in place. For an even
/// number of values, the mean of the two middle values is returned. An empty
/// slice has a median of 0.
pub fn median_in_place(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        0.5 * (values[mid - 1] + values[mid])
    }
}

/// Convolve a series with a normalised Gaussian kernel of standard deviation
/// `sigma` (in samples). The kernel is truncated at 3 sigma and renormalised
/// at the series edges, so a constant series is left unchanged.
pub fn gaussian_smooth(series: &[f32], sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 || series.is_empty() {
        return series.to_vec();
    }

    let radius = (3.0 * sigma).ceil() as usize;
    let kernel: Vec<f64> = (0..=radius)
        .map(|d| {
            let x = d as f64 / f64::from(sigma);
            (-0.5 * x * x).exp()
        })
        .collect();

    let n = series.len();
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(radius);
            let end = (i + radius).min(n - 1);
            let (sum, weight) = (start..=end).fold((0.0, 0.0), |(sum, weight), j| {
                let w = kernel[i.abs_diff(j)];
                (sum + w * f64::from(series[j]), weight + w)
            });
            (sum / weight) as f32
        })
        .collect()
}
