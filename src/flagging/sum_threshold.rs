// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The SumThreshold algorithm.
//!
//! For window sizes M = 1, 2, 4, ..., the average of the unflagged samples in
//! every window of M consecutive samples is compared against
//! `χ_M = median + sensitivity * χ_1 / ρ^log2(M) * σ`, and the whole window is
//! flagged if the average is larger. Wide windows have lower thresholds, so
//! weak but broad interference is still caught.
//!
//! See Offringa et al. (2010), "Post-correlation radio frequency interference
//! classification methods".

use log::trace;

use crate::{
    constants::{FIRST_THRESHOLD, MAX_SUM_THRESHOLD_ITERS, THRESHOLD_RHO},
    math::RobustStatistics,
};

/// The threshold that the average of a window of `window` samples must exceed
/// for the window to be flagged.
pub fn window_threshold(window: usize, stats: &RobustStatistics, sensitivity: f32) -> f32 {
    // Without any spread, fall back to a σ proportional to the level of the
    // series so that the threshold scales with the data.
    let sigma = if stats.std_dev == 0.0 {
        stats.median.abs().max(stats.mean.abs()) * f32::EPSILON.sqrt()
    } else {
        stats.std_dev
    };
    let scale = FIRST_THRESHOLD / THRESHOLD_RHO.powf((window as f32).log2());
    stats.median + sensitivity * scale * sigma
}

/// Run all SumThreshold window sizes over `series` using the supplied
/// statistics. `series` is a working copy: every sample that gets flagged is
/// replaced by the threshold that flagged it. Flags are only ever added.
///
/// # Panics
///
/// Panics if `series` and `flags` have different lengths.
pub fn sum_threshold(
    series: &mut [f32],
    flags: &mut [bool],
    stats: &RobustStatistics,
    sensitivity: f32,
) {
    assert_eq!(
        series.len(),
        flags.len(),
        "series and flags must have the same length"
    );

    let mut window = 1;
    for _ in 0..MAX_SUM_THRESHOLD_ITERS {
        if window > series.len() {
            break;
        }
        let threshold = window_threshold(window, stats, sensitivity);
        sum_threshold_window(series, flags, window, threshold);
        window *= 2;
    }
}

/// A single SumThreshold window size. Which samples take part in each window
/// average is decided by the flags as they were before this pass.
fn sum_threshold_window(series: &mut [f32], flags: &mut [bool], window: usize, threshold: f32) {
    let before = flags.to_vec();
    let threshold_f64 = f64::from(threshold);

    let mut sum = 0.0_f64;
    let mut count = 0_usize;
    for i in 0..series.len() {
        if !before[i] {
            sum += f64::from(series[i]);
            count += 1;
        }
        if i >= window {
            let leaving = i - window;
            if !before[leaving] {
                sum -= f64::from(series[leaving]);
                count -= 1;
            }
        }

        if i + 1 >= window && count > 0 && sum / count as f64 > threshold_f64 {
            flags[i + 1 - window..=i].fill(true);
        }
    }

    let mut num_new = 0;
    for ((v, &new), &old) in series.iter_mut().zip(flags.iter()).zip(before.iter()) {
        if new && !old {
            *v = threshold;
            num_new += 1;
        }
    }
    trace!("SumThreshold window {window}: threshold {threshold}, {num_new} new flags");
}

/// Calculate robust statistics of the unflagged samples in `working` and then
/// run SumThreshold with them.
pub fn sum_threshold_pass(working: &mut [f32], flags: &mut [bool], sensitivity: f32) {
    let stats = RobustStatistics::new(working, flags);
    sum_threshold(working, flags, &stats, sensitivity);
}

/// The base flagging used by all flaggers: two statistics + SumThreshold
/// passes. The second pass uses statistics that no longer include whatever the
/// first pass flagged. The returned working copy has all newly flagged samples
/// replaced with bounded values.
pub fn base_flag(series: &[f32], flags: &mut [bool], sensitivity: f32) -> Vec<f32> {
    let mut working = series.to_vec();
    sum_threshold_pass(&mut working, flags, sensitivity);
    sum_threshold_pass(&mut working, flags, sensitivity);
    working
}
