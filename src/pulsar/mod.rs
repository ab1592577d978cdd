// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Dedispersion and folding of cleaned dynamic spectra.

mod error;
#[cfg(test)]
mod tests;

pub use error::PulsarError;

use log::debug;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    constants::DISPERSION_CONSTANT,
    grid::{FlagMask, SampleGrid},
};

/// What is needed to put times and frequencies on the grid's axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// The frequency of the first channel of the first subband \[MHz\].
    pub low_freq_mhz: f64,

    /// The frequency separation of adjacent channels \[MHz\]. Channels of
    /// consecutive subbands are assumed to be contiguous.
    pub freq_step_mhz: f64,

    /// The number of grid samples per second, i.e. after integration.
    pub samples_per_second: f64,
}

impl Observation {
    /// The frequency of a channel \[MHz\], indexed over all subbands.
    pub fn freq_mhz(&self, freq_index: usize) -> f64 {
        self.low_freq_mhz + freq_index as f64 * self.freq_step_mhz
    }
}

fn check_shape(grid: &SampleGrid, flags: &FlagMask) -> Result<(), PulsarError> {
    let grid_dim = (grid.nr_times(), grid.nr_subbands(), grid.nr_channels());
    if grid_dim != flags.dim() {
        return Err(PulsarError::ShapeMismatch {
            grid: grid_dim,
            flags: flags.dim(),
        });
    }
    Ok(())
}

/// The time shift (in samples) that removes the dispersion delay of every
/// frequency, relative to the highest frequency, for a dispersion measure of
/// `dm` \[pc cm^-3\]. Indexed `[subband][channel]`.
pub fn dispersion_shifts(
    obs: &Observation,
    nr_subbands: usize,
    nr_channels: usize,
    dm: f64,
) -> Result<Array2<isize>, PulsarError> {
    if !(obs.samples_per_second > 0.0 && obs.samples_per_second.is_finite()) {
        return Err(PulsarError::NonPositiveSampleRate(obs.samples_per_second));
    }
    let nr_freqs = nr_subbands * nr_channels;
    if let Some(freq) = (0..nr_freqs).map(|i| obs.freq_mhz(i)).find(|&f| f <= 0.0) {
        return Err(PulsarError::NonPositiveFrequency { freq });
    }
    let f_ref = (0..nr_freqs)
        .map(|i| obs.freq_mhz(i))
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(Array2::from_shape_fn(
        (nr_subbands, nr_channels),
        |(i_subband, i_chan)| {
            let f = obs.freq_mhz(i_subband * nr_channels + i_chan);
            let delay = DISPERSION_CONSTANT * dm * (f_ref.powi(-2) - f.powi(-2));
            (delay * obs.samples_per_second).round() as isize
        },
    ))
}

/// Circularly shift a series so that `out[t] = in[t - shift]`.
fn rotate<T: Copy>(mut lane: ArrayViewMut1<T>, shift: isize) {
    let n = lane.len();
    if n == 0 {
        return;
    }
    let shift = shift.rem_euclid(n as isize) as usize;
    if shift == 0 {
        return;
    }
    let original = lane.to_vec();
    for (t, v) in lane.iter_mut().enumerate() {
        *v = original[(t + n - shift) % n];
    }
}

/// Shift the time series of every cell of `grid` by `shifts`. See
/// [`dispersion_shifts`].
pub fn shift_grid(grid: &mut SampleGrid, shifts: ArrayView2<isize>) {
    for ((i_subband, i_chan), &shift) in shifts.indexed_iter() {
        for i_pol in 0..grid.nr_polarisations() {
            rotate(
                grid.data.slice_mut(s![.., i_subband, i_chan, i_pol]),
                shift,
            );
        }
    }
}

/// Shift a flag mask exactly like [`shift_grid`], so that flags stay with
/// their samples.
pub fn shift_mask(mask: &mut FlagMask, shifts: ArrayView2<isize>) {
    for ((i_subband, i_chan), &shift) in shifts.indexed_iter() {
        rotate(mask.data.slice_mut(s![.., i_subband, i_chan]), shift);
    }
}

/// Dedisperse `grid` and `flags` in place for a dispersion measure of `dm`
/// \[pc cm^-3\]. Lower frequencies are moved earlier in time to line up with
/// the highest frequency. Samples shifted off one end of the dynamic spectrum
/// reappear at the other end, so dedispersing by `-dm` afterwards restores
/// the original exactly.
pub fn dedisperse(
    grid: &mut SampleGrid,
    flags: &mut FlagMask,
    obs: &Observation,
    dm: f64,
) -> Result<(), PulsarError> {
    check_shape(grid, flags)?;
    let shifts = dispersion_shifts(obs, grid.nr_subbands(), grid.nr_channels(), dm)?;
    debug!(
        "Dedispersing at DM {dm}; largest shift is {} samples",
        shifts.iter().map(|s| s.abs()).max().unwrap_or(0)
    );
    shift_grid(grid, shifts.view());
    shift_mask(flags, shifts.view());
    Ok(())
}

/// A pulse profile: the average unflagged intensity in each phase bin.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldedProfile {
    /// The average intensity of each bin. Bins without any samples are 0.
    pub values: Vec<f32>,

    /// The number of (unflagged) cells that contributed to each bin.
    pub counts: Vec<usize>,
}

impl FoldedProfile {
    pub fn num_bins(&self) -> usize {
        self.values.len()
    }

    /// The bin holding the largest value, if any bin has samples.
    pub fn peak_bin(&self) -> Option<usize> {
        self.values
            .iter()
            .zip(&self.counts)
            .enumerate()
            .filter(|(_, (_, &c))| c > 0)
            .max_by(|(_, (a, _)), (_, (b, _))| a.total_cmp(b))
            .map(|(i, _)| i)
    }
}

/// Fold the grid on a rotational `period` \[s\], summing all polarisations of
/// each unflagged cell into the phase bin of its time sample. If `num_bins` is
/// `None`, one bin per sample of the period is used. The period must fit in
/// the data and there can't be more bins than time samples.
pub fn fold(
    grid: &SampleGrid,
    flags: &FlagMask,
    samples_per_second: f64,
    period: f64,
    num_bins: Option<usize>,
) -> Result<FoldedProfile, PulsarError> {
    check_shape(grid, flags)?;
    if !(samples_per_second > 0.0 && samples_per_second.is_finite()) {
        return Err(PulsarError::NonPositiveSampleRate(samples_per_second));
    }
    if !(period > 0.0 && period.is_finite()) {
        return Err(PulsarError::NonPositivePeriod(period));
    }
    let nr_times = grid.nr_times();
    let samples_per_period = period * samples_per_second;
    if samples_per_period > nr_times as f64 {
        return Err(PulsarError::PeriodExceedsData {
            period,
            duration: nr_times as f64 / samples_per_second,
        });
    }
    // A period covers at most `nr_times` samples, so this also bounds the
    // default.
    let max_bins = nr_times.max(1);
    let num_bins = match num_bins {
        Some(0) => return Err(PulsarError::ZeroBins),
        Some(n) if n > max_bins => {
            return Err(PulsarError::TooManyBins {
                bins: n,
                max: max_bins,
            })
        }
        Some(n) => n,
        None => (samples_per_period.round() as usize).clamp(1, max_bins),
    };

    let mut sums = vec![0.0_f64; num_bins];
    let mut counts = vec![0_usize; num_bins];
    for (i_time, (time_data, time_flags)) in grid
        .data
        .outer_iter()
        .zip(flags.data.outer_iter())
        .enumerate()
    {
        let phase = (i_time as f64 % samples_per_period) / samples_per_period;
        let bin = ((phase * num_bins as f64) as usize).min(num_bins - 1);

        for (pols, &flagged) in time_data.lanes(Axis(2)).into_iter().zip(time_flags.iter()) {
            if flagged {
                continue;
            }
            sums[bin] += pols.iter().map(|&v| f64::from(v)).sum::<f64>();
            counts[bin] += 1;
        }
    }

    let values = sums
        .into_iter()
        .zip(&counts)
        .map(|(sum, &count)| {
            if count == 0 {
                0.0
            } else {
                (sum / count as f64) as f32
            }
        })
        .collect();
    Ok(FoldedProfile { values, counts })
}
