// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

Flagging thresholds are expressed in units of the (winsorized) standard
deviation of the series being flagged.
 */

/// The default flagger sensitivity. Higher values flag less.
pub const DEFAULT_SENSITIVITY: f32 = 1.0;

/// The default SIR value (η). The SIR operator flags a gap between flagged
/// samples if at most this fraction of the enclosing window is unflagged.
pub const DEFAULT_SIR_VALUE: f32 = 0.4;

/// The threshold for a SumThreshold window of a single sample.
pub const FIRST_THRESHOLD: f32 = 6.0;

/// How quickly SumThreshold thresholds shrink as the window size doubles
/// (ρ in `χ_M = χ_1 / ρ^log2(M)`).
pub const THRESHOLD_RHO: f32 = 1.5;

/// The number of SumThreshold window sizes (1, 2, 4, ...). The largest window
/// is therefore 2^(n-1) samples, or the series length if that is smaller.
pub const MAX_SUM_THRESHOLD_ITERS: usize = 7;

/// Unflagged values further than this many median-absolute-deviations from
/// the median are clamped before the mean and standard deviation are
/// calculated.
pub const WINSOR_MAD_FACTOR: f32 = 3.0;

/// The standard deviation of the Gaussian kernel used by the smoothed
/// beam-formed flagger \[samples\].
pub const SMOOTHING_SIGMA: f32 = 2.0;

/// The maximum number of seconds kept in a [`crate::flagging::FlaggerHistory`].
pub const HISTORY_SIZE: usize = 64;

/// The number of seconds a [`crate::flagging::FlaggerHistory`] must contain
/// before history-based flagging is attempted.
pub const MIN_HISTORY_SIZE: usize = 4;

/// A second whose median exceeds the history's mean median by this many
/// standard deviations of the history's medians is flagged entirely.
pub const HISTORY_FLAGGING_THRESHOLD: f32 = 7.0;

/// The dispersion constant \[s MHz^2 pc^-1 cm^3\]. A dispersion measure of 1
/// delays a signal at 1 MHz by this many seconds relative to infinite
/// frequency.
pub const DISPERSION_CONSTANT: f64 = 4.148808e3;
