// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PulsarError {
    #[error("The folding period must be positive and finite, but got {0} s")]
    NonPositivePeriod(f64),

    #[error("The folding period ({period} s) is longer than the data ({duration} s)")]
    PeriodExceedsData { period: f64, duration: f64 },

    #[error("Cannot fold into 0 phase bins")]
    ZeroBins,

    #[error("Cannot fold {bins} phase bins out of {max} time samples")]
    TooManyBins { bins: usize, max: usize },

    #[error("The sample rate must be positive and finite, but got {0} samples per second")]
    NonPositiveSampleRate(f64),

    #[error("Channel frequencies must be positive, but one is {freq} MHz")]
    NonPositiveFrequency { freq: f64 },

    #[error("The data has shape {grid:?} but its flags have shape {flags:?}")]
    ShapeMismatch {
        grid: (usize, usize, usize),
        flags: (usize, usize, usize),
    },
}
