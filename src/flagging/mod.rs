// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! RFI flagging.
//!
//! All flaggers work on a single *lane* at a time: a `[sample][polarisation]`
//! view of the data with one flag per sample (flags are shared by all
//! polarisations). The building blocks are the robust statistics in
//! [`crate::math`], [`sum_threshold`] and the [`sir_operator`].

mod beam_formed;
mod error;
mod history;
mod intermediate;
mod post_correlation;
mod sir;
mod sum_threshold;

pub use beam_formed::BeamFormedFlagger;
pub use error::FlagError;
pub use history::{FlaggerHistory, HistoryEntry};
pub use intermediate::IntermediateFlagger;
pub use post_correlation::{
    PostCorrelationHistorySumThresholdFlagger, PostCorrelationSumThresholdFlagger,
};
pub use sir::sir_operator;
pub use sum_threshold::{base_flag, sum_threshold, sum_threshold_pass, window_threshold};

use itertools::Itertools;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::constants::{DEFAULT_SENSITIVITY, DEFAULT_SIR_VALUE};

lazy_static::lazy_static! {
    pub static ref FLAGGER_TYPES_COMMA_SEPARATED: String = FlaggerType::iter().join(", ");
}

/// Anything that can flag a lane of samples.
pub trait Flagger {
    /// Add flags to `flags` for the samples in `samples`, which is indexed
    /// `[sample][polarisation]`. Existing flags are never removed.
    fn flag(
        &mut self,
        samples: ArrayView2<f32>,
        flags: ArrayViewMut1<bool>,
    ) -> Result<(), FlagError>;
}

/// The available flaggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
pub enum FlaggerType {
    /// Don't do any flagging beyond what came with the data.
    #[strum(serialize = "none")]
    None,

    #[strum(serialize = "intermediate")]
    Intermediate,

    #[strum(serialize = "beam-formed")]
    BeamFormed,

    /// Beam-formed flagging that also flags the residual after subtracting a
    /// smoothed baseline.
    #[strum(serialize = "beam-formed-smooth")]
    BeamFormedSmooth,

    #[strum(serialize = "post-correlation")]
    PostCorrelation,

    #[strum(serialize = "post-correlation-history")]
    PostCorrelationHistory,
}

impl FlaggerType {
    /// Create a new flagger of this type. [`FlaggerType::None`] doesn't have
    /// one.
    pub fn build(self, params: FlaggerParams) -> Option<Box<dyn Flagger>> {
        let flagger: Box<dyn Flagger> = match self {
            FlaggerType::None => return None,
            FlaggerType::Intermediate => Box::new(IntermediateFlagger::new(params)),
            FlaggerType::BeamFormed => Box::new(BeamFormedFlagger::new(params)),
            FlaggerType::BeamFormedSmooth => Box::new(BeamFormedFlagger::smooth(params)),
            FlaggerType::PostCorrelation => {
                Box::new(PostCorrelationSumThresholdFlagger::new(params))
            }
            FlaggerType::PostCorrelationHistory => {
                Box::new(PostCorrelationHistorySumThresholdFlagger::new(params))
            }
        };
        Some(flagger)
    }
}

/// Parameters shared by all flaggers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlaggerParams {
    /// Scales all SumThreshold thresholds. Higher values flag less.
    pub sensitivity: f32,

    /// The SIR operator's η.
    pub sir_value: f32,
}

impl Default for FlaggerParams {
    fn default() -> Self {
        FlaggerParams {
            sensitivity: DEFAULT_SENSITIVITY,
            sir_value: DEFAULT_SIR_VALUE,
        }
    }
}

impl FlaggerParams {
    pub fn validate(&self) -> Result<(), FlagError> {
        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            return Err(FlagError::InvalidSensitivity(self.sensitivity));
        }
        if !(self.sir_value > 0.0 && self.sir_value < 1.0) {
            return Err(FlagError::InvalidSirValue(self.sir_value));
        }
        Ok(())
    }
}

/// Check that a lane is usable, returning its flags as a contiguous vector.
fn lane_flags(
    samples: &ArrayView2<f32>,
    flags: &ArrayViewMut1<bool>,
) -> Result<Vec<bool>, FlagError> {
    if samples.len_of(Axis(0)) != flags.len() {
        return Err(FlagError::LengthMismatch {
            samples: samples.len_of(Axis(0)),
            flags: flags.len(),
        });
    }
    if samples.len_of(Axis(1)) == 0 {
        return Err(FlagError::NoPolarisations);
    }
    Ok(flags.to_vec())
}

/// OR `src` into `dst`.
pub fn union_flags(dst: &mut [bool], src: &[bool]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d |= s;
    }
}

/// Write a contiguous flag vector back into a lane's flags.
fn store_flags(mut flags: ArrayViewMut1<bool>, new: &[bool]) {
    flags.assign(&ArrayView1::from(new));
}
