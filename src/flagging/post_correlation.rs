// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Flaggers for correlated (per-baseline) data. A lane is the per-channel
//! power of one second of one subband. Each polarisation is flagged
//! separately, starting from the incoming flags, and the results are OR-ed
//! together before the SIR operator is applied.

use log::debug;
use ndarray::prelude::*;

use super::{
    base_flag, lane_flags, sir_operator, store_flags, sum_threshold_pass, union_flags, FlagError,
    Flagger, FlaggerHistory, FlaggerParams,
};
use crate::{
    constants::{HISTORY_FLAGGING_THRESHOLD, HISTORY_SIZE, MIN_HISTORY_SIZE},
    math::RobustStatistics,
};

#[derive(Debug, Clone)]
pub struct PostCorrelationSumThresholdFlagger {
    params: FlaggerParams,
}

impl PostCorrelationSumThresholdFlagger {
    pub fn new(params: FlaggerParams) -> PostCorrelationSumThresholdFlagger {
        PostCorrelationSumThresholdFlagger { params }
    }
}

impl Flagger for PostCorrelationSumThresholdFlagger {
    fn flag(
        &mut self,
        samples: ArrayView2<f32>,
        flags: ArrayViewMut1<bool>,
    ) -> Result<(), FlagError> {
        let incoming = lane_flags(&samples, &flags)?;
        let mut union = incoming.clone();
        for pol in samples.axis_iter(Axis(1)) {
            let mut pol_flags = incoming.clone();
            base_flag(&pol.to_vec(), &mut pol_flags, self.params.sensitivity);
            union_flags(&mut union, &pol_flags);
        }
        sir_operator(&mut union, self.params.sir_value);
        store_flags(flags, &union);
        Ok(())
    }
}

/// Like [`PostCorrelationSumThresholdFlagger`], but each call is treated as
/// the next second of a stream and compared against a [`FlaggerHistory`] of
/// earlier seconds. Once the history holds [`MIN_HISTORY_SIZE`] seconds:
///
/// - the history's integrated power is flagged too, catching interference
///   that is weak in one second but persistent over many;
/// - a second whose median is more than [`HISTORY_FLAGGING_THRESHOLD`]
///   standard deviations above the history's mean median is flagged
///   entirely, and recorded with the history's averages so that it doesn't
///   skew later comparisons.
///
/// With less history than that, this behaves exactly like the non-history
/// flagger, while still recording history.
#[derive(Debug, Clone)]
pub struct PostCorrelationHistorySumThresholdFlagger {
    params: FlaggerParams,
    history: FlaggerHistory,
}

impl PostCorrelationHistorySumThresholdFlagger {
    pub fn new(params: FlaggerParams) -> PostCorrelationHistorySumThresholdFlagger {
        Self::with_capacity(params, HISTORY_SIZE)
    }

    pub fn with_capacity(
        params: FlaggerParams,
        capacity: usize,
    ) -> PostCorrelationHistorySumThresholdFlagger {
        PostCorrelationHistorySumThresholdFlagger {
            params,
            history: FlaggerHistory::new(capacity),
        }
    }

    pub fn history(&self) -> &FlaggerHistory {
        &self.history
    }

    fn flag_polarisation(&mut self, pol: usize, powers: &[f32], flags: &mut [bool]) {
        let sensitivity = self.params.sensitivity;
        base_flag(powers, flags, sensitivity);
        let mut stats = RobustStatistics::new(powers, flags);

        if self.history.len(pol) >= MIN_HISTORY_SIZE {
            let mut integrated = self.history.integrated_powers(pol);
            for (sum, &p) in integrated.iter_mut().zip(powers) {
                *sum += p;
            }
            // Only use the integrated powers if the channel count hasn't
            // changed underneath us.
            if integrated.len() == powers.len() {
                sum_threshold_pass(&mut integrated, flags, sensitivity);
                stats = RobustStatistics::new(powers, flags);
            }

            // The history has entries, so these are always available.
            let mean_median = self.history.mean_median(pol).unwrap_or(stats.median);
            let std_dev_of_medians = self.history.std_dev_of_medians(pol).unwrap_or(0.0);
            if stats.median > mean_median + HISTORY_FLAGGING_THRESHOLD * std_dev_of_medians {
                debug!(
                    "Second {:?}, pol {pol}: median {} is an outlier against the history ({mean_median} +/- {std_dev_of_medians}); flagging the whole second",
                    self.history.current_second(),
                    stats.median
                );
                flags.fill(true);
                let mean_powers = self.history.mean_powers(pol);
                self.history
                    .add(pol, stats.mean, mean_median, stats.std_dev, mean_powers);
                return;
            }
        }

        let corrected: Vec<f32> = powers
            .iter()
            .zip(flags.iter())
            .map(|(&p, &flagged)| if flagged { stats.median } else { p })
            .collect();
        self.history
            .add(pol, stats.mean, stats.median, stats.std_dev, corrected);
    }
}

impl Flagger for PostCorrelationHistorySumThresholdFlagger {
    fn flag(
        &mut self,
        samples: ArrayView2<f32>,
        flags: ArrayViewMut1<bool>,
    ) -> Result<(), FlagError> {
        let incoming = lane_flags(&samples, &flags)?;
        let mut union = incoming.clone();
        for (i_pol, pol) in samples.axis_iter(Axis(1)).enumerate() {
            // Only the first polarisation starts a new second, so the
            // histories of all polarisations stay aligned.
            if i_pol == 0 {
                self.history.advance();
            }
            let mut pol_flags = incoming.clone();
            self.flag_polarisation(i_pol, &pol.to_vec(), &mut pol_flags);
            union_flags(&mut union, &pol_flags);
        }
        sir_operator(&mut union, self.params.sir_value);
        store_flags(flags, &union);
        Ok(())
    }
}
