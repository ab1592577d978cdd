// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use log::trace;
use ndarray::prelude::*;

use super::{base_flag, lane_flags, sir_operator, store_flags, FlagError, Flagger, FlaggerParams};
use crate::{constants::SMOOTHING_SIGMA, math::gaussian_smooth};

/// Flags a single power series. If the lane has more than one polarisation,
/// they are summed into total power first.
///
/// The smooth variant additionally subtracts a Gaussian-smoothed baseline from
/// the series and flags the residual, which finds narrowband interference
/// sitting on a slowly drifting baseline.
#[derive(Debug, Clone)]
pub struct BeamFormedFlagger {
    params: FlaggerParams,
    smooth: bool,
}

impl BeamFormedFlagger {
    pub fn new(params: FlaggerParams) -> BeamFormedFlagger {
        BeamFormedFlagger {
            params,
            smooth: false,
        }
    }

    pub fn smooth(params: FlaggerParams) -> BeamFormedFlagger {
        BeamFormedFlagger {
            params,
            smooth: true,
        }
    }

    pub fn is_smooth(&self) -> bool {
        self.smooth
    }
}

impl Flagger for BeamFormedFlagger {
    fn flag(
        &mut self,
        samples: ArrayView2<f32>,
        flags: ArrayViewMut1<bool>,
    ) -> Result<(), FlagError> {
        let mut new_flags = lane_flags(&samples, &flags)?;
        let power = samples.sum_axis(Axis(1)).to_vec();
        let sensitivity = self.params.sensitivity;

        let working = base_flag(&power, &mut new_flags, sensitivity);
        if self.smooth {
            // The working copy has its outliers clamped, so they don't drag
            // the baseline up.
            let baseline = gaussian_smooth(&working, SMOOTHING_SIGMA);
            let residual: Vec<f32> = power
                .iter()
                .zip(&baseline)
                .map(|(p, b)| p - b)
                .collect();
            base_flag(&residual, &mut new_flags, sensitivity);
            trace!("Flagged the residual of a smoothed baseline");
        }
        sir_operator(&mut new_flags, self.params.sir_value);

        store_flags(flags, &new_flags);
        Ok(())
    }
}
