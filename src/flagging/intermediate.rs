// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use ndarray::prelude::*;

use super::{
    base_flag, lane_flags, sir_operator, store_flags, union_flags, FlagError, Flagger,
    FlaggerParams,
};

/// Flags data with several input polarisations that share one flag per
/// sample. Each polarisation is flagged independently starting from the
/// incoming flags, the results are OR-ed together and the SIR operator is
/// applied once to the union.
#[derive(Debug, Clone)]
pub struct IntermediateFlagger {
    params: FlaggerParams,
}

impl IntermediateFlagger {
    pub fn new(params: FlaggerParams) -> IntermediateFlagger {
        IntermediateFlagger { params }
    }

    /// Flag each polarisation independently and return the union of their
    /// flags, before any SIR processing.
    pub(crate) fn flag_polarisations(
        &self,
        samples: ArrayView2<f32>,
        flags: &[bool],
    ) -> Vec<bool> {
        let mut union = flags.to_vec();
        for pol in samples.axis_iter(Axis(1)) {
            let series = pol.to_vec();
            let mut pol_flags = flags.to_vec();
            base_flag(&series, &mut pol_flags, self.params.sensitivity);
            union_flags(&mut union, &pol_flags);
        }
        union
    }
}

impl Flagger for IntermediateFlagger {
    fn flag(
        &mut self,
        samples: ArrayView2<f32>,
        flags: ArrayViewMut1<bool>,
    ) -> Result<(), FlagError> {
        let incoming = lane_flags(&samples, &flags)?;
        let mut union = self.flag_polarisations(samples, &incoming);
        sir_operator(&mut union, self.params.sir_value);
        store_flags(flags, &union);
        Ok(())
    }
}
