// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Access to ingested data, with flagging and display normalisation.

mod error;

pub use error::ProviderError;

use std::str::FromStr;

use log::{debug, info};
use ndarray::prelude::*;
use rayon::prelude::*;

use crate::{
    flagging::{FlagError, FlaggerParams, FlaggerType, FLAGGER_TYPES_COMMA_SEPARATED},
    grid::{FlagMask, MinMaxVals, SampleGrid},
    io::read::{DataKind, Ingested},
    pulsar::{self, FoldedProfile, Observation},
};

/// Everything a consumer (e.g. a plotter or a pulsar search) needs from a
/// data set. Frequencies are indexed over all subbands, i.e. frequency
/// `subband * nr_channels + channel`.
pub trait DataProvider {
    fn file_name(&self) -> &str;

    fn kind(&self) -> DataKind;

    fn nr_times(&self) -> usize;

    fn nr_subbands(&self) -> usize;

    fn nr_channels(&self) -> usize;

    fn nr_polarisations(&self) -> usize;

    fn nr_freqs(&self) -> usize {
        self.nr_subbands() * self.nr_channels()
    }

    /// Select a flagger by name. This doesn't flag anything by itself; see
    /// [`DataProvider::flag`].
    fn set_flagger(&mut self, name: &str) -> Result<(), ProviderError>;

    fn set_flagger_sensitivity(&mut self, sensitivity: f32) -> Result<(), ProviderError>;

    /// Recompute the flags from scratch: start from the flags that came with
    /// the data and add whatever the selected flagger finds.
    fn flag(&mut self) -> Result<(), ProviderError>;

    /// The value of a sample normalised into `[0, 1]`. Flagged samples are 0.
    fn get_value(&self, time: usize, freq: usize, pol: usize) -> Result<f32, ProviderError>;

    fn get_raw_value(&self, time: usize, freq: usize, pol: usize) -> Result<f32, ProviderError>;

    fn is_flagged(&self, time: usize, freq: usize) -> Result<bool, ProviderError>;
}

/// The flagger a provider starts with for each kind of data.
pub fn default_flagger(kind: DataKind) -> FlaggerType {
    match kind {
        DataKind::Intermediate => FlaggerType::Intermediate,
        DataKind::BeamFormed => FlaggerType::BeamFormed,
        DataKind::Visibility => FlaggerType::PostCorrelation,
    }
}

/// Can data of this kind be flagged with this flagger?
pub fn is_supported(kind: DataKind, flagger: FlaggerType) -> bool {
    if flagger == FlaggerType::None {
        return true;
    }
    match kind {
        DataKind::Intermediate => flagger == FlaggerType::Intermediate,
        DataKind::BeamFormed => matches!(
            flagger,
            FlaggerType::BeamFormed | FlaggerType::BeamFormedSmooth
        ),
        DataKind::Visibility => matches!(
            flagger,
            FlaggerType::PostCorrelation | FlaggerType::PostCorrelationHistory
        ),
    }
}

/// A [`DataProvider`] that owns a [`SampleGrid`] read from a file.
#[derive(Debug, Clone)]
pub struct GridDataProvider {
    file: String,
    kind: DataKind,
    grid: SampleGrid,

    /// The flags that came with the data. These never change, except to follow
    /// their samples when dedispersing.
    initial_flagged: FlagMask,

    /// Always a superset of `initial_flagged`.
    flagged: FlagMask,
    min_max: MinMaxVals,

    flagger: FlaggerType,
    params: FlaggerParams,
    observation: Observation,

    /// Normalise values with the range of their own subband rather than the
    /// range of all data.
    scale_per_subband: bool,
}

impl GridDataProvider {
    pub fn new(ingested: Ingested, observation: Observation) -> GridDataProvider {
        let Ingested {
            file,
            kind,
            grid,
            initial_flagged,
            ..
        } = ingested;
        let min_max = MinMaxVals::new(&grid, &initial_flagged);
        GridDataProvider {
            file,
            kind,
            grid,
            flagged: initial_flagged.clone(),
            initial_flagged,
            min_max,
            flagger: default_flagger(kind),
            params: FlaggerParams::default(),
            observation,
            scale_per_subband: false,
        }
    }

    pub fn flagger(&self) -> FlaggerType {
        self.flagger
    }

    pub fn flagger_params(&self) -> FlaggerParams {
        self.params
    }

    pub fn set_sir_value(&mut self, sir_value: f32) -> Result<(), ProviderError> {
        let params = FlaggerParams {
            sir_value,
            ..self.params
        };
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn scale_per_subband(&self) -> bool {
        self.scale_per_subband
    }

    pub fn set_scale_per_subband(&mut self, scale_per_subband: bool) {
        self.scale_per_subband = scale_per_subband;
    }

    pub fn observation(&self) -> &Observation {
        &self.observation
    }

    pub fn grid(&self) -> &SampleGrid {
        &self.grid
    }

    pub fn flags(&self) -> &FlagMask {
        &self.flagged
    }

    pub fn initial_flags(&self) -> &FlagMask {
        &self.initial_flagged
    }

    pub fn min_max(&self) -> &MinMaxVals {
        &self.min_max
    }

    /// The fraction of all samples that are flagged.
    pub fn occupancy(&self) -> f64 {
        self.flagged.occupancy()
    }

    pub fn occupancy_per_subband(&self) -> Vec<f64> {
        self.flagged.occupancy_per_subband()
    }

    /// Dedisperse the data (and its flags) in place for a dispersion measure
    /// of `dm` \[pc cm^-3\]. See [`pulsar::dedisperse`].
    pub fn dedisperse(&mut self, dm: f64) -> Result<(), ProviderError> {
        let shifts = pulsar::dispersion_shifts(
            &self.observation,
            self.grid.nr_subbands(),
            self.grid.nr_channels(),
            dm,
        )?;
        debug!("Dedispersing {} at DM {dm}", self.file);
        pulsar::shift_grid(&mut self.grid, shifts.view());
        pulsar::shift_mask(&mut self.flagged, shifts.view());
        pulsar::shift_mask(&mut self.initial_flagged, shifts.view());
        self.min_max = MinMaxVals::new(&self.grid, &self.flagged);
        Ok(())
    }

    /// Fold the unflagged data on a rotational `period` \[s\]. See
    /// [`pulsar::fold`].
    pub fn fold(
        &self,
        period: f64,
        num_bins: Option<usize>,
    ) -> Result<FoldedProfile, ProviderError> {
        let profile = pulsar::fold(
            &self.grid,
            &self.flagged,
            self.observation.samples_per_second,
            period,
            num_bins,
        )?;
        Ok(profile)
    }

    fn check_index(&self, time: usize, freq: usize) -> Result<(usize, usize), ProviderError> {
        if time >= self.grid.nr_times() || freq >= self.grid.nr_freqs() {
            return Err(ProviderError::OutOfRange {
                time,
                freq,
                num_times: self.grid.nr_times(),
                num_freqs: self.grid.nr_freqs(),
            });
        }
        let nr_channels = self.grid.nr_channels();
        Ok((freq / nr_channels, freq % nr_channels))
    }

    fn check_pol(&self, pol: usize) -> Result<(), ProviderError> {
        let num_pols = self.grid.nr_polarisations();
        if pol >= num_pols {
            return Err(ProviderError::BadPolarisation { pol, num_pols });
        }
        Ok(())
    }
}

/// Run a flagger over the lanes of one subband. `data` is indexed
/// `[time][channel][pol]` and `flags` `[time][channel]`.
fn flag_subband(
    kind: DataKind,
    flagger_type: FlaggerType,
    params: FlaggerParams,
    data: ArrayView3<f32>,
    mut flags: ArrayViewMut2<bool>,
) -> Result<(), FlagError> {
    let Some(mut flagger) = flagger_type.build(params) else {
        return Ok(());
    };
    match kind {
        // Each channel's time series.
        DataKind::Intermediate => {
            for (samples, lane_flags) in data
                .axis_iter(Axis(1))
                .zip(flags.axis_iter_mut(Axis(1)))
            {
                flagger.flag(samples, lane_flags)?;
            }
        }
        // Each second's spectrum, in time order.
        DataKind::BeamFormed | DataKind::Visibility => {
            for (samples, lane_flags) in data.outer_iter().zip(flags.outer_iter_mut()) {
                flagger.flag(samples, lane_flags)?;
            }
        }
    }
    Ok(())
}

impl DataProvider for GridDataProvider {
    fn file_name(&self) -> &str {
        &self.file
    }

    fn kind(&self) -> DataKind {
        self.kind
    }

    fn nr_times(&self) -> usize {
        self.grid.nr_times()
    }

    fn nr_subbands(&self) -> usize {
        self.grid.nr_subbands()
    }

    fn nr_channels(&self) -> usize {
        self.grid.nr_channels()
    }

    fn nr_polarisations(&self) -> usize {
        self.grid.nr_polarisations()
    }

    fn set_flagger(&mut self, name: &str) -> Result<(), ProviderError> {
        let flagger =
            FlaggerType::from_str(name).map_err(|_| ProviderError::UnknownFlagger {
                name: name.to_string(),
                valid: FLAGGER_TYPES_COMMA_SEPARATED.clone(),
            })?;
        if !is_supported(self.kind, flagger) {
            return Err(ProviderError::UnsupportedFlagger {
                flagger: flagger.to_string(),
                kind: self.kind,
            });
        }
        debug!("Using the {flagger} flagger");
        self.flagger = flagger;
        Ok(())
    }

    fn set_flagger_sensitivity(&mut self, sensitivity: f32) -> Result<(), ProviderError> {
        let params = FlaggerParams {
            sensitivity,
            ..self.params
        };
        params.validate()?;
        self.params = params;
        Ok(())
    }

    fn flag(&mut self) -> Result<(), ProviderError> {
        self.params.validate()?;
        self.flagged = self.initial_flagged.clone();

        // Every subband is an independent stream with its own flagger, and
        // owns its slice of the flags.
        let (kind, flagger, params) = (self.kind, self.flagger, self.params);
        self.flagged
            .data
            .axis_iter_mut(Axis(1))
            .into_par_iter()
            .zip(self.grid.data.axis_iter(Axis(1)))
            .try_for_each(|(flags, data)| flag_subband(kind, flagger, params, data, flags))?;

        self.min_max = MinMaxVals::new(&self.grid, &self.flagged);
        info!(
            "Flagged {} with the {} flagger (sensitivity {}): {:.2}% flagged",
            self.file,
            self.flagger,
            self.params.sensitivity,
            100.0 * self.occupancy()
        );
        Ok(())
    }

    fn get_value(&self, time: usize, freq: usize, pol: usize) -> Result<f32, ProviderError> {
        let (i_subband, i_chan) = self.check_index(time, freq)?;
        self.check_pol(pol)?;
        if self.flagged.get(time, i_subband, i_chan) {
            return Ok(0.0);
        }
        let raw = self.grid.data[(time, i_subband, i_chan, pol)];
        Ok(self
            .min_max
            .normalise(raw, i_subband, self.scale_per_subband))
    }

    fn get_raw_value(&self, time: usize, freq: usize, pol: usize) -> Result<f32, ProviderError> {
        let (i_subband, i_chan) = self.check_index(time, freq)?;
        self.check_pol(pol)?;
        Ok(self.grid.data[(time, i_subband, i_chan, pol)])
    }

    fn is_flagged(&self, time: usize, freq: usize) -> Result<bool, ProviderError> {
        let (i_subband, i_chan) = self.check_index(time, freq)?;
        Ok(self.flagged.get(time, i_subband, i_chan))
    }
}
