// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The in-memory representation of ingested data: a dense grid of
//! intensities, the flags that apply to it and the min/max bookkeeping used to
//! normalise it for display.


use ndarray::{prelude::*, Zip};

/// Dense intensities indexed by `[time][subband][channel][polarisation]`. Each
/// cell is the sum of `integration_factor` raw samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    pub(crate) data: Array4<f32>,
}

impl SampleGrid {
    /// A grid of zeros.
    pub fn zeros(
        nr_times: usize,
        nr_subbands: usize,
        nr_channels: usize,
        nr_polarisations: usize,
    ) -> SampleGrid {
        SampleGrid {
            data: Array4::zeros((nr_times, nr_subbands, nr_channels, nr_polarisations)),
        }
    }

    pub fn from_array(data: Array4<f32>) -> SampleGrid {
        SampleGrid { data }
    }

    pub fn nr_times(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn nr_subbands(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn nr_channels(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn nr_polarisations(&self) -> usize {
        self.data.len_of(Axis(3))
    }

    /// The total number of frequency channels over all subbands.
    pub fn nr_freqs(&self) -> usize {
        self.nr_subbands() * self.nr_channels()
    }

    pub fn view(&self) -> ArrayView4<f32> {
        self.data.view()
    }

    pub fn view_mut(&mut self) -> ArrayViewMut4<f32> {
        self.data.view_mut()
    }

    /// Set every polarisation of every flagged cell to zero.
    pub(crate) fn zero_flagged(&mut self, flags: &FlagMask) {
        Zip::from(self.data.lanes_mut(Axis(3)))
            .and(&flags.data)
            .for_each(|mut pols, &flagged| {
                if flagged {
                    pols.fill(0.0);
                }
            });
    }
}

/// Flags indexed by `[time][subband][channel]`. A flag applies to all
/// polarisations of its cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagMask {
    pub(crate) data: Array3<bool>,
}

impl FlagMask {
    /// A mask with nothing flagged.
    pub fn new(nr_times: usize, nr_subbands: usize, nr_channels: usize) -> FlagMask {
        FlagMask {
            data: Array3::from_elem((nr_times, nr_subbands, nr_channels), false),
        }
    }

    pub fn from_array(data: Array3<bool>) -> FlagMask {
        FlagMask { data }
    }

    pub fn view(&self) -> ArrayView3<bool> {
        self.data.view()
    }

    pub fn view_mut(&mut self) -> ArrayViewMut3<bool> {
        self.data.view_mut()
    }

    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn get(&self, time: usize, subband: usize, channel: usize) -> bool {
        self.data[(time, subband, channel)]
    }

    pub fn set(&mut self, time: usize, subband: usize, channel: usize) {
        self.data[(time, subband, channel)] = true;
    }

    /// Flag everything flagged in `other` as well.
    ///
    /// # Panics
    ///
    /// Panics if the masks have different shapes.
    pub fn union_with(&mut self, other: &FlagMask) {
        assert_eq!(self.dim(), other.dim(), "flag masks must have the same shape");
        self.data
            .zip_mut_with(&other.data, |mine, &theirs| *mine |= theirs);
    }

    /// Is every flag in `other` also set in `self`?
    pub fn is_superset_of(&self, other: &FlagMask) -> bool {
        self.dim() == other.dim()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(&mine, &theirs)| mine || !theirs)
    }

    pub fn num_flagged(&self) -> usize {
        self.data.iter().filter(|&&f| f).count()
    }

    /// The fraction of all cells that are flagged. An empty mask has an
    /// occupancy of 0.
    pub fn occupancy(&self) -> f64 {
        if self.data.is_empty() {
            0.0
        } else {
            self.num_flagged() as f64 / self.data.len() as f64
        }
    }

    /// The fraction of cells that are flagged in each subband.
    pub fn occupancy_per_subband(&self) -> Vec<f64> {
        self.data
            .axis_iter(Axis(1))
            .map(|subband| {
                if subband.is_empty() {
                    0.0
                } else {
                    subband.iter().filter(|&&f| f).count() as f64 / subband.len() as f64
                }
            })
            .collect()
    }
}

/// The minimum and maximum unflagged values, globally and per subband. These
/// are only used to map raw values into the range `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxVals {
    pub min: f32,
    pub max: f32,
    pub subbands: Vec<(f32, f32)>,
}

impl MinMaxVals {
    /// Accumulate over every polarisation of every unflagged cell. If nothing
    /// is unflagged, all ranges are `(0, 0)`.
    pub fn new(grid: &SampleGrid, flags: &FlagMask) -> MinMaxVals {
        let empty = (f32::INFINITY, f32::NEG_INFINITY);
        let mut global = empty;
        let mut subbands = vec![empty; grid.nr_subbands()];

        for ((i_time, i_subband, i_chan), &flagged) in flags.data.indexed_iter() {
            if flagged {
                continue;
            }
            for &v in grid.data.slice(s![i_time, i_subband, i_chan, ..]) {
                global = (global.0.min(v), global.1.max(v));
                let sb = &mut subbands[i_subband];
                *sb = (sb.0.min(v), sb.1.max(v));
            }
        }

        let finish = |(min, max): (f32, f32)| {
            if min > max {
                (0.0, 0.0)
            } else {
                (min, max)
            }
        };
        let (min, max) = finish(global);
        MinMaxVals {
            min,
            max,
            subbands: subbands.into_iter().map(finish).collect(),
        }
    }

    /// Map a raw value into `[0, 1]` using either the global range or the
    /// range of `subband`. A degenerate range maps everything to 0.
    pub fn normalise(&self, raw: f32, subband: usize, per_subband: bool) -> f32 {
        let (min, max) = if per_subband {
            self.subbands[subband]
        } else {
            (self.min, self.max)
        };
        if max > min {
            (raw - min) / (max - min)
        } else {
            0.0
        }
    }
}
