// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read raw, big-endian data files into a [`SampleGrid`].
//!
//! All supported formats are a sequence of blocks, one per second. A block is
//! a header whose first 4 bytes are the block's (big-endian `u32`) sequence
//! number, followed by big-endian `f32` samples. The formats only differ in
//! the header size, the order of the samples within a block and the number of
//! polarisations; see [`DataFormat::layout`].
//!
//! A negative raw sample means that upstream processing has already flagged
//! it. Any output cell that such a sample contributes to is flagged and
//! zeroed.

mod error;

pub use error::ReadError;

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};
use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::grid::{FlagMask, SampleGrid};

lazy_static::lazy_static! {
    pub static ref DATA_FORMATS_COMMA_SEPARATED: String = DataFormat::iter().join(", ");
}

/// The supported raw file formats.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum DataFormat {
    /// Stokes I from the beam former.
    #[strum(serialize = "beam-formed")]
    BeamFormed,

    /// Beam-formed data after channel filtering; stored channel-major.
    #[strum(serialize = "filtered")]
    Filtered,

    /// Two polarisations from the station correlator's intermediate stage.
    #[strum(serialize = "intermediate")]
    Intermediate,

    /// The four polarisation products of a single baseline.
    #[strum(serialize = "visibility")]
    Visibility,
}

impl DataFormat {
    pub fn layout(self) -> RawLayout {
        match self {
            DataFormat::BeamFormed => RawLayout {
                header_bytes: 16,
                order: SampleOrder::SubbandTimeChannel,
                nr_polarisations: 1,
                kind: DataKind::BeamFormed,
            },
            DataFormat::Filtered => RawLayout {
                header_bytes: 8,
                order: SampleOrder::SubbandChannelTime,
                nr_polarisations: 1,
                kind: DataKind::BeamFormed,
            },
            DataFormat::Intermediate => RawLayout {
                header_bytes: 4,
                order: SampleOrder::TimeSubbandChannelPol,
                nr_polarisations: 2,
                kind: DataKind::Intermediate,
            },
            DataFormat::Visibility => RawLayout {
                header_bytes: 4,
                order: SampleOrder::TimeSubbandChannelPol,
                nr_polarisations: 4,
                kind: DataKind::Visibility,
            },
        }
    }
}

/// What the samples of a grid represent. This decides how the data can be
/// flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum DataKind {
    #[strum(serialize = "intermediate")]
    Intermediate,

    #[strum(serialize = "beam-formed")]
    BeamFormed,

    #[strum(serialize = "visibility")]
    Visibility,
}

/// The order of samples within a block, slowest-varying axis first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOrder {
    /// `[subband][time][channel]`; single polarisation.
    SubbandTimeChannel,

    /// `[subband][channel][time]`; single polarisation.
    SubbandChannelTime,

    /// `[time][subband][channel][polarisation]`.
    TimeSubbandChannelPol,
}

/// The dimensions of one block, as stored in the file.
#[derive(Debug, Clone, Copy)]
struct BlockDims {
    samples: usize,
    subbands: usize,
    channels: usize,
    pols: usize,
}

impl SampleOrder {
    /// The position of a sample within a block.
    fn raw_index(
        self,
        d: BlockDims,
        time: usize,
        subband: usize,
        chan: usize,
        pol: usize,
    ) -> usize {
        match self {
            SampleOrder::SubbandTimeChannel => {
                ((subband * d.samples + time) * d.channels + chan) * d.pols + pol
            }
            SampleOrder::SubbandChannelTime => {
                ((subband * d.channels + chan) * d.samples + time) * d.pols + pol
            }
            SampleOrder::TimeSubbandChannelPol => {
                ((time * d.subbands + subband) * d.channels + chan) * d.pols + pol
            }
        }
    }
}

/// How a format stores its blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLayout {
    /// The size of each block's header. The sequence number occupies the
    /// first 4 bytes; the rest is ignored.
    pub header_bytes: usize,
    pub order: SampleOrder,
    pub nr_polarisations: usize,
    pub kind: DataKind,
}

/// User-supplied parameters that describe the contents of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadParams {
    /// The number of subbands stored in each block.
    pub nr_subbands: usize,

    /// The number of channels per subband.
    pub nr_channels: usize,

    /// The number of raw time samples in each block (i.e. per second).
    pub samples_per_block: usize,

    /// The number of raw time samples summed into one grid sample.
    pub integration_factor: usize,

    /// Stop reading at the first block with a larger sequence number.
    pub max_sequence_nr: Option<u32>,

    /// Only keep the first this-many subbands.
    pub max_subbands: Option<usize>,
}

impl ReadParams {
    fn validate(&self) -> Result<(), ReadError> {
        for (value, what) in [
            (self.nr_subbands, "subbands"),
            (self.nr_channels, "channels"),
            (self.samples_per_block, "samples per block"),
            (self.integration_factor, "raw samples per integration"),
        ] {
            if value == 0 {
                return Err(ReadError::ZeroDimension { what });
            }
        }
        if self.max_subbands == Some(0) {
            return Err(ReadError::ZeroDimension {
                what: "subbands to keep",
            });
        }
        if self.samples_per_block % self.integration_factor != 0 {
            return Err(ReadError::NotMultiple {
                samples_per_block: self.samples_per_block,
                integration_factor: self.integration_factor,
            });
        }
        Ok(())
    }

    /// The number of grid samples per block. As a block is a second, this is
    /// also the grid's sample rate.
    pub fn samples_per_second(&self) -> usize {
        self.samples_per_block / self.integration_factor
    }

    /// The number of subbands that end up in the grid.
    pub fn kept_subbands(&self) -> usize {
        self.max_subbands
            .map_or(self.nr_subbands, |m| m.min(self.nr_subbands))
    }
}

/// What happened while reading a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadReport {
    /// The number of blocks in the grid (including a truncated last block).
    pub blocks_read: usize,
    pub first_sequence_nr: Option<u32>,
    pub last_sequence_nr: Option<u32>,

    /// Did the file end in the middle of a block?
    pub truncated: bool,
}

/// A file's contents, ready to be handed to a data provider.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub file: String,
    pub format: DataFormat,
    pub kind: DataKind,
    pub grid: SampleGrid,

    /// Cells that were flagged before we saw them.
    pub initial_flagged: FlagMask,
    pub report: ReadReport,

    /// Grid samples per second.
    pub samples_per_second: usize,
}

impl Ingested {
    pub fn nr_times(&self) -> usize {
        self.grid.nr_times()
    }

    pub fn nr_subbands(&self) -> usize {
        self.grid.nr_subbands()
    }

    pub fn nr_channels(&self) -> usize {
        self.grid.nr_channels()
    }

    pub fn nr_polarisations(&self) -> usize {
        self.grid.nr_polarisations()
    }
}

/// Reads files of a single [`DataFormat`].
#[derive(Debug, Clone)]
pub struct RawReader {
    format: DataFormat,
    layout: RawLayout,
    params: ReadParams,
}

struct RawBlock {
    sequence_nr: u32,
    samples: Vec<f32>,
}

impl RawReader {
    pub fn new(format: DataFormat, params: ReadParams) -> Result<RawReader, ReadError> {
        params.validate()?;
        Ok(RawReader {
            format,
            layout: format.layout(),
            params,
        })
    }

    pub fn format(&self) -> DataFormat {
        self.format
    }

    pub fn layout(&self) -> &RawLayout {
        &self.layout
    }

    pub fn params(&self) -> &ReadParams {
        &self.params
    }

    fn block_dims(&self) -> BlockDims {
        BlockDims {
            samples: self.params.samples_per_block,
            subbands: self.params.nr_subbands,
            channels: self.params.nr_channels,
            pols: self.layout.nr_polarisations,
        }
    }

    pub fn read_file(&self, file: &Path) -> Result<Ingested, ReadError> {
        let file_str = file.display().to_string();
        info!("Reading {} data from {file_str}", self.format);
        let reader = BufReader::new(File::open(file)?);
        self.read(reader, file_str)
    }

    /// Read everything from `reader`. `name` identifies the source in
    /// messages.
    pub fn read<R: Read>(&self, mut reader: R, name: String) -> Result<Ingested, ReadError> {
        let (blocks, truncated) = self.read_blocks(&mut reader, &name)?;
        if blocks.is_empty() {
            return Err(ReadError::Empty { file: name });
        }

        let report = ReadReport {
            blocks_read: blocks.len(),
            first_sequence_nr: blocks.first().map(|b| b.sequence_nr),
            last_sequence_nr: blocks.last().map(|b| b.sequence_nr),
            truncated,
        };
        let (grid, initial_flagged) = self.integrate(&blocks);
        debug!(
            "{name}: {} blocks, {} times x {} subbands x {} channels x {} polarisations, {} cells flagged upstream",
            report.blocks_read,
            grid.nr_times(),
            grid.nr_subbands(),
            grid.nr_channels(),
            grid.nr_polarisations(),
            initial_flagged.num_flagged()
        );

        Ok(Ingested {
            file: name,
            format: self.format,
            kind: self.layout.kind,
            grid,
            initial_flagged,
            report,
            samples_per_second: self.params.samples_per_second(),
        })
    }

    fn read_blocks<R: Read>(
        &self,
        reader: &mut R,
        name: &str,
    ) -> Result<(Vec<RawBlock>, bool), ReadError> {
        let d = self.block_dims();
        let num_samples = d.samples * d.subbands * d.channels * d.pols;
        let mut header = vec![0; self.layout.header_bytes.max(4)];
        let mut bytes = vec![0; num_samples * 4];
        let mut blocks = vec![];

        loop {
            let n = read_fully(reader, &mut header)?;
            if n == 0 {
                return Ok((blocks, false));
            }
            if n < header.len() {
                warn!("{name} ends inside the header of block {}", blocks.len());
                return Ok((blocks, true));
            }
            let sequence_nr = BigEndian::read_u32(&header[..4]);
            if let Some(max) = self.params.max_sequence_nr {
                if sequence_nr > max {
                    debug!("Stopping at sequence number {sequence_nr} (maximum is {max})");
                    return Ok((blocks, false));
                }
            }

            let n = read_fully(reader, &mut bytes)?;
            // Whatever wasn't read, including a partial last sample, stays
            // zero and so unflagged.
            bytes[n / 4 * 4..].fill(0);
            let mut samples = vec![0.0; num_samples];
            BigEndian::read_f32_into(&bytes, &mut samples);
            blocks.push(RawBlock {
                sequence_nr,
                samples,
            });
            if n < bytes.len() {
                warn!(
                    "{name} ends inside block {} (sequence number {sequence_nr}); only {} of {} samples were read",
                    blocks.len() - 1,
                    n / 4,
                    num_samples
                );
                return Ok((blocks, true));
            }
        }
    }

    /// Sum raw samples into grid cells, flagging cells with sentinels.
    fn integrate(&self, blocks: &[RawBlock]) -> (SampleGrid, FlagMask) {
        let d = self.block_dims();
        let integration_factor = self.params.integration_factor;
        let times_per_block = self.params.samples_per_second();
        let nr_subbands = self.params.kept_subbands();

        let nr_times = blocks.len() * times_per_block;
        let mut grid = SampleGrid::zeros(nr_times, nr_subbands, d.channels, d.pols);
        let mut flags = FlagMask::new(nr_times, nr_subbands, d.channels);

        for (i_block, block) in blocks.iter().enumerate() {
            for raw_time in 0..d.samples {
                let i_time = i_block * times_per_block + raw_time / integration_factor;
                for i_subband in 0..nr_subbands {
                    for i_chan in 0..d.channels {
                        for i_pol in 0..d.pols {
                            let raw = block.samples[self.layout.order.raw_index(
                                d, raw_time, i_subband, i_chan, i_pol,
                            )];
                            if raw < 0.0 {
                                flags.set(i_time, i_subband, i_chan);
                            } else {
                                grid.data[(i_time, i_subband, i_chan, i_pol)] += raw;
                            }
                        }
                    }
                }
            }
        }

        grid.zero_flagged(&flags);
        (grid, flags)
    }
}

/// Like [`Read::read_exact`], but a short read isn't an error; the number of
/// bytes read is returned instead.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}
