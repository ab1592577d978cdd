// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Common arguments for command-line interfaces. Every `rfiscope` subcommand
//! reads a raw data file, and most of them flag it, so the input and flagging
//! arguments are shared between them.

mod printers;

pub(super) use printers::InfoPrinter;
pub(crate) use printers::{display_warnings, Warn};

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use super::RfiscopeError;
use crate::{
    constants::{DEFAULT_SENSITIVITY, DEFAULT_SIR_VALUE},
    flagging::FLAGGER_TYPES_COMMA_SEPARATED,
    io::read::{DataFormat, RawReader, ReadParams, DATA_FORMATS_COMMA_SEPARATED},
    provider::{DataProvider, GridDataProvider},
    pulsar::Observation,
};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    static ref DATA_FORMAT_HELP: String =
        format!("The format of the raw data file. Supported formats: {}", *DATA_FORMATS_COMMA_SEPARATED);

    static ref FLAGGER_HELP: String =
        format!("The flagger to use. If not specified, the default for the kind of data is used. Supported flaggers: {}", *FLAGGER_TYPES_COMMA_SEPARATED);

    static ref SENSITIVITY_HELP: String =
        format!("Scales all flagging thresholds; higher values flag less. Default: {DEFAULT_SENSITIVITY}");

    static ref SIR_VALUE_HELP: String =
        format!("The aggressiveness of the SIR operator, between 0 and 1 (exclusive). Default: {DEFAULT_SIR_VALUE}");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(RfiscopeError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(RfiscopeError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(RfiscopeError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

/// Arguments describing the raw data to read.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct InputArgs {
    /// Path to the raw data file.
    #[clap(short = 'd', long = "data", parse(from_os_str), help_heading = "INPUT DATA")]
    pub(super) file: Option<PathBuf>,

    #[clap(short, long, help = DATA_FORMAT_HELP.as_str(), help_heading = "INPUT DATA")]
    pub(super) format: Option<String>,

    /// The number of subbands stored in each block.
    #[clap(long, help_heading = "INPUT DATA")]
    pub(super) subbands: Option<usize>,

    /// The number of channels per subband.
    #[clap(long, help_heading = "INPUT DATA")]
    pub(super) channels: Option<usize>,

    /// The number of raw time samples in each block (i.e. per second).
    #[clap(long, help_heading = "INPUT DATA")]
    pub(super) samples_per_block: Option<usize>,

    /// The number of raw time samples to sum into one sample. Default: 1
    #[clap(short, long, help_heading = "INPUT DATA")]
    pub(super) integration_factor: Option<usize>,

    /// Stop reading at the first block with a larger sequence number.
    #[clap(long, help_heading = "INPUT DATA")]
    pub(super) max_sequence_nr: Option<u32>,

    /// Only read the first this-many subbands.
    #[clap(long, help_heading = "INPUT DATA")]
    pub(super) max_subbands: Option<usize>,

    /// The frequency of the first channel of the first subband [MHz]. Only
    /// needed for dedispersion.
    #[clap(long, help_heading = "INPUT DATA")]
    pub(super) low_freq: Option<f64>,

    /// The frequency difference between consecutive channels [MHz]. Only
    /// needed for dedispersion.
    #[clap(long, help_heading = "INPUT DATA")]
    pub(super) freq_step: Option<f64>,
}

impl InputArgs {
    /// Merge two sets of arguments, preferring `self` (the CLI arguments).
    pub(super) fn merge(self, other: InputArgs) -> InputArgs {
        InputArgs {
            file: self.file.or(other.file),
            format: self.format.or(other.format),
            subbands: self.subbands.or(other.subbands),
            channels: self.channels.or(other.channels),
            samples_per_block: self.samples_per_block.or(other.samples_per_block),
            integration_factor: self.integration_factor.or(other.integration_factor),
            max_sequence_nr: self.max_sequence_nr.or(other.max_sequence_nr),
            max_subbands: self.max_subbands.or(other.max_subbands),
            low_freq: self.low_freq.or(other.low_freq),
            freq_step: self.freq_step.or(other.freq_step),
        }
    }

    /// Make sense of the input arguments. `operation` is used in messages,
    /// e.g. "Flagging".
    pub(super) fn parse(self, operation: &str) -> Result<InputParams, RfiscopeError> {
        let InputArgs {
            file,
            format,
            subbands,
            channels,
            samples_per_block,
            integration_factor,
            max_sequence_nr,
            max_subbands,
            low_freq,
            freq_step,
        } = self;

        let file = file.ok_or(InputArgsError::NoInputData)?;
        let format = format.ok_or(InputArgsError::NoFormat)?;
        let format = DataFormat::from_str(&format)
            .map_err(|_| InputArgsError::UnknownFormat { got: format })?;
        let params = ReadParams {
            nr_subbands: subbands.ok_or(InputArgsError::Missing("--subbands"))?,
            nr_channels: channels.ok_or(InputArgsError::Missing("--channels"))?,
            samples_per_block: samples_per_block
                .ok_or(InputArgsError::Missing("--samples-per-block"))?,
            integration_factor: integration_factor.unwrap_or(1),
            max_sequence_nr,
            max_subbands,
        };
        if let Some(m) = max_subbands {
            if m > params.nr_subbands {
                format!(
                    "More subbands were requested ({m}) than are in the data ({}); using all of them",
                    params.nr_subbands
                )
                .warn();
            }
        }
        let reader = RawReader::new(format, params)?;

        let mut printer = InfoPrinter::new(format!("{operation} {format} data").into());
        printer.push_line(format!("File: {}", file.display()).into());
        let params = reader.params();
        let layout = reader.layout();
        printer.push_block(vec![
            format!(
                "{} subbands of {} channels, {} polarisation(s)",
                params.kept_subbands(),
                params.nr_channels,
                layout.nr_polarisations
            )
            .into(),
            format!(
                "{} samples per block, integrated by {} ({} samples per second)",
                params.samples_per_block,
                params.integration_factor,
                params.samples_per_second()
            )
            .into(),
        ]);
        if let Some(max) = params.max_sequence_nr {
            printer.push_line(format!("Stopping after sequence number {max}").into());
        }
        printer.display();

        Ok(InputParams {
            file,
            reader,
            low_freq_mhz: low_freq,
            freq_step_mhz: freq_step,
        })
    }
}

/// Parsed input arguments, ready to read.
#[derive(Debug)]
pub(super) struct InputParams {
    pub(super) file: PathBuf,
    pub(super) reader: RawReader,
    pub(super) low_freq_mhz: Option<f64>,
    pub(super) freq_step_mhz: Option<f64>,
}

impl InputParams {
    pub(super) fn has_frequencies(&self) -> bool {
        self.low_freq_mhz.is_some() && self.freq_step_mhz.is_some()
    }

    /// Read the data file and wrap it in a provider.
    pub(super) fn read(&self) -> Result<GridDataProvider, RfiscopeError> {
        let ingested = self.reader.read_file(&self.file)?;

        let mut printer = InfoPrinter::new("Ingested".into());
        let report = &ingested.report;
        let mut block = vec![format!("{} blocks read", report.blocks_read).into()];
        if let (Some(first), Some(last)) = (report.first_sequence_nr, report.last_sequence_nr) {
            block.push(format!("Sequence numbers {first} to {last}").into());
        }
        if report.truncated {
            block.push("The last block was truncated".into());
        }
        printer.push_block(block);
        printer.push_line(
            format!(
                "{} times x {} frequencies; {:.2}% flagged on input",
                ingested.nr_times(),
                ingested.nr_subbands() * ingested.nr_channels(),
                100.0 * ingested.initial_flagged.occupancy()
            )
            .into(),
        );
        printer.display();

        let observation = Observation {
            low_freq_mhz: self.low_freq_mhz.unwrap_or(0.0),
            freq_step_mhz: self.freq_step_mhz.unwrap_or(0.0),
            samples_per_second: ingested.samples_per_second as f64,
        };
        Ok(GridDataProvider::new(ingested, observation))
    }
}

/// Arguments controlling the flagger.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct FlaggingArgs {
    #[clap(long, help = FLAGGER_HELP.as_str(), help_heading = "FLAGGING")]
    pub(super) flagger: Option<String>,

    #[clap(long, help = SENSITIVITY_HELP.as_str(), help_heading = "FLAGGING")]
    pub(super) sensitivity: Option<f32>,

    #[clap(long, help = SIR_VALUE_HELP.as_str(), help_heading = "FLAGGING")]
    pub(super) sir_value: Option<f32>,
}

impl FlaggingArgs {
    pub(super) fn merge(self, other: FlaggingArgs) -> FlaggingArgs {
        FlaggingArgs {
            flagger: self.flagger.or(other.flagger),
            sensitivity: self.sensitivity.or(other.sensitivity),
            sir_value: self.sir_value.or(other.sir_value),
        }
    }

    /// Configure the flagger of `provider`.
    pub(super) fn apply(&self, provider: &mut GridDataProvider) -> Result<(), RfiscopeError> {
        if let Some(flagger) = self.flagger.as_deref() {
            provider.set_flagger(flagger)?;
        }
        if let Some(sensitivity) = self.sensitivity {
            provider.set_flagger_sensitivity(sensitivity)?;
        }
        if let Some(sir_value) = self.sir_value {
            provider.set_sir_value(sir_value)?;
        }
        debug!(
            "Flagger {} with {:?}",
            provider.flagger(),
            provider.flagger_params()
        );
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub(super) enum InputArgsError {
    #[error("No input data file was specified")]
    NoInputData,

    #[error("No data format was specified. Supported formats: {}", *DATA_FORMATS_COMMA_SEPARATED)]
    NoFormat,

    #[error("Unknown data format '{got}'. Supported formats: {}", *DATA_FORMATS_COMMA_SEPARATED)]
    UnknownFormat { got: String },

    #[error("The data dimensions are incomplete; {0} must be specified")]
    Missing(&'static str),
}
