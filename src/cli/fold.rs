// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::{
    common::{
        display_warnings, FlaggingArgs, InfoPrinter, InputArgs, InputParams, Warn, ARG_FILE_HELP,
    },
    flag::print_occupancy,
};
use crate::{provider::DataProvider, RfiscopeError};

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct FoldArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// The rotational period of the pulsar [seconds].
    #[clap(short, long, help_heading = "FOLDING")]
    pub(super) period: Option<f64>,

    /// Dedisperse the data at this dispersion measure [pc cm^-3] before
    /// folding. Requires --low-freq and --freq-step.
    #[clap(long, help_heading = "FOLDING")]
    pub(super) dm: Option<f64>,

    /// The number of phase bins in the profile. The default is one bin per
    /// sample in a period.
    #[clap(short, long, help_heading = "FOLDING")]
    pub(super) bins: Option<usize>,

    /// Don't flag the data before folding; only the flags that came with the
    /// data are used.
    #[clap(long, help_heading = "FOLDING")]
    #[serde(default)]
    pub(super) no_flagging: bool,

    #[clap(flatten)]
    #[serde(rename = "data")]
    #[serde(default)]
    pub(super) data_args: InputArgs,

    #[clap(flatten)]
    #[serde(rename = "flagging")]
    #[serde(default)]
    pub(super) flagging_args: FlaggingArgs,
}

/// Validated fold arguments.
#[derive(Debug)]
struct FoldParams {
    input: InputParams,
    flagging_args: FlaggingArgs,
    period: f64,
    dm: Option<f64>,
    bins: Option<usize>,
    no_flagging: bool,
}

impl FoldArgs {
    pub(super) fn merge(self) -> Result<FoldArgs, RfiscopeError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let FoldArgs {
                args_file: _,
                data_args,
                flagging_args,
                period,
                dm,
                bins,
                no_flagging,
            } = unpack_arg_file!(arg_file);

            Ok(FoldArgs {
                args_file: None,
                data_args: cli_args.data_args.merge(data_args),
                flagging_args: cli_args.flagging_args.merge(flagging_args),
                period: cli_args.period.or(period),
                dm: cli_args.dm.or(dm),
                bins: cli_args.bins.or(bins),
                no_flagging: cli_args.no_flagging || no_flagging,
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<FoldParams, RfiscopeError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            data_args,
            flagging_args,
            period,
            dm,
            bins,
            no_flagging,
        } = self;

        let period = period.ok_or(FoldArgsError::NoPeriod)?;
        let input = data_args.parse("Folding")?;
        if dm.is_some() && !input.has_frequencies() {
            return Err(FoldArgsError::NoFrequencies.into());
        }
        if no_flagging && flagging_args.flagger.is_some() {
            "A flagger was specified, but flagging is disabled; ignoring the flagger".warn();
        }

        let mut printer = InfoPrinter::new("Folding".into());
        printer.push_line(format!("Period: {period} s").into());
        if let Some(dm) = dm {
            printer.push_line(format!("Dedispersing at DM {dm} pc cm^-3").into());
        }
        if let Some(bins) = bins {
            printer.push_line(format!("{bins} phase bins").into());
        }
        printer.display();
        display_warnings();

        Ok(FoldParams {
            input,
            flagging_args,
            period,
            dm,
            bins,
            no_flagging,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), RfiscopeError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()
    }
}

impl FoldParams {
    fn run(self) -> Result<(), RfiscopeError> {
        let mut provider = self.input.read()?;
        if self.no_flagging {
            provider.set_flagger("none")?;
        } else {
            self.flagging_args.apply(&mut provider)?;
        }
        provider.flag()?;
        print_occupancy(&provider);

        if let Some(dm) = self.dm {
            provider.dedisperse(dm)?;
        }
        let profile = provider.fold(self.period, self.bins)?;

        let mut printer = InfoPrinter::new(
            format!("Profile of {} folded on {} s", provider.file_name(), self.period).into(),
        );
        printer.push_block(
            profile
                .values
                .iter()
                .zip(&profile.counts)
                .enumerate()
                .map(|(i_bin, (value, count))| {
                    format!("bin {i_bin:>4}: {value:>12.5} ({count} samples)").into()
                })
                .collect(),
        );
        match profile.peak_bin() {
            Some(peak) => printer.push_line(format!("Peak bin: {peak}").into()),
            None => printer.push_line("Every sample is flagged; no peak".into()),
        }
        printer.display();
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub(super) enum FoldArgsError {
    #[error("No pulsar period was specified")]
    NoPeriod,

    #[error("Dedispersion needs the channel frequencies; specify --low-freq and --freq-step")]
    NoFrequencies,
}
