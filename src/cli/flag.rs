// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use clap::Parser;
use itertools::Itertools;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{display_warnings, FlaggingArgs, InfoPrinter, InputArgs, ARG_FILE_HELP};
use crate::{
    provider::{DataProvider, GridDataProvider},
    RfiscopeError,
};

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct FlagArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "data")]
    #[serde(default)]
    pub(super) data_args: InputArgs,

    #[clap(flatten)]
    #[serde(rename = "flagging")]
    #[serde(default)]
    pub(super) flagging_args: FlaggingArgs,
}

impl FlagArgs {
    pub(super) fn merge(self) -> Result<FlagArgs, RfiscopeError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let FlagArgs {
                args_file: _,
                data_args,
                flagging_args,
            } = unpack_arg_file!(arg_file);

            Ok(FlagArgs {
                args_file: None,
                data_args: cli_args.data_args.merge(data_args),
                flagging_args: cli_args.flagging_args.merge(flagging_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), RfiscopeError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let Self {
            args_file: _,
            data_args,
            flagging_args,
        } = self;
        let params = data_args.parse("Flagging")?;
        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let mut provider = params.read()?;
        flagging_args.apply(&mut provider)?;
        provider.flag()?;
        print_occupancy(&provider);
        Ok(())
    }
}

/// Report how much of the data is flagged.
pub(super) fn print_occupancy(provider: &GridDataProvider) {
    let mut printer = InfoPrinter::new(
        format!(
            "Flagged with the {} flagger (sensitivity {})",
            provider.flagger(),
            provider.flagger_params().sensitivity
        )
        .into(),
    );
    printer.push_block(vec![
        format!(
            "{:.2}% flagged on input",
            100.0 * provider.initial_flags().occupancy()
        )
        .into(),
        format!("{:.2}% flagged in total", 100.0 * provider.occupancy()).into(),
    ]);
    printer.push_line(
        format!(
            "Per subband [%]: {}",
            provider
                .occupancy_per_subband()
                .iter()
                .map(|o| format!("{:.2}", 100.0 * o))
                .join(", ")
        )
        .into(),
    );
    printer.display();
    debug!(
        "{} of {} samples flagged",
        provider.flags().num_flagged(),
        provider.nr_times() * provider.nr_freqs()
    );
}
