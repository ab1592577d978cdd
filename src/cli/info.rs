// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{display_warnings, InfoPrinter, InputArgs, ARG_FILE_HELP};
use crate::{provider::DataProvider, RfiscopeError};

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct InfoArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "data")]
    #[serde(default)]
    pub(super) data_args: InputArgs,
}

impl InfoArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    pub(super) fn merge(self) -> Result<InfoArgs, RfiscopeError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let InfoArgs {
                args_file: _,
                data_args,
            } = unpack_arg_file!(arg_file);

            Ok(InfoArgs {
                args_file: None,
                data_args: cli_args.data_args.merge(data_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), RfiscopeError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.data_args.parse("Inspecting")?;
        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let provider = params.read()?;
        let min_max = provider.min_max();
        let mut printer = InfoPrinter::new(format!("{} contents", provider.file_name()).into());
        printer.push_line(format!("Kind: {}", provider.kind()).into());
        printer.push_block(vec![
            format!("Times: {}", provider.nr_times()).into(),
            format!(
                "Frequencies: {} ({} subbands x {} channels)",
                provider.nr_freqs(),
                provider.nr_subbands(),
                provider.nr_channels()
            )
            .into(),
            format!("Polarisations: {}", provider.nr_polarisations()).into(),
        ]);
        printer.push_line(
            format!(
                "Unflagged values range from {} to {}",
                min_max.min, min_max.max
            )
            .into(),
        );
        printer.display();
        Ok(())
    }
}
