// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line interface code. More specific options for `rfiscope`
//! subcommands are contained in modules.
//!
//! All booleans must have `#[serde(default)]` annotated, and anything that
//! isn't a boolean must be optional. This allows all arguments to be optional
//! *and* usable in an arguments file.
//!
//! Only 3 things should be public in this module: `Rfiscope`,
//! `Rfiscope::run`, and `RfiscopeError`.

#[macro_use]
mod common;
mod error;
mod flag;
mod fold;
mod info;

pub use error::RfiscopeError;

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use clap::{AppSettings, Args, Parser, Subcommand};
use log::{debug, info, LevelFilter};
use serde::Serialize;

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    about = "RFI flagging and pulsar-search conditioning for radio-telescope dynamic spectra"
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_subcommands = true)]
#[clap(propagate_version = true)]
#[clap(infer_long_args = true)]
pub struct Rfiscope {
    #[clap(flatten)]
    global_opts: GlobalArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    #[clap(global = true)]
    verbosity: u8,

    /// Only verify that arguments were correctly ingested and print out
    /// high-level information.
    #[clap(long)]
    #[clap(global = true)]
    dry_run: bool,

    /// Save the input arguments into a new TOML file that can be used to
    /// reproduce this run.
    #[clap(long)]
    #[clap(global = true)]
    save_toml: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
#[clap(arg_required_else_help = true)]
enum Command {
    #[clap(about = "Print what a raw data file contains.")]
    Info(info::InfoArgs),

    #[clap(about = "Flag RFI in a raw data file and report how much was flagged.")]
    Flag(flag::FlagArgs),

    #[clap(alias = "fold-pulsar")]
    #[clap(
        about = "Flag, optionally dedisperse, and fold a raw data file on a pulsar period."
    )]
    Fold(fold::FoldArgs),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Info(_) => "info",
            Command::Flag(_) => "flag",
            Command::Fold(_) => "fold",
        }
    }
}

impl Rfiscope {
    pub fn run(self) -> Result<(), RfiscopeError> {
        let GlobalArgs {
            verbosity,
            dry_run,
            save_toml,
        } = self.global_opts;
        setup_logging(verbosity)
            .map_err(|e| RfiscopeError::Generic(format!("Failed to initialise logging: {e}")))?;

        let sub_command = self.command.name();
        info!("rfiscope {sub_command} {}", env!("CARGO_PKG_VERSION"));
        display_build_info();

        // Arguments are merged with any arguments file before they're saved,
        // so the saved file alone reproduces the run.
        match self.command {
            Command::Info(args) => {
                let args = args.merge()?;
                write_toml(save_toml.as_deref(), &args)?;
                args.run(dry_run)?;
            }
            Command::Flag(args) => {
                let args = args.merge()?;
                write_toml(save_toml.as_deref(), &args)?;
                args.run(dry_run)?;
            }
            Command::Fold(args) => {
                let args = args.merge()?;
                write_toml(save_toml.as_deref(), &args)?;
                args.run(dry_run)?;
            }
        }

        info!("rfiscope {sub_command} complete.");
        Ok(())
    }
}

fn write_toml<T: Serialize>(path: Option<&Path>, args: &T) -> Result<(), RfiscopeError> {
    if let Some(path) = path {
        let toml_str = toml::to_string(args)?;
        let mut f = BufWriter::new(File::create(path)?);
        f.write_all(toml_str.as_bytes())?;
        f.flush()?;
        debug!("Saved arguments to {}", path.display());
    }
    Ok(())
}

fn level_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Activate a logger on `stdout`. From verbosity 3, every message is prefixed
/// with a timestamp and the source line that emitted it.
fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder
        .target(env_logger::Target::Stdout)
        .format_target(false)
        .filter_level(level_filter(verbosity));
    if verbosity >= 3 {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp(),
                record.level(),
                record.target(),
                record.line().unwrap_or(0),
                record.args()
            )
        });
    }
    builder.try_init()
}

/// Log how this executable was compiled.
fn display_build_info() {
    let commit = match (GIT_COMMIT_HASH_SHORT, GIT_DIRTY) {
        (Some(hash), Some(true)) => format!("{hash} (dirty)"),
        (Some(hash), _) => hash.to_string(),
        (None, _) => "<no git info>".to_string(),
    };
    info!("Compiled on git commit hash: {commit}");
    if let Some(head_ref) = GIT_HEAD_REF {
        info!("            git head ref: {head_ref}");
    }
    info!("            {BUILT_TIME_UTC}");
    info!("         with compiler {RUSTC_VERSION}");
    info!("");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_filter(0), LevelFilter::Info);
        assert_eq!(level_filter(1), LevelFilter::Debug);
        assert_eq!(level_filter(2), LevelFilter::Trace);
        assert_eq!(level_filter(5), LevelFilter::Trace);
    }

    #[test]
    fn test_write_toml() {
        let tmp_dir = tempfile::TempDir::new().unwrap();
        let path = tmp_dir.path().join("args.toml");
        let args = fold::FoldArgs {
            period: Some(0.5),
            bins: Some(10),
            ..Default::default()
        };
        write_toml(Some(&path), &args).unwrap();
        let saved: fold::FoldArgs =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.period, Some(0.5));
        assert_eq!(saved.bins, Some(10));
        assert!(!saved.no_flagging);

        // Nothing is written without a path.
        write_toml(None, &args).unwrap();
        assert_eq!(std::fs::read_dir(tmp_dir.path()).unwrap().count(), 1);
    }
}
