// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all rfiscope-related errors. This should be the *only*
//! error enum that is publicly visible from the command line.

use thiserror::Error;

use super::{common::InputArgsError, fold::FoldArgsError};
use crate::{
    flagging::FlagError, io::read::ReadError, provider::ProviderError, pulsar::PulsarError,
};

/// The *only* publicly visible error from the `rfiscope` binary. Each message
/// carries a hint on where to look next, unless it's "generic".
#[derive(Error, Debug)]
pub enum RfiscopeError {
    /// An error related to choosing or configuring a flagger.
    #[error("{0}\n\nFlaggers and their parameters are listed by `rfiscope flag --help`.")]
    Flagging(String),

    /// An error related to dedispersion or folding.
    #[error("{0}\n\nFolding options are listed by `rfiscope fold --help`.")]
    Pulsar(String),

    /// An error related to reading raw data.
    #[error("{0}\n\nCheck that the data format and the dimensions (--subbands, --channels, --samples-per-block) match the file.")]
    Read(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files hold the same (long) names as the command-line arguments, in toml or json.")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<InputArgsError> for RfiscopeError {
    fn from(e: InputArgsError) -> Self {
        Self::Read(e.to_string())
    }
}

impl From<FoldArgsError> for RfiscopeError {
    fn from(e: FoldArgsError) -> Self {
        Self::Pulsar(e.to_string())
    }
}

impl From<FlagError> for RfiscopeError {
    fn from(e: FlagError) -> Self {
        Self::Flagging(e.to_string())
    }
}

impl From<PulsarError> for RfiscopeError {
    fn from(e: PulsarError) -> Self {
        Self::Pulsar(e.to_string())
    }
}

impl From<ReadError> for RfiscopeError {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::ZeroDimension { .. }
            | ReadError::NotMultiple { .. }
            | ReadError::Empty { .. } => Self::Read(e.to_string()),
            ReadError::IO(e) => Self::from(e),
        }
    }
}

impl From<ProviderError> for RfiscopeError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::UnknownFlagger { .. } | ProviderError::UnsupportedFlagger { .. } => {
                Self::Flagging(e.to_string())
            }
            ProviderError::BadPolarisation { .. } | ProviderError::OutOfRange { .. } => {
                Self::Generic(e.to_string())
            }
            ProviderError::Flag(e) => Self::from(e),
            ProviderError::Pulsar(e) => Self::from(e),
        }
    }
}

impl From<toml::ser::Error> for RfiscopeError {
    fn from(e: toml::ser::Error) -> Self {
        Self::ArgFile(format!("Couldn't serialise the arguments to toml: {e}"))
    }
}

impl From<std::io::Error> for RfiscopeError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
