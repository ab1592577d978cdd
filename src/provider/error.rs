// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::{flagging::FlagError, io::read::DataKind, pulsar::PulsarError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Unknown flagger '{name}'; valid flaggers are: {valid}")]
    UnknownFlagger { name: String, valid: String },

    #[error("The '{flagger}' flagger can't be used on {kind} data")]
    UnsupportedFlagger { flagger: String, kind: DataKind },

    #[error("Polarisation {pol} was requested, but the data only has {num_pols}")]
    BadPolarisation { pol: usize, num_pols: usize },

    #[error("Sample (time {time}, frequency {freq}) is outside the data ({num_times} times, {num_freqs} frequencies)")]
    OutOfRange {
        time: usize,
        freq: usize,
        num_times: usize,
        num_freqs: usize,
    },

    #[error(transparent)]
    Flag(#[from] FlagError),

    #[error(transparent)]
    Pulsar(#[from] PulsarError),
}
