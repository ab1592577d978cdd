// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with flagging.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlagError {
    /// The series and its flags disagree on their length. This is a caller
    /// bug; nothing is truncated to make them fit.
    #[error("Got {samples} samples but {flags} flags; these must be equal")]
    LengthMismatch { samples: usize, flags: usize },

    #[error("Got samples without any polarisations")]
    NoPolarisations,

    #[error("The SIR value must be between 0 and 1 exclusive, but got {0}")]
    InvalidSirValue(f32),

    #[error("The flagger sensitivity must be positive and finite, but got {0}")]
    InvalidSensitivity(f32),
}
