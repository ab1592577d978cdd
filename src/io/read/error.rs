// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from reading raw data files.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("The number of {what} must be at least 1")]
    ZeroDimension { what: &'static str },

    #[error("{samples_per_block} samples per block is not a multiple of the integration factor {integration_factor}")]
    NotMultiple {
        samples_per_block: usize,
        integration_factor: usize,
    },

    #[error("'{file}' doesn't contain any complete block headers")]
    Empty { file: String },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
