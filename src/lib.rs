// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
RFI flagging and pulsar-search conditioning for radio-telescope dynamic
spectra.

Raw telescope data is read into a [`SampleGrid`] (`[time][subband][channel]
[polarisation]`) with a [`FlagMask`] of samples known to be bad. A
[`DataProvider`] then flags interference with one of the [`FlaggerType`]s,
serves normalised values for display, and can dedisperse and fold the data
for pulsar searches.
 */

pub mod constants;
pub mod flagging;
pub mod grid;
pub mod io;
pub mod math;
pub mod provider;
pub mod pulsar;

mod cli;

// Re-exports.
pub use cli::{Rfiscope, RfiscopeError};
pub use flagging::{FlagError, Flagger, FlaggerParams, FlaggerType};
pub use grid::{FlagMask, MinMaxVals, SampleGrid};
pub use io::read::{DataFormat, DataKind, RawReader, ReadParams};
pub use math::RobustStatistics;
pub use provider::{DataProvider, GridDataProvider, ProviderError};
pub use pulsar::{FoldedProfile, Observation};
