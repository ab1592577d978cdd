// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The scale-invariant rank (SIR) operator.
//!
//! An unflagged sample is flagged if it sits inside a window that starts and
//! ends with a flagged sample and in which at most a fraction η of the samples
//! are unflagged. Short gaps between flagged runs are therefore closed, with
//! "short" measured relative to the extent of the surrounding flags. With the
//! default η = 0.4, at least 60% of such a window must already be flagged.
//!
//! Form each sample's weight `w = η` if flagged and `w = η - 1` otherwise. A
//! window satisfies the condition exactly when its weights sum to at least
//! zero, so using prefix sums `P`, sample `y` is flagged when
//! `max(P[b + 1]) - min(P[a]) >= 0` over flagged `a <= y <= b`. Both extrema are
//! running scans, so a pass is linear in the series length.

use log::trace;

/// Apply the SIR operator to `flags` in place. Closing gaps can create larger
/// flagged runs that in turn close further gaps; passes are repeated until
/// nothing changes, so applying this to its own output adds nothing.
///
/// `eta` should be in (0, 1); see [`crate::constants::DEFAULT_SIR_VALUE`].
pub fn sir_operator(flags: &mut [bool], eta: f32) {
    let mut num_passes = 1;
    while sir_pass(flags, eta) {
        num_passes += 1;
    }
    trace!("SIR operator converged after {num_passes} passes");
}

/// A single SIR pass. Returns whether anything new was flagged.
fn sir_pass(flags: &mut [bool], eta: f32) -> bool {
    let n = flags.len();
    if n < 3 {
        return false;
    }
    let eta = f64::from(eta);

    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0_f64);
    for &flagged in flags.iter() {
        let w = if flagged { eta } else { eta - 1.0 };
        prefix.push(prefix[prefix.len() - 1] + w);
    }

    // The smallest prefix sum at a flagged window start at or before each
    // sample.
    let mut left_min = vec![f64::INFINITY; n];
    let mut running = f64::INFINITY;
    for (i, &flagged) in flags.iter().enumerate() {
        if flagged {
            running = running.min(prefix[i]);
        }
        left_min[i] = running;
    }

    // The largest prefix sum after a flagged window end at or after each
    // sample.
    let mut right_max = vec![f64::NEG_INFINITY; n];
    let mut running = f64::NEG_INFINITY;
    for i in (0..n).rev() {
        if flags[i] {
            running = running.max(prefix[i + 1]);
        }
        right_max[i] = running;
    }

    let mut changed = false;
    for (i, flag) in flags.iter_mut().enumerate() {
        if !*flag && right_max[i] - left_min[i] >= 0.0 {
            *flag = true;
            changed = true;
        }
    }
    changed
}
