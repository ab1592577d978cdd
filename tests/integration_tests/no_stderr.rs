// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests to ensure there is no stderr output for successful commands.

use tempfile::TempDir;

use crate::{get_cmd_output, rfiscope, write_noisy_file, NOISY};

#[test]
fn test_flag_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let file = write_noisy_file(tmp_dir.path());

    #[rustfmt::skip]
    let cmd = rfiscope()
        .arg("flag")
        .args(NOISY.args(&file))
        .args(["--sensitivity", "1.5", "--sir-value", "0.3", "-vv"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}

#[test]
fn test_info_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let file = write_noisy_file(tmp_dir.path());

    let cmd = rfiscope().arg("info").args(NOISY.args(&file)).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}
