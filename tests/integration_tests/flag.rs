// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests against the "info" and "flag" subcommands.

use tempfile::TempDir;

use crate::{get_cmd_output, rfiscope, write_noisy_file, NOISY};

#[test]
fn test_info() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let file = write_noisy_file(tmp_dir.path());
    let cmd = rfiscope().arg("info").args(NOISY.args(&file)).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("4 blocks read"), "{stdout}");
    assert!(stdout.contains("Sequence numbers 0 to 3"), "{stdout}");
    assert!(stdout.contains("Times: 16"), "{stdout}");
    assert!(
        stdout.contains("Frequencies: 64 (2 subbands x 32 channels)"),
        "{stdout}"
    );
    assert!(stdout.contains("Kind: beam-formed"), "{stdout}");
}

#[test]
fn test_flag_finds_the_loud_sample() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let file = write_noisy_file(tmp_dir.path());

    let cmd = rfiscope()
        .arg("flag")
        .args(NOISY.args(&file))
        .args(["--flagger", "none"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("0.00% flagged in total"), "{stdout}");

    let cmd = rfiscope().arg("flag").args(NOISY.args(&file)).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(
        stdout.contains("Flagged with the beam-formed flagger"),
        "{stdout}"
    );
    assert!(!stdout.contains("0.00% flagged in total"), "{stdout}");
    // Subband 0 is only noise.
    assert!(stdout.contains("Per subband [%]: 0.00, "), "{stdout}");
}

#[test]
fn test_unsupported_flagger_is_an_error() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let file = write_noisy_file(tmp_dir.path());
    let cmd = rfiscope()
        .arg("flag")
        .args(NOISY.args(&file))
        .args(["--flagger", "post-correlation"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(
        stderr.contains("can't be used on beam-formed data"),
        "{stderr}"
    );

    let cmd = rfiscope()
        .arg("flag")
        .args(NOISY.args(&file))
        .args(["--flagger", "aoflagger"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Unknown flagger 'aoflagger'"), "{stderr}");
}

#[test]
fn test_missing_dimensions_are_an_error() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let file = write_noisy_file(tmp_dir.path());
    let cmd = rfiscope()
        .arg("flag")
        .args(["--data", &file.display().to_string(), "--format", "beam-formed"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("--subbands must be specified"), "{stderr}");
}
