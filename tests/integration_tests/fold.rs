// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests against the "fold" subcommand.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{get_cmd_output, rfiscope, BeamFormedFile};

const PULSAR: BeamFormedFile = BeamFormedFile {
    blocks: 8,
    subbands: 1,
    channels: 4,
    samples_per_block: 10,
};

/// A pulse every 5 samples (0.5 s), 2 samples after the start of each period.
fn write_pulsar_file(dir: &Path) -> PathBuf {
    PULSAR.write(dir, |t, _, _| if t % 5 == 2 { 5.0 } else { 1.0 })
}

#[test]
fn test_fold_finds_the_pulse() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let file = write_pulsar_file(tmp_dir.path());

    for extra in [vec![], vec!["--no-flagging"], vec!["--bins", "10"]] {
        let cmd = rfiscope()
            .arg("fold")
            .args(PULSAR.args(&file))
            .args(["--period", "0.5"])
            .args(&extra)
            .ok();
        assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
        let (stdout, _) = get_cmd_output(cmd);
        let expected = if extra.is_empty() || extra[0] == "--no-flagging" {
            "Peak bin: 2"
        } else {
            "Peak bin: 4"
        };
        assert!(stdout.contains(expected), "{extra:?}\n{stdout}");
    }
}

#[test]
fn test_fold_with_zero_dm() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let file = write_pulsar_file(tmp_dir.path());
    let cmd = rfiscope()
        .arg("fold")
        .args(PULSAR.args(&file))
        .args(["--period", "0.5", "--dm", "0"])
        .args(["--low-freq", "100", "--freq-step", "10"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Dedispersing at DM 0"), "{stdout}");
    assert!(stdout.contains("Peak bin: 2"), "{stdout}");
}

#[test]
fn test_fold_argument_errors() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let file = write_pulsar_file(tmp_dir.path());

    let cmd = rfiscope().arg("fold").args(PULSAR.args(&file)).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("No pulsar period"), "{stderr}");

    let cmd = rfiscope()
        .arg("fold")
        .args(PULSAR.args(&file))
        .args(["--period", "0.5", "--dm", "10"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("--low-freq"), "{stderr}");

    let cmd = rfiscope()
        .arg("fold")
        .args(PULSAR.args(&file))
        .arg("--period=-0.5")
        .ok();
    assert!(cmd.is_err());

    let cmd = rfiscope()
        .arg("fold")
        .args(PULSAR.args(&file))
        .args(["--period", "inf"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("positive and finite"), "{stderr}");

    let cmd = rfiscope()
        .arg("fold")
        .args(PULSAR.args(&file))
        .args(["--period", "1000"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("longer than the data"), "{stderr}");
}

#[test]
fn test_dry_run_doesnt_read_the_data() {
    let cmd = rfiscope()
        .arg("fold")
        .args(PULSAR.args(Path::new("/does/not/exist.raw")))
        .args(["--period", "0.5", "--dry-run"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Dry run"), "{stdout}");
}
