// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests against toml and json argument files.

use std::fs;

use indoc::formatdoc;
use tempfile::tempdir;

use crate::{get_cmd_output, rfiscope, write_noisy_file, NOISY};

#[test]
fn test_saved_toml_reproduces_a_run() {
    let temp_dir = tempdir().expect("Couldn't make tempdir");
    let file = write_noisy_file(temp_dir.path());
    let toml = temp_dir.path().join("flag.toml");

    let cmd = rfiscope()
        .arg("flag")
        .args(NOISY.args(&file))
        .args(["--flagger", "none", "--dry-run", "--save-toml"])
        .arg(toml.display().to_string())
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let contents = fs::read_to_string(&toml).unwrap();
    assert!(contents.contains("format = \"beam-formed\""), "{contents}");
    assert!(contents.contains("flagger = \"none\""), "{contents}");

    let cmd = rfiscope().arg("flag").arg(toml.display().to_string()).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("0.00% flagged in total"), "{stdout}");

    // CLI arguments take precedence over the file.
    let cmd = rfiscope()
        .arg("flag")
        .arg(toml.display().to_string())
        .args(["--flagger", "beam-formed"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(!stdout.contains("0.00% flagged in total"), "{stdout}");
}

#[test]
fn test_json_arg_file() {
    let temp_dir = tempdir().expect("Couldn't make tempdir");
    let file = write_noisy_file(temp_dir.path());
    let json = temp_dir.path().join("info.json");
    fs::write(
        &json,
        formatdoc! {r#"
            {{
                "data": {{
                    "file": "{}",
                    "format": "beam-formed",
                    "subbands": 2,
                    "channels": 32,
                    "samples_per_block": 4
                }}
            }}
        "#, file.display()},
    )
    .unwrap();

    let cmd = rfiscope().arg("info").arg(json.display().to_string()).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Times: 16"), "{stdout}");
}

#[test]
fn test_bad_arg_files() {
    let temp_dir = tempdir().expect("Couldn't make tempdir");
    let yaml = temp_dir.path().join("info.yaml");
    fs::write(&yaml, "data: {}").unwrap();
    let cmd = rfiscope().arg("info").arg(yaml.display().to_string()).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("recognised file extension"), "{stderr}");

    let toml = temp_dir.path().join("info.toml");
    fs::write(&toml, "[data]\nsubbands = \"two\"\n").unwrap();
    let cmd = rfiscope().arg("info").arg(toml.display().to_string()).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Couldn't decode toml"), "{stderr}");
}
