// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod arg_files;
mod flag;
mod fold;
mod no_stderr;

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};
use byteorder::{BigEndian, WriteBytesExt};

fn rfiscope() -> Command {
    Command::cargo_bin("rfiscope").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// Deterministic values in [-0.5, 0.5).
fn noise(i: usize) -> f32 {
    let mut h = (i as u32).wrapping_mul(0x9E37_79B9);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE35);
    h ^= h >> 16;
    (f64::from(h) / 4_294_967_296.0 - 0.5) as f32
}

/// The dimensions of a synthesised beam-formed file.
#[derive(Clone, Copy)]
struct BeamFormedFile {
    blocks: usize,
    subbands: usize,
    channels: usize,
    samples_per_block: usize,
}

impl BeamFormedFile {
    /// The arguments describing this file to `rfiscope`.
    fn args(&self, file: &Path) -> Vec<String> {
        vec![
            "--data".to_string(),
            file.display().to_string(),
            "--format".to_string(),
            "beam-formed".to_string(),
            "--subbands".to_string(),
            self.subbands.to_string(),
            "--channels".to_string(),
            self.channels.to_string(),
            "--samples-per-block".to_string(),
            self.samples_per_block.to_string(),
        ]
    }

    /// Write the file into `dir`. `value` is given (time, subband, channel),
    /// where time counts samples from the start of the file.
    fn write<F: Fn(usize, usize, usize) -> f32>(&self, dir: &Path, value: F) -> PathBuf {
        let path = dir.join("data.raw");
        let mut f = BufWriter::new(File::create(&path).unwrap());
        for i_block in 0..self.blocks {
            f.write_u32::<BigEndian>(i_block as u32).unwrap();
            f.write_all(&[0; 12]).unwrap();
            for i_subband in 0..self.subbands {
                for i_sample in 0..self.samples_per_block {
                    let i_time = i_block * self.samples_per_block + i_sample;
                    for i_chan in 0..self.channels {
                        f.write_f32::<BigEndian>(value(i_time, i_subband, i_chan))
                            .unwrap();
                    }
                }
            }
        }
        f.flush().unwrap();
        path
    }
}

const NOISY: BeamFormedFile = BeamFormedFile {
    blocks: 4,
    subbands: 2,
    channels: 32,
    samples_per_block: 4,
};

/// Quiet noise around 10 with one very loud sample at time 5, subband 1,
/// channel 7.
fn write_noisy_file(dir: &Path) -> PathBuf {
    NOISY.write(dir, |t, sb, ch| {
        let v = 10.0 + 0.2 * noise(10_000 * sb + 100 * t + ch);
        if (t, sb, ch) == (5, 1, 7) {
            v + 50.0
        } else {
            v
        }
    })
}
