// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use ndarray::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::*;

const OBS: Observation = Observation {
    low_freq_mhz: 100.0,
    freq_step_mhz: 10.0,
    samples_per_second: 100.0,
};

fn random_grid(rng: &mut StdRng, dim: (usize, usize, usize, usize)) -> SampleGrid {
    SampleGrid::from_array(Array4::from_shape_simple_fn(dim, || rng.gen_range(0.0..1.0)))
}

#[test]
fn test_dispersion_shifts() {
    let shifts = dispersion_shifts(&OBS, 2, 2, 1.0).unwrap();
    // The highest frequency is the reference; lower frequencies arrive later
    // and are moved earlier.
    assert_eq!(shifts, array![[-17, -10], [-4, 0]]);

    let shifts = dispersion_shifts(&OBS, 2, 2, 0.0).unwrap();
    assert!(shifts.iter().all(|&s| s == 0));
}

#[test]
fn test_dispersion_shifts_with_descending_frequencies() {
    let obs = Observation {
        low_freq_mhz: 130.0,
        freq_step_mhz: -10.0,
        ..OBS
    };
    let shifts = dispersion_shifts(&obs, 1, 4, 1.0).unwrap();
    assert_eq!(shifts, array![[0, -4, -10, -17]]);
}

#[test]
fn test_dedisperse_aligns_a_dispersed_pulse() {
    let (nr_times, nr_subbands, nr_channels) = (64, 2, 2);
    let shifts = dispersion_shifts(&OBS, nr_subbands, nr_channels, 1.0).unwrap();
    let t0 = 10;
    let mut grid = SampleGrid::zeros(nr_times, nr_subbands, nr_channels, 1);
    for ((i_subband, i_chan), &shift) in shifts.indexed_iter() {
        let arrival = (t0 as isize - shift) as usize;
        grid.data[(arrival, i_subband, i_chan, 0)] = 1.0;
    }
    let mut flags = FlagMask::new(nr_times, nr_subbands, nr_channels);

    dedisperse(&mut grid, &mut flags, &OBS, 1.0).unwrap();
    for i_time in 0..nr_times {
        let expected = if i_time == t0 { 1.0 } else { 0.0 };
        for v in grid.data.slice(s![i_time, .., .., 0]) {
            assert_abs_diff_eq!(*v, expected);
        }
    }
}

#[test]
fn test_dedisperse_round_trip() {
    let mut rng = StdRng::seed_from_u64(1);
    let original = random_grid(&mut rng, (40, 2, 3, 2));
    let original_flags = FlagMask::from_array(Array3::from_shape_simple_fn((40, 2, 3), || {
        rng.gen_bool(0.2)
    }));

    let mut grid = original.clone();
    let mut flags = original_flags.clone();
    dedisperse(&mut grid, &mut flags, &OBS, 1.5).unwrap();
    assert_ne!(grid, original);
    assert_eq!(flags.num_flagged(), original_flags.num_flagged());
    dedisperse(&mut grid, &mut flags, &OBS, -1.5).unwrap();
    assert_eq!(grid, original);
    assert_eq!(flags, original_flags);
}

#[test]
fn test_flags_move_with_their_samples() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut grid = random_grid(&mut rng, (30, 2, 2, 1));
    let mut flags = FlagMask::new(30, 2, 2);
    flags.set(3, 0, 0);
    grid.data[(3, 0, 0, 0)] = -1.0;

    dedisperse(&mut grid, &mut flags, &OBS, 1.0).unwrap();
    // The shift of subband 0 channel 0 is -17, wrapping 3 around to 16.
    assert!(flags.get(16, 0, 0));
    assert_eq!(flags.num_flagged(), 1);
    assert_abs_diff_eq!(grid.data[(16, 0, 0, 0)], -1.0);
}

#[test]
fn test_dedisperse_errors() {
    let mut grid = SampleGrid::zeros(4, 1, 2, 1);
    let mut flags = FlagMask::new(4, 1, 2);
    let bad = Observation {
        samples_per_second: 0.0,
        ..OBS
    };
    assert_eq!(
        dedisperse(&mut grid, &mut flags, &bad, 1.0),
        Err(PulsarError::NonPositiveSampleRate(0.0))
    );
    let bad = Observation {
        low_freq_mhz: -10.0,
        ..OBS
    };
    assert_eq!(
        dedisperse(&mut grid, &mut flags, &bad, 1.0),
        Err(PulsarError::NonPositiveFrequency { freq: -10.0 })
    );
    let mut wrong = FlagMask::new(3, 1, 2);
    assert!(matches!(
        dedisperse(&mut grid, &mut wrong, &OBS, 1.0),
        Err(PulsarError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_fold_impulse_train() {
    // 10 samples per period with a pulse at phase 0.3.
    let nr_times = 100;
    let mut grid = SampleGrid::zeros(nr_times, 2, 2, 2);
    for i_time in (3..nr_times).step_by(10) {
        grid.data.slice_mut(s![i_time, .., .., ..]).fill(1.0);
    }
    let flags = FlagMask::new(nr_times, 2, 2);

    let profile = fold(&grid, &flags, 100.0, 0.1, None).unwrap();
    assert_eq!(profile.num_bins(), 10);
    assert_eq!(profile.peak_bin(), Some(3));
    // Both polarisations are summed.
    assert_abs_diff_eq!(profile.values[3], 2.0);
    assert_abs_diff_eq!(profile.values[4], 0.0);
    // 10 periods of 4 cells.
    assert!(profile.counts.iter().all(|&c| c == 40));

    let coarse = fold(&grid, &flags, 100.0, 0.1, Some(5)).unwrap();
    assert_eq!(coarse.peak_bin(), Some(1));
    assert_abs_diff_eq!(coarse.values[1], 1.0);
}

#[test]
fn test_fold_excludes_flagged_cells() {
    let nr_times = 100;
    let mut grid = SampleGrid::zeros(nr_times, 1, 2, 1);
    let mut flags = FlagMask::new(nr_times, 1, 2);
    for i_time in (3..nr_times).step_by(10) {
        grid.data.slice_mut(s![i_time, .., .., ..]).fill(1.0);
        // Interference that is flagged must not show up in the profile.
        grid.data[(i_time + 4, 0, 0, 0)] = 100.0;
        flags.set(i_time + 4, 0, 0);
    }

    let profile = fold(&grid, &flags, 100.0, 0.1, None).unwrap();
    assert_eq!(profile.peak_bin(), Some(3));
    assert_abs_diff_eq!(profile.values[7], 0.0);
    assert_eq!(profile.counts[7], 10);
    assert_eq!(profile.counts[3], 20);

    let all = FlagMask::from_array(Array3::from_elem((nr_times, 1, 2), true));
    let profile = fold(&grid, &all, 100.0, 0.1, None).unwrap();
    assert_eq!(profile.peak_bin(), None);
    assert!(profile.values.iter().all(|&v| v == 0.0));
}

#[test]
fn test_fold_noise_is_flat() {
    let mut rng = StdRng::seed_from_u64(3);
    let grid = random_grid(&mut rng, (2000, 2, 8, 1));
    let flags = FlagMask::new(2000, 2, 8);
    let profile = fold(&grid, &flags, 1000.0, 0.016, Some(8)).unwrap();
    for &v in &profile.values {
        assert_abs_diff_eq!(v, 0.5, epsilon = 0.03);
    }
}

#[test]
fn test_fold_errors() {
    let grid = SampleGrid::zeros(4, 1, 1, 1);
    let flags = FlagMask::new(4, 1, 1);
    assert_eq!(
        fold(&grid, &flags, 1.0, 0.0, None),
        Err(PulsarError::NonPositivePeriod(0.0))
    );
    assert_eq!(
        fold(&grid, &flags, 1.0, 1.0, Some(0)),
        Err(PulsarError::ZeroBins)
    );
    assert_eq!(
        fold(&grid, &flags, -1.0, 1.0, None),
        Err(PulsarError::NonPositiveSampleRate(-1.0))
    );
    // A period shorter than a sample still gets one bin.
    let profile = fold(&grid, &flags, 1.0, 0.1, None).unwrap();
    assert_eq!(profile.num_bins(), 1);
}

#[test]
fn test_fold_rejects_unbounded_periods_and_bins() {
    let grid = SampleGrid::zeros(8, 1, 1, 1);
    let flags = FlagMask::new(8, 1, 1);
    assert_eq!(
        fold(&grid, &flags, 1.0, f64::INFINITY, None),
        Err(PulsarError::NonPositivePeriod(f64::INFINITY))
    );
    assert!(matches!(
        fold(&grid, &flags, 1.0, f64::NAN, None),
        Err(PulsarError::NonPositivePeriod(p)) if p.is_nan()
    ));
    assert!(matches!(
        fold(&grid, &flags, f64::NAN, 1.0, None),
        Err(PulsarError::NonPositiveSampleRate(_))
    ));
    assert_eq!(
        fold(&grid, &flags, f64::INFINITY, 1.0, None),
        Err(PulsarError::NonPositiveSampleRate(f64::INFINITY))
    );

    // Finite, but longer than the 8 s of data.
    assert_eq!(
        fold(&grid, &flags, 1.0, 1e300, None),
        Err(PulsarError::PeriodExceedsData {
            period: 1e300,
            duration: 8.0
        })
    );
    assert_eq!(
        fold(&grid, &flags, 1.0, 4.0, Some(usize::MAX)),
        Err(PulsarError::TooManyBins {
            bins: usize::MAX,
            max: 8
        })
    );

    // The whole data set as one period.
    let profile = fold(&grid, &flags, 1.0, 8.0, None).unwrap();
    assert_eq!(profile.num_bins(), 8);
    assert!(profile.counts.iter().all(|&c| c == 1));
}
