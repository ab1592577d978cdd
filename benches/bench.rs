// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use criterion::*;
use ndarray::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

use rfiscope::{
    flagging::{base_flag, sir_operator},
    io::read::{DataFormat, Ingested, ReadReport},
    DataProvider, FlagMask, GridDataProvider, Observation, RobustStatistics, SampleGrid,
};

fn noisy_series(rng: &mut StdRng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.gen_range(9.0..11.0)).collect()
}

fn statistics(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let series = noisy_series(&mut rng, 4096);
    let flags = vec![false; series.len()];
    c.bench_function("robust statistics, 4096 samples", |b| {
        b.iter(|| RobustStatistics::new(black_box(&series), &flags))
    });
}

fn flagging(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let series = noisy_series(&mut rng, 4096);
    c.bench_function("base flag, 4096 samples", |b| {
        b.iter_batched(
            || vec![false; series.len()],
            |mut flags| base_flag(black_box(&series), &mut flags, 1.0),
            BatchSize::SmallInput,
        )
    });

    let flags: Vec<bool> = (0..4096).map(|_| rng.gen_bool(0.3)).collect();
    c.bench_function("SIR operator, 4096 samples", |b| {
        b.iter_batched(
            || flags.clone(),
            |mut flags| sir_operator(&mut flags, 0.4),
            BatchSize::SmallInput,
        )
    });
}

fn provider(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let data = Array4::from_shape_simple_fn((64, 8, 256, 4), || rng.gen_range(9.0..11.0));
    let ingested = Ingested {
        file: "bench".to_string(),
        format: DataFormat::Visibility,
        kind: DataFormat::Visibility.layout().kind,
        initial_flagged: FlagMask::new(64, 8, 256),
        grid: SampleGrid::from_array(data),
        report: ReadReport::default(),
        samples_per_second: 1,
    };
    let observation = Observation {
        low_freq_mhz: 110.0,
        freq_step_mhz: 0.1,
        samples_per_second: 1.0,
    };
    let mut provider = GridDataProvider::new(ingested, observation);
    provider.set_flagger("post-correlation-history").unwrap();

    let mut group = c.benchmark_group("provider");
    group.sample_size(10);
    group.bench_function("flag 64 s x 8 subbands x 256 channels", |b| {
        b.iter(|| provider.flag().unwrap())
    });
    group.finish();
}

criterion_group!(benches, statistics, flagging, provider);
criterion_main!(benches);
