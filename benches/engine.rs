//! Throughput of the row-parallel spectral engine.

use cilia_spectral::capture::{collect_volume, SyntheticSource};
use cilia_spectral::config::{AnalysisConfig, SyntheticConfig};
use cilia_spectral::spectral::{RowProgress, SpectralEngine};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_engine(c: &mut Criterion) {
    let synthetic = SyntheticConfig {
        width: 64,
        height: 48,
        num_frames: 300,
        ..Default::default()
    };
    let mut source = SyntheticSource::new(synthetic).expect("valid synthetic config");
    let volume = collect_volume(&mut source).expect("synthetic volume");

    let mut group = c.benchmark_group("spectral_engine");
    group.throughput(Throughput::Elements((volume.height() * volume.width()) as u64));

    for threads in [1usize, 4] {
        let config = AnalysisConfig {
            sampling_rate: 60.0,
            threads,
            progress: false,
        };
        let engine = SpectralEngine::new(volume.num_frames(), &config).expect("engine");

        group.bench_with_input(BenchmarkId::new("threads", threads), &engine, |b, engine| {
            b.iter(|| {
                let progress = RowProgress::silent(volume.height(), volume.width());
                black_box(engine.run(black_box(&volume), &progress).expect("run"))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_engine);
criterion_main!(benches);
