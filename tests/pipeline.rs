//! End-to-end runs over synthetic footage.

use cilia_spectral::analysis::BeatSummary;
use cilia_spectral::capture::{collect_volume, FrameSource, RawVolumeSource, SyntheticSource};
use cilia_spectral::config::{FileConfig, SyntheticConfig};
use cilia_spectral::metrics::MetricsRegistry;
use cilia_spectral::output::{read_maps, OutputPaths};
use cilia_spectral::pipeline;
use std::io::Write;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cilia-e2e-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn synthetic_config() -> FileConfig {
    let mut config = FileConfig::default();
    config.synthetic = SyntheticConfig {
        width: 16,
        height: 6,
        num_frames: 240,
        sampling_rate: 60.0,
        beat_frequency: 12.0,
        baseline: 120.0,
        amplitude: 60.0,
        ciliated_fraction: 0.25,
    };
    config.analysis.sampling_rate = 60.0;
    config.analysis.progress = false;
    config.resolve.power_threshold = 5.0;
    config
}

#[test]
fn synthetic_beat_is_recovered() {
    let dir = scratch_dir("recover");
    let config = synthetic_config();
    let paths = OutputPaths::for_stem(&dir, "synthetic");

    let mut source = SyntheticSource::new(config.synthetic.clone()).unwrap();
    let volume = collect_volume(&mut source).unwrap();
    let report = pipeline::process_volume(&volume, &paths, &config).unwrap();

    // 240 frames at 60 fps: 0.25 Hz per bin, 12 Hz lands on bin 48
    assert_eq!(report.summary.cbf, 12.0);
    assert_eq!(report.summary.ciliated_pixels, 4 * 6);
    assert_eq!(report.summary.ffca, 0.25);
    assert_eq!(report.summary.ciliated_mean_frequency, 12.0);

    let maps = read_maps(&paths).unwrap();
    assert_eq!(maps.metadata(), report.metadata);
    for row in 0..6 {
        for col in 0..4 {
            assert_eq!(maps.pixel_frequency(row, col), 12.0);
        }
        for col in 4..16 {
            assert_eq!(maps.pixel_frequency(row, col), 0.0);
        }
    }

    let summary = BeatSummary::read(&paths.summary).unwrap();
    assert_eq!(summary.cbf, 12.0);
    assert_eq!(summary.num_frames, 240);

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn raw_volume_file_matches_in_memory_source() {
    let dir = scratch_dir("raw");
    let config = synthetic_config();
    let raw_path = dir.join("clip.raw");

    let mut source = SyntheticSource::new(config.synthetic.clone()).unwrap();
    let mut file = std::fs::File::create(&raw_path).unwrap();
    while let Some(frame) = source.next_frame().unwrap() {
        file.write_all(frame.pixels()).unwrap();
    }
    drop(file);

    let mut raw = RawVolumeSource::open(&raw_path, 16, 6).unwrap();
    assert_eq!(raw.frame_count_hint(), Some(240));
    let from_file = collect_volume(&mut raw).unwrap();

    let mut source = SyntheticSource::new(config.synthetic.clone()).unwrap();
    let in_memory = collect_volume(&mut source).unwrap();
    assert_eq!(from_file.as_bytes(), in_memory.as_bytes());

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn discarded_maps_leave_only_summary() {
    let dir = scratch_dir("discard");
    let mut config = synthetic_config();
    config.output.keep_maps = false;
    let paths = OutputPaths::for_stem(&dir, "clip");

    let mut source = SyntheticSource::new(config.synthetic.clone()).unwrap();
    let volume = collect_volume(&mut source).unwrap();
    let report = pipeline::process_volume(&volume, &paths, &config).unwrap();

    assert!(!report.maps_kept);
    assert!(paths.summary.exists());
    assert!(paths.map_files().iter().all(|p| !p.exists()));

    // Existing summary means the next batch skips this input
    assert!(pipeline::should_skip(&paths, &config));
    config.output.skip_existing = false;
    assert!(!pipeline::should_skip(&paths, &config));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn resolve_existing_rewrites_summary_with_new_threshold() {
    let dir = scratch_dir("resolve");
    let mut config = synthetic_config();
    let paths = OutputPaths::for_stem(&dir, "clip");

    let mut source = SyntheticSource::new(config.synthetic.clone()).unwrap();
    let volume = collect_volume(&mut source).unwrap();
    pipeline::process_volume(&volume, &paths, &config).unwrap();

    config.resolve.power_threshold = 1e12;
    let summary = pipeline::resolve_existing(&paths, &config).unwrap();
    assert_eq!(summary.ffca, 0.0);
    assert_eq!(summary.cbf, 12.0);
    assert_eq!(BeatSummary::read(&paths.summary).unwrap().ffca, 0.0);

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn run_report_feeds_metrics() {
    let dir = scratch_dir("metrics");
    let config = synthetic_config();
    let paths = OutputPaths::for_stem(&dir, "clip");

    let mut source = SyntheticSource::new(config.synthetic.clone()).unwrap();
    let volume = collect_volume(&mut source).unwrap();
    let report = pipeline::process_volume(&volume, &paths, &config).unwrap();

    let metrics = MetricsRegistry::new().unwrap();
    metrics.record_run(&report.snapshot());
    let metrics_path = dir.join("metrics.prom");
    metrics.write_textfile(&metrics_path).unwrap();

    let text = std::fs::read_to_string(&metrics_path).unwrap();
    assert!(text.contains("cilia_spectral_pixels_total 96"));
    assert!(text.contains("cilia_spectral_last_cbf_hz 12"));

    std::fs::remove_dir_all(dir).unwrap();
}
