//! Property tests for the spectral engine and map files.

use cilia_spectral::capture::FrameVolume;
use cilia_spectral::config::AnalysisConfig;
use cilia_spectral::output::{read_maps, write_maps, OutputPaths};
use cilia_spectral::spectral::{self, RowProgress, SpectralEngine, SUPPRESSED_BINS};
use proptest::prelude::*;

fn config(sampling_rate: f64, threads: usize) -> AnalysisConfig {
    AnalysisConfig {
        sampling_rate,
        threads,
        progress: false,
    }
}

/// Random volume of 1..=80 frames and up to 4x4 pixels.
fn arb_volume() -> impl Strategy<Value = FrameVolume> {
    (1usize..=80, 1usize..=4, 1usize..=4).prop_flat_map(|(frames, height, width)| {
        prop::collection::vec(any::<u8>(), frames * height * width).prop_map(move |data| {
            FrameVolume::from_raw(data, frames, height, width).expect("shape matches")
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn psd_is_non_negative_and_low_bins_zero(volume in arb_volume(), rate in 1.0f64..240.0) {
        let maps = spectral::analyze(&volume, &config(rate, 2)).unwrap();
        let bins = maps.metadata().fft_length();

        prop_assert_eq!(bins, volume.num_frames() / 2 + 1);
        for pixel in maps.psd().chunks_exact(bins) {
            prop_assert!(pixel.iter().all(|&p| p >= 0.0));
            prop_assert!(pixel.iter().take(SUPPRESSED_BINS).all(|&p| p == 0.0));
        }

        let resolution = rate / volume.num_frames() as f64;
        let nyquist = rate / 2.0;
        for &f in maps.frequency() {
            prop_assert!(f >= 0.0);
            prop_assert!((f as f64) <= nyquist + resolution * 1e-3 + 1e-3);
        }
    }

    #[test]
    fn output_independent_of_thread_count(volume in arb_volume(), threads in 2usize..6) {
        let progress = RowProgress::silent(volume.height(), volume.width());
        let n = volume.num_frames();

        let one = SpectralEngine::new(n, &config(30.0, 1)).unwrap().run(&volume, &progress).unwrap();
        let many = SpectralEngine::new(n, &config(30.0, threads)).unwrap().run(&volume, &progress).unwrap();

        let bits = |v: &[f32]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        prop_assert_eq!(bits(one.psd()), bits(many.psd()));
        prop_assert_eq!(bits(one.frequency()), bits(many.frequency()));
    }

    #[test]
    fn constant_pixels_have_no_power(frames in 1usize..120, value in any::<u8>()) {
        let volume = FrameVolume::from_fn(frames, 2, 2, |_, _, _| value).unwrap();
        let maps = spectral::analyze(&volume, &config(60.0, 0)).unwrap();

        prop_assert!(maps.psd().iter().all(|&p| p == 0.0));
        prop_assert!(maps.frequency().iter().all(|&f| f == 0.0));
    }

    #[test]
    fn sinusoid_above_cutoff_is_located(
        frames in 64usize..200,
        bin_offset in 0usize..1000,
        rate in 10.0f64..120.0,
    ) {
        let half = frames / 2;
        // Keep clear of the cutoff edge and of Nyquist
        let bin = SUPPRESSED_BINS + 1 + bin_offset % (half - SUPPRESSED_BINS - 2);
        let volume = FrameVolume::from_fn(frames, 1, 1, |t, _, _| {
            let angle = 2.0 * std::f64::consts::PI * bin as f64 * t as f64 / frames as f64;
            (127.5 + 120.0 * angle.sin()).round() as u8
        })
        .unwrap();

        let maps = spectral::analyze(&volume, &config(rate, 0)).unwrap();
        let expected = (bin as f64 * rate / frames as f64) as f32;
        prop_assert_eq!(maps.pixel_frequency(0, 0), expected);

        let psd = maps.pixel_psd(0, 0);
        let peak = psd.iter().copied().fold(0.0f32, f32::max);
        prop_assert_eq!(psd[bin], peak);
    }

    #[test]
    fn maps_survive_write_and_read(volume in arb_volume(), tag in any::<u32>()) {
        let maps = spectral::analyze(&volume, &config(25.0, 0)).unwrap();
        let dir = std::env::temp_dir().join(format!("cilia-prop-{}-{tag}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let paths = OutputPaths::for_stem(&dir, "prop");

        write_maps(&maps, &paths).unwrap();
        let restored = read_maps(&paths).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        prop_assert_eq!(restored.metadata(), maps.metadata());
        let bits = |v: &[f32]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        prop_assert_eq!(bits(restored.psd()), bits(maps.psd()));
        prop_assert_eq!(bits(restored.frequency()), bits(maps.frequency()));
    }
}
