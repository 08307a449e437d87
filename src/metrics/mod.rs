//! Prometheus metrics for spectral runs.
//!
//! The binary is a batch tool, so metrics are exported as a text file
//! after the run rather than served over HTTP.
//!
//! # Metrics Exposed
//!
//! ## Throughput
//! - `cilia_spectral_volumes_processed_total` - Volumes analyzed to completion
//! - `cilia_spectral_volumes_skipped_total` - Volumes skipped (summary already present)
//! - `cilia_spectral_volumes_failed_total` - Volumes whose analysis failed
//! - `cilia_spectral_frames_total` - Frames read
//! - `cilia_spectral_rows_total` - Pixel rows completed
//! - `cilia_spectral_pixels_total` - Pixels processed
//!
//! ## Latest run
//! - `cilia_spectral_engine_seconds` - Engine wall-clock time
//! - `cilia_spectral_last_frames` - Frame count
//! - `cilia_spectral_last_cbf_hz` - Ciliary beat frequency
//! - `cilia_spectral_last_ffca` - Functional ciliated area fraction

mod collector;

pub use collector::{MetricsError, MetricsRegistry, RunSnapshot};
