//! Metrics collection and registry.

use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    /// The textfile could not be written.
    #[error("failed to write metrics file: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of analyzing one input, recorded into the registry.
#[derive(Debug, Clone, Default)]
pub struct RunSnapshot {
    /// Frames in the analyzed volume.
    pub frames: usize,
    /// Rows completed by the scheduler.
    pub rows: usize,
    /// Pixels processed.
    pub pixels: usize,
    /// Wall-clock seconds spent in the spectral engine.
    pub engine_seconds: f64,
    /// Resolved beat frequency, if a summary was produced.
    pub cbf: Option<f64>,
    /// Resolved ciliated area fraction, if a summary was produced.
    pub ffca: Option<f64>,
}

/// Prometheus metrics registry for spectral runs.
pub struct MetricsRegistry {
    registry: Registry,

    // Throughput
    volumes_processed: IntCounter,
    volumes_skipped: IntCounter,
    volumes_failed: IntCounter,
    frames_total: IntCounter,
    rows_total: IntCounter,
    pixels_total: IntCounter,

    // Latest run
    engine_seconds: Gauge,
    last_frames: IntGauge,
    last_cbf: Gauge,
    last_ffca: Gauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all run metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let volumes_processed = IntCounter::new(
            "cilia_spectral_volumes_processed_total",
            "Volumes analyzed to completion",
        )?;
        let volumes_skipped = IntCounter::new(
            "cilia_spectral_volumes_skipped_total",
            "Volumes skipped because a summary already existed",
        )?;
        let volumes_failed = IntCounter::new(
            "cilia_spectral_volumes_failed_total",
            "Volumes whose analysis failed",
        )?;
        let frames_total = IntCounter::new(
            "cilia_spectral_frames_total",
            "Frames read across all analyzed volumes",
        )?;
        let rows_total = IntCounter::new(
            "cilia_spectral_rows_total",
            "Pixel rows completed by the scheduler",
        )?;
        let pixels_total = IntCounter::new(
            "cilia_spectral_pixels_total",
            "Pixels whose PSD has been computed",
        )?;

        let engine_seconds = Gauge::new(
            "cilia_spectral_engine_seconds",
            "Wall-clock seconds of the most recent engine run",
        )?;
        let last_frames = IntGauge::new(
            "cilia_spectral_last_frames",
            "Frame count of the most recent volume",
        )?;
        let last_cbf = Gauge::new(
            "cilia_spectral_last_cbf_hz",
            "Ciliary beat frequency of the most recent volume",
        )?;
        let last_ffca = Gauge::new(
            "cilia_spectral_last_ffca",
            "Functional ciliated area fraction of the most recent volume",
        )?;

        registry.register(Box::new(volumes_processed.clone()))?;
        registry.register(Box::new(volumes_skipped.clone()))?;
        registry.register(Box::new(volumes_failed.clone()))?;
        registry.register(Box::new(frames_total.clone()))?;
        registry.register(Box::new(rows_total.clone()))?;
        registry.register(Box::new(pixels_total.clone()))?;
        registry.register(Box::new(engine_seconds.clone()))?;
        registry.register(Box::new(last_frames.clone()))?;
        registry.register(Box::new(last_cbf.clone()))?;
        registry.register(Box::new(last_ffca.clone()))?;

        Ok(Self {
            registry,
            volumes_processed,
            volumes_skipped,
            volumes_failed,
            frames_total,
            rows_total,
            pixels_total,
            engine_seconds,
            last_frames,
            last_cbf,
            last_ffca,
        })
    }

    /// Records a completed volume.
    pub fn record_run(&self, snapshot: &RunSnapshot) {
        self.volumes_processed.inc();
        self.frames_total.inc_by(snapshot.frames as u64);
        self.rows_total.inc_by(snapshot.rows as u64);
        self.pixels_total.inc_by(snapshot.pixels as u64);

        self.engine_seconds.set(snapshot.engine_seconds);
        self.last_frames.set(snapshot.frames as i64);

        // Only update if present
        if let Some(cbf) = snapshot.cbf {
            self.last_cbf.set(cbf);
        }
        if let Some(ffca) = snapshot.ffca {
            self.last_ffca.set(ffca);
        }
    }

    /// Counts an input skipped for an existing summary.
    pub fn record_skipped(&self) {
        self.volumes_skipped.inc();
    }

    /// Counts an input whose analysis failed.
    pub fn record_failure(&self) {
        self.volumes_failed.inc();
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Writes the text encoding to `path`, for a node-exporter textfile collector.
    pub fn write_textfile(&self, path: impl AsRef<Path>) -> Result<(), MetricsError> {
        std::fs::write(path.as_ref(), self.encode()?)?;
        tracing::debug!(path = %path.as_ref().display(), "Wrote metrics textfile");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        assert!(MetricsRegistry::new().is_ok());
    }

    #[test]
    fn test_record_run() {
        let registry = MetricsRegistry::new().unwrap();

        registry.record_run(&RunSnapshot {
            frames: 300,
            rows: 48,
            pixels: 48 * 64,
            engine_seconds: 1.5,
            cbf: Some(12.0),
            ffca: Some(0.25),
        });
        registry.record_run(&RunSnapshot {
            frames: 100,
            rows: 2,
            pixels: 4,
            engine_seconds: 0.5,
            cbf: None,
            ffca: None,
        });
        registry.record_skipped();

        let output = registry.encode().unwrap();
        assert!(output.contains("cilia_spectral_volumes_processed_total 2"));
        assert!(output.contains("cilia_spectral_frames_total 400"));
        assert!(output.contains("cilia_spectral_pixels_total 3076"));
        assert!(output.contains("cilia_spectral_last_frames 100"));
        assert!(output.contains("cilia_spectral_last_cbf_hz 12"));
        assert!(output.contains("cilia_spectral_volumes_skipped_total 1"));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("cilia_spectral_volumes_processed_total"));
        assert!(output.contains("cilia_spectral_engine_seconds"));
        assert!(output.contains("cilia_spectral_last_ffca"));
    }
}
