//! Binary map persistence.
//!
//! A run produces three files per input:
//!
//! - `{stem}_psd_map.bin`: `height * width * fft_length` little-endian
//!   `f32` values, row-major `(row, col, bin)`;
//! - `{stem}_freq_map.bin`: `height * width` little-endian `f32` values,
//!   row-major `(row, col)`;
//! - `{stem}_meta.txt`: `num_frames`, `height`, `width`, one per line.
//!
//! Readers must load the metadata first to learn how to slice the maps.

mod reader;
mod writer;

pub use reader::{parse_metadata, read_maps, read_metadata};
pub use writer::{format_metadata, write_maps};

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from writing or reading map files. Each names the file involved.
#[derive(Debug, Error)]
pub enum OutputError {
    /// A file could not be created.
    #[error("failed to create {path}: {source}")]
    Create {
        /// File being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Writing or flushing a file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Metadata is malformed or describes maps too large to address.
    #[error("invalid metadata in {path}: {reason}")]
    InvalidMetadata {
        /// File holding the bad metadata.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },
    /// A map file's size disagrees with the metadata.
    #[error("{path} holds {found} bytes, expected {expected}")]
    SizeMismatch {
        /// Map file with the wrong size.
        path: PathBuf,
        /// Size implied by the metadata.
        expected: u64,
        /// Size on disk.
        found: u64,
    },
}

/// Locations of the files belonging to one analyzed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// `{stem}_psd_map.bin`
    pub psd: PathBuf,
    /// `{stem}_freq_map.bin`
    pub frequency: PathBuf,
    /// `{stem}_meta.txt`
    pub metadata: PathBuf,
    /// `{stem}_CBF_FFCA.toml`
    pub summary: PathBuf,
}

impl OutputPaths {
    /// Derives the standard file names for `stem` inside `dir`.
    pub fn for_stem(dir: impl AsRef<Path>, stem: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            psd: dir.join(format!("{stem}_psd_map.bin")),
            frequency: dir.join(format!("{stem}_freq_map.bin")),
            metadata: dir.join(format!("{stem}_meta.txt")),
            summary: dir.join(format!("{stem}_CBF_FFCA.toml")),
        }
    }

    /// Paths of the three map files, in write order.
    pub fn map_files(&self) -> [&Path; 3] {
        [
            self.psd.as_path(),
            self.frequency.as_path(),
            self.metadata.as_path(),
        ]
    }

    /// Deletes the map files, logging any that cannot be removed.
    pub fn remove_maps(&self) {
        for path in self.map_files() {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove map file");
            }
        }
    }
}
