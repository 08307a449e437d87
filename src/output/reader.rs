//! Reads maps back using their metadata.

use super::{OutputError, OutputPaths};
use crate::spectral::{Metadata, SpectralMaps};
use std::path::Path;

/// Parses the three-line metadata text.
///
/// Blank trailing lines are tolerated; anything else beyond three values
/// is rejected.
pub fn parse_metadata(text: &str) -> Result<Metadata, String> {
    let mut values = text.lines().map(str::trim).filter(|line| !line.is_empty());
    let mut next = |name: &str| -> Result<usize, String> {
        let line = values.next().ok_or_else(|| format!("missing {name}"))?;
        line.parse::<usize>()
            .map_err(|e| format!("{name} {line:?}: {e}"))
    };

    let metadata = Metadata {
        num_frames: next("frame count")?,
        height: next("height")?,
        width: next("width")?,
    };

    if values.next().is_some() {
        return Err("unexpected trailing content".to_string());
    }
    if metadata.num_frames == 0 || metadata.height == 0 || metadata.width == 0 {
        return Err("dimensions must be non-zero".to_string());
    }
    if map_byte_len(metadata.checked_psd_len()).is_none() {
        return Err("map size overflows".to_string());
    }
    Ok(metadata)
}

/// Loads and parses a metadata file.
pub fn read_metadata(path: impl AsRef<Path>) -> Result<Metadata, OutputError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| OutputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_metadata(&text).map_err(|reason| OutputError::InvalidMetadata {
        path: path.to_path_buf(),
        reason,
    })
}

/// Reads metadata, then both maps, checking every file size.
pub fn read_maps(paths: &OutputPaths) -> Result<SpectralMaps, OutputError> {
    let metadata = read_metadata(&paths.metadata)?;
    let psd = read_f32_file(&paths.psd, metadata.psd_len())?;
    let frequency = read_f32_file(&paths.frequency, metadata.pixel_count())?;

    tracing::debug!(
        frames = metadata.num_frames,
        height = metadata.height,
        width = metadata.width,
        "Read spectral maps"
    );

    SpectralMaps::from_parts(metadata, psd, frequency).ok_or_else(|| OutputError::InvalidMetadata {
        path: paths.metadata.clone(),
        reason: "map sizes disagree with metadata".to_string(),
    })
}

/// Byte size of a map holding `count` `f32` values.
fn map_byte_len(count: Option<usize>) -> Option<u64> {
    count
        .and_then(|count| count.checked_mul(std::mem::size_of::<f32>()))
        .map(|bytes| bytes as u64)
}

fn read_f32_file(path: &Path, count: usize) -> Result<Vec<f32>, OutputError> {
    let bytes = std::fs::read(path).map_err(|source| OutputError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let expected = map_byte_len(Some(count)).ok_or_else(|| OutputError::InvalidMetadata {
        path: path.to_path_buf(),
        reason: format!("{count} values overflow the file size"),
    })?;
    if bytes.len() as u64 != expected {
        return Err(OutputError::SizeMismatch {
            path: path.to_path_buf(),
            expected,
            found: bytes.len() as u64,
        });
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
