//! Serializes spectral maps and their metadata.

use super::{OutputError, OutputPaths};
use crate::spectral::{Metadata, SpectralMaps};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Renders metadata as three newline-terminated decimal lines.
pub fn format_metadata(metadata: &Metadata) -> String {
    format!(
        "{}\n{}\n{}\n",
        metadata.num_frames, metadata.height, metadata.width
    )
}

/// Writes the PSD map, then the frequency map, then the metadata.
///
/// Stops at the first failure. Files already written are left in place,
/// so a failure after the PSD map leaves an incomplete set on disk.
pub fn write_maps(maps: &SpectralMaps, paths: &OutputPaths) -> Result<(), OutputError> {
    write_f32_file(&paths.psd, maps.psd())?;
    write_f32_file(&paths.frequency, maps.frequency())?;
    write_bytes(&paths.metadata, format_metadata(&maps.metadata()).as_bytes())?;

    tracing::info!(
        psd = %paths.psd.display(),
        frequency = %paths.frequency.display(),
        metadata = %paths.metadata.display(),
        "Wrote spectral maps"
    );
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>, OutputError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| OutputError::Create {
            path: path.to_path_buf(),
            source,
        })
}

fn write_f32_file(path: &Path, values: &[f32]) -> Result<(), OutputError> {
    let mut writer = create(path)?;
    let write_err = |source: std::io::Error| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };

    for value in values {
        writer.write_all(&value.to_le_bytes()).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;

    tracing::debug!(path = %path.display(), values = values.len(), "Wrote f32 map");
    Ok(())
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), OutputError> {
    let mut writer = create(path)?;
    writer
        .write_all(bytes)
        .and_then(|()| writer.flush())
        .map_err(|source| OutputError::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("cilia-writer-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_metadata_text() {
        let metadata = Metadata {
            num_frames: 300,
            height: 480,
            width: 640,
        };
        assert_eq!(format_metadata(&metadata), "300\n480\n640\n");
    }

    #[test]
    fn test_written_bytes_are_little_endian_f32() {
        let dir = scratch_dir("layout");
        let paths = OutputPaths::for_stem(&dir, "clip");
        let metadata = Metadata {
            num_frames: 2,
            height: 1,
            width: 2,
        };
        let maps =
            SpectralMaps::from_parts(metadata, vec![1.0, -2.5, 0.25, 8.0], vec![3.0, 0.5]).unwrap();

        write_maps(&maps, &paths).unwrap();

        let psd = std::fs::read(&paths.psd).unwrap();
        let mut expected = Vec::new();
        for v in [1.0f32, -2.5, 0.25, 8.0] {
            expected.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(psd, expected);
        assert_eq!(std::fs::read(&paths.frequency).unwrap().len(), 8);
        assert_eq!(std::fs::read_to_string(&paths.metadata).unwrap(), "2\n1\n2\n");

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_unwritable_destination_names_path() {
        let paths = OutputPaths::for_stem("/nonexistent-cilia-dir/deeper", "clip");
        let maps = SpectralMaps::zeroed(Metadata {
            num_frames: 2,
            height: 1,
            width: 1,
        });

        match write_maps(&maps, &paths) {
            Err(OutputError::Create { path, .. }) => assert_eq!(path, paths.psd),
            other => panic!("expected create failure, got {other:?}"),
        }
    }
}
