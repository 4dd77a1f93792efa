//! Compressed `.npz` persistence of label volumes.
//!
//! An archive holds five named arrays, all `f32`:
//!
//! - `tsdf_vol` `(1, R, R, R)`
//! - `qual_vol` `(1, R, R, R)`
//! - `rot_vol` `(2, 4, R, R, R)`
//! - `width_vol` `(1, R, R, R)`
//! - `mask` `(1, R, R, R)`

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use ndarray::{Array, Dimension};
use ndarray_npy::{NpzReader, NpzWriter, ReadNpzError};
use tracing::debug;

use crate::error::{GenerationError, Result};
use crate::labels::LabelVolumes;

/// Archive entry holding the TSDF grid.
pub const TSDF_ARRAY: &str = "tsdf_vol";
/// Archive entry holding grasp quality.
pub const QUALITY_ARRAY: &str = "qual_vol";
/// Archive entry holding the rotation pair.
pub const ROTATION_ARRAY: &str = "rot_vol";
/// Archive entry holding grasp width.
pub const WIDTH_ARRAY: &str = "width_vol";
/// Archive entry holding the label mask.
pub const MASK_ARRAY: &str = "mask";

/// Writes `volumes` to a new compressed archive at `path`.
///
/// The file must not exist yet.
///
/// # Errors
///
/// Returns an IO error if the file exists or cannot be created, or an
/// archive error if compression fails.
pub fn store_sample(path: impl AsRef<Path>, volumes: &LabelVolumes) -> Result<()> {
    let path = path.as_ref();
    let file = OpenOptions::new().write(true).create_new(true).open(path)?;

    let mut npz = NpzWriter::new_compressed(BufWriter::new(file));
    npz.add_array(TSDF_ARRAY, &volumes.tsdf)?;
    npz.add_array(QUALITY_ARRAY, &volumes.quality)?;
    npz.add_array(ROTATION_ARRAY, &volumes.rotations)?;
    npz.add_array(WIDTH_ARRAY, &volumes.width)?;
    npz.add_array(MASK_ARRAY, &volumes.mask)?;
    npz.finish()?.flush()?;

    debug!(
        path = %path.display(),
        resolution = volumes.resolution(),
        labeled = volumes.written_voxels(),
        "Stored sample"
    );
    Ok(())
}

/// Reads an archive written by [`store_sample`].
///
/// # Errors
///
/// Returns an IO error if the file cannot be opened, or an archive error if
/// an entry is missing or the shapes disagree.
pub fn load_sample(path: impl AsRef<Path>) -> Result<LabelVolumes> {
    let mut npz = NpzReader::new(BufReader::new(File::open(path)?))?;

    let volumes = LabelVolumes {
        tsdf: read_array(&mut npz, TSDF_ARRAY)?,
        quality: read_array(&mut npz, QUALITY_ARRAY)?,
        rotations: read_array(&mut npz, ROTATION_ARRAY)?,
        width: read_array(&mut npz, WIDTH_ARRAY)?,
        mask: read_array(&mut npz, MASK_ARRAY)?,
    };

    let spatial = &volumes.tsdf.shape()[1..];
    let consistent = volumes.tsdf.shape()[0] == 1
        && spatial.iter().all(|&dim| dim == spatial[0])
        && [&volumes.quality, &volumes.width, &volumes.mask]
            .iter()
            .all(|array| array.shape() == volumes.tsdf.shape())
        && volumes.rotations.shape()[..2] == [2, 4]
        && &volumes.rotations.shape()[2..] == spatial;
    if !consistent {
        return Err(GenerationError::archive(format!(
            "inconsistent shapes: tsdf {:?}, rotations {:?}",
            volumes.tsdf.shape(),
            volumes.rotations.shape()
        )));
    }
    Ok(volumes)
}

/// Reads entry `name`, with or without the `.npy` suffix in the archive.
fn read_array<R, D>(npz: &mut NpzReader<R>, name: &str) -> Result<Array<f32, D>>
where
    R: Read + Seek,
    D: Dimension,
{
    match npz.by_name(&format!("{name}.npy")) {
        Ok(array) => Ok(array),
        Err(ReadNpzError::Zip(_)) => Ok(npz.by_name(name)?),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grasp_types::{Grasp, Label};
    use nalgebra::Isometry3;
    use ndarray::Array3;

    fn sample() -> LabelVolumes {
        let grid = Array3::from_elem((6, 6, 6), -0.5f32);
        let grasps = [(
            Grasp::new(Isometry3::translation(0.2, 0.3, 0.1), 0.05),
            Label::Success,
        )];
        LabelVolumes::from_grid(grid, 0.1, &grasps).unwrap()
    }

    #[test]
    fn stored_sample_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.npz");
        let volumes = sample();

        store_sample(&path, &volumes).unwrap();
        let loaded = load_sample(&path).unwrap();

        assert_eq!(loaded, volumes);
        assert_eq!(loaded.written_voxels(), 1);
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.npz");
        store_sample(&path, &sample()).unwrap();

        let err = store_sample(&path, &sample()).unwrap_err();
        assert!(matches!(err, GenerationError::Io(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_sample(dir.path().join("absent.npz")).unwrap_err();
        assert!(matches!(err, GenerationError::Io(_)));
    }

    #[test]
    fn garbage_file_is_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.npz");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let err = load_sample(&path).unwrap_err();
        assert!(matches!(err, GenerationError::Archive(_)));
    }
}
