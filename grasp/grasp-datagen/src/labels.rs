//! Rasterization of labeled grasps into dense voxel label volumes.

use grasp_perception::ReconstructionVolume;
use grasp_types::{Grasp, Label, quaternion_xyzw};
use nalgebra::{Isometry3, Vector3};
use ndarray::{Array3, Array4, Array5, Axis, s};
use tracing::debug;

use crate::error::{GenerationError, Result};

/// Dense training volumes for one scene.
///
/// Every array shares the spatial shape `(R, R, R)` of the coarse
/// reconstruction, indexed `[x, y, z]`:
///
/// | Field       | Shape              | Content                                        |
/// |-------------|--------------------|------------------------------------------------|
/// | `tsdf`      | `(1, R, R, R)`     | Coarse TSDF grid                               |
/// | `quality`   | `(1, R, R, R)`     | 1.0 for a success, 0.0 otherwise               |
/// | `rotations` | `(2, 4, R, R, R)`  | Grasp and symmetric quaternions, `[x, y, z, w]`|
/// | `width`     | `(1, R, R, R)`     | Opening width in voxel units                   |
/// | `mask`      | `(1, R, R, R)`     | 1.0 where a grasp was written                  |
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVolumes {
    /// Coarse TSDF grid with a leading channel axis.
    pub tsdf: Array4<f32>,
    /// Grasp quality.
    pub quality: Array4<f32>,
    /// Grasp orientation and its half-turn twin.
    pub rotations: Array5<f32>,
    /// Opening width in voxels.
    pub width: Array4<f32>,
    /// Labeled voxels.
    pub mask: Array4<f32>,
}

impl LabelVolumes {
    /// Rasterizes grasps into the grid of `volume`.
    ///
    /// # Errors
    ///
    /// See [`LabelVolumes::from_grid`].
    pub fn rasterize<V: ReconstructionVolume>(
        volume: &V,
        grasps: &[(Grasp, Label)],
    ) -> Result<Self> {
        Self::from_grid(volume.dense_grid(), volume.voxel_size(), grasps)
    }

    /// Rasterizes grasps given in the task frame into a cubic grid with
    /// voxel edge `voxel_size`.
    ///
    /// Each grasp is converted to voxel coordinates and its translation is
    /// rounded to the nearest voxel, with ties to even. Grasps outside the
    /// grid are dropped. When two grasps land in the same voxel the later
    /// one wins.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::NonCubicGrid`] if `grid` is not cubic, or
    /// a grasp error if `voxel_size` is not positive.
    pub fn from_grid(
        grid: Array3<f32>,
        voxel_size: f64,
        grasps: &[(Grasp, Label)],
    ) -> Result<Self> {
        let shape = grid.shape().to_vec();
        let resolution = shape[0];
        if shape.iter().any(|&dim| dim != resolution) {
            return Err(GenerationError::NonCubicGrid(shape));
        }

        let spatial = (1, resolution, resolution, resolution);
        let mut volumes = Self {
            tsdf: grid.insert_axis(Axis(0)),
            quality: Array4::zeros(spatial),
            rotations: Array5::zeros((2, 4, resolution, resolution, resolution)),
            width: Array4::zeros(spatial),
            mask: Array4::zeros(spatial),
        };

        let mut dropped = 0usize;
        for (grasp, label) in grasps {
            let voxel = grasp.to_voxel_coordinates(&Isometry3::identity(), voxel_size)?;
            let Some([i, j, k]) = voxel_index(&voxel.pose.translation.vector, resolution) else {
                dropped += 1;
                continue;
            };

            volumes.quality[[0, i, j, k]] = label.quality();
            let primary = quaternion_xyzw(&voxel.pose.rotation);
            let symmetric = quaternion_xyzw(&voxel.symmetric_rotation());
            for (c, (p, q)) in primary.iter().zip(&symmetric).enumerate() {
                volumes.rotations[[0, c, i, j, k]] = *p;
                volumes.rotations[[1, c, i, j, k]] = *q;
            }
            #[allow(clippy::cast_possible_truncation)]
            let width = voxel.width as f32;
            volumes.width[[0, i, j, k]] = width;
            volumes.mask[[0, i, j, k]] = 1.0;
        }

        if dropped > 0 {
            debug!(dropped, total = grasps.len(), "Grasps outside the volume");
        }
        Ok(volumes)
    }

    /// Voxels per axis.
    #[must_use]
    pub fn resolution(&self) -> usize {
        self.tsdf.shape()[1]
    }

    /// Number of voxels carrying a label.
    #[must_use]
    pub fn written_voxels(&self) -> usize {
        self.mask.iter().filter(|m| **m > 0.0).count()
    }

    /// The coarse TSDF grid without its channel axis.
    #[must_use]
    pub fn tsdf_grid(&self) -> Array3<f32> {
        self.tsdf.slice(s![0, .., .., ..]).to_owned()
    }
}

/// Nearest voxel to a position in voxel units, or `None` outside `[0, R-1]³`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn voxel_index(position: &Vector3<f64>, resolution: usize) -> Option<[usize; 3]> {
    #[allow(clippy::cast_precision_loss)]
    let upper = resolution.checked_sub(1)? as f64;
    let mut index = [0usize; 3];
    for (slot, coord) in index.iter_mut().zip(position.iter()) {
        let rounded = coord.round_ties_even();
        if !(0.0..=upper).contains(&rounded) {
            return None;
        }
        *slot = rounded as usize;
    }
    Some(index)
}
