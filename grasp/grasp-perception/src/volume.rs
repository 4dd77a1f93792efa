//! Interface of a volumetric fusion engine.

use grasp_types::PointCloud;
use nalgebra::Isometry3;
use ndarray::Array3;

use crate::camera::{CameraIntrinsic, DepthImage};
use crate::error::Result;

/// A cubic reconstruction volume fused from posed depth images.
///
/// The volume spans `[0, size]³` in world coordinates, split into
/// `resolution` voxels per axis.
pub trait ReconstructionVolume: Sized {
    /// Creates an empty volume.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is not positive or `resolution` is zero.
    fn new(size: f64, resolution: usize) -> Result<Self>;

    /// Fuses one depth image taken from `extrinsic` (world → camera).
    ///
    /// # Errors
    ///
    /// Returns an error if the image does not match the camera.
    fn integrate(
        &mut self,
        depth: &DepthImage,
        intrinsic: &CameraIntrinsic,
        extrinsic: &Isometry3<f64>,
    ) -> Result<()>;

    /// Side length of the volume in metres.
    fn size(&self) -> f64;

    /// Number of voxels per axis.
    fn resolution(&self) -> usize;

    /// Edge length of one voxel.
    fn voxel_size(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let resolution = self.resolution() as f64;
        self.size() / resolution
    }

    /// Dense grid indexed `[x, y, z]`, shape `(resolution, resolution, resolution)`.
    ///
    /// Values lie in `[0, 1]` with the surface at 0.5; 0 marks voxels with
    /// no usable distance.
    fn dense_grid(&self) -> Array3<f32>;

    /// Surface points with outward normals.
    fn extract_point_cloud(&self) -> PointCloud;
}
