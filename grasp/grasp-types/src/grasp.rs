//! Grasp pose and width.

use std::f64::consts::PI;

use nalgebra::{Isometry3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{GraspTypesError, Result};

/// A parallel-jaw grasp: gripper pose at the moment of closure plus the
/// opening width.
///
/// The pose's local Z axis is the approach direction. Because a
/// parallel-jaw gripper is symmetric under a half turn about that axis,
/// [`Grasp::symmetric_rotation`] describes the same physical grasp.
///
/// # Example
///
/// ```
/// use grasp_types::Grasp;
/// use nalgebra::{Isometry3, Vector3};
///
/// let grasp = Grasp::new(Isometry3::translation(0.1, 0.2, 0.3), 0.05);
/// let voxel = grasp.to_voxel_coordinates(&Isometry3::identity(), 0.1).unwrap();
///
/// assert!((voxel.pose.translation.vector - Vector3::new(1.0, 2.0, 3.0)).norm() < 1e-12);
/// assert!((voxel.width - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grasp {
    /// Gripper pose (rotation + translation).
    pub pose: Isometry3<f64>,

    /// Gripper opening width.
    pub width: f64,
}

impl Grasp {
    /// Creates a new grasp.
    #[must_use]
    pub const fn new(pose: Isometry3<f64>, width: f64) -> Self {
        Self { pose, width }
    }

    /// Returns the grasp re-expressed in voxel coordinates.
    ///
    /// The pose is first moved into the frame `base` (task frame relative to
    /// the volume origin), then translation and width are divided by
    /// `voxel_size`. Orientation is unchanged by the scaling.
    ///
    /// # Errors
    ///
    /// Returns [`GraspTypesError::InvalidVoxelSize`] if `voxel_size` is not a
    /// positive finite number.
    pub fn to_voxel_coordinates(&self, base: &Isometry3<f64>, voxel_size: f64) -> Result<Self> {
        check_voxel_size(voxel_size)?;
        let mut pose = base.inverse() * self.pose;
        pose.translation.vector /= voxel_size;
        Ok(Self::new(pose, self.width / voxel_size))
    }

    /// Inverse of [`Grasp::to_voxel_coordinates`].
    ///
    /// # Errors
    ///
    /// Returns [`GraspTypesError::InvalidVoxelSize`] if `voxel_size` is not a
    /// positive finite number.
    pub fn from_voxel_coordinates(&self, base: &Isometry3<f64>, voxel_size: f64) -> Result<Self> {
        check_voxel_size(voxel_size)?;
        let mut pose = self.pose;
        pose.translation.vector *= voxel_size;
        Ok(Self::new(base * pose, self.width * voxel_size))
    }

    /// The orientation rotated by a half turn about the approach axis.
    ///
    /// Applying this twice returns the original orientation (up to the sign
    /// of the quaternion).
    #[must_use]
    pub fn symmetric_rotation(&self) -> UnitQuaternion<f64> {
        self.pose.rotation * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI)
    }
}

impl Default for Grasp {
    /// Identity pose, closed gripper.
    fn default() -> Self {
        Self::new(Isometry3::identity(), 0.0)
    }
}

/// Quaternion components in scalar-last `[x, y, z, w]` order, as stored in
/// the rotation label volumes.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn quaternion_xyzw(rotation: &UnitQuaternion<f64>) -> [f32; 4] {
    let q = rotation.as_ref().coords;
    [q.x as f32, q.y as f32, q.z as f32, q.w as f32]
}

fn check_voxel_size(voxel_size: f64) -> Result<()> {
    if voxel_size.is_finite() && voxel_size > 0.0 {
        Ok(())
    } else {
        Err(GraspTypesError::InvalidVoxelSize(voxel_size))
    }
}
