//! Dense truncated signed distance volume.

use grasp_types::PointCloud;
use nalgebra::{Isometry3, Point3, Vector3};
use ndarray::{Array3, Zip};
use tracing::debug;

use crate::camera::{CameraIntrinsic, DepthImage};
use crate::error::{PerceptionError, Result};
use crate::volume::ReconstructionVolume;

/// Truncation distance in voxels.
const TRUNCATION_VOXELS: f64 = 4.0;

/// Fused values at or beyond this magnitude are left out of the dense grid.
const GRID_BAND: f32 = 0.98;

/// A dense truncated signed distance function (TSDF) volume.
///
/// Each voxel stores the running weighted average of the projective signed
/// distance to the observed surface, divided by the truncation distance and
/// clamped above at 1.0. Positive values lie in front of the surface (free
/// space), negative values behind it. Voxels further than the truncation
/// distance behind the surface are never updated.
///
/// [`dense_grid`](ReconstructionVolume::dense_grid) exports the field in
/// `[0, 1]`: observed voxels with `|tsdf| < 0.98` map to `(tsdf + 1) / 2`, so
/// the surface sits at 0.5. Unobserved voxels and the clamped free space
/// beyond the band read 0.
///
/// Voxel `[i, j, k]` is centred at `((i + ½)·s, (j + ½)·s, (k + ½)·s)` where
/// `s` is the voxel size.
///
/// # Example
///
/// ```
/// use grasp_perception::{ReconstructionVolume, TsdfVolume};
///
/// let volume = TsdfVolume::new(0.32, 40).unwrap();
/// assert_eq!(volume.resolution(), 40);
/// assert!((volume.truncation() - 0.032).abs() < 1e-12);
/// assert_eq!(volume.dense_grid().shape(), &[40, 40, 40]);
/// ```
#[derive(Debug, Clone)]
pub struct TsdfVolume {
    size: f64,
    resolution: usize,
    voxel_size: f64,
    truncation: f64,
    tsdf: Array3<f32>,
    weight: Array3<f32>,
}

impl TsdfVolume {
    /// Distance beyond which signed distances are clamped.
    #[must_use]
    pub const fn truncation(&self) -> f64 {
        self.truncation
    }

    /// World-space centre of voxel `[i, j, k]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn voxel_center(&self, [i, j, k]: [usize; 3]) -> Point3<f64> {
        Point3::new(
            (i as f64 + 0.5) * self.voxel_size,
            (j as f64 + 0.5) * self.voxel_size,
            (k as f64 + 0.5) * self.voxel_size,
        )
    }

    /// Number of voxels updated by at least one observation.
    #[must_use]
    pub fn observed_voxel_count(&self) -> usize {
        self.weight.iter().filter(|w| **w > 0.0).count()
    }

    /// Fused value at `index`, or `None` if never observed.
    fn observed(&self, index: [usize; 3]) -> Option<f32> {
        let weight = *self.weight.get(index)?;
        (weight > 0.0).then(|| self.tsdf[index])
    }

    /// Central-difference gradient of the field, one-sided next to
    /// unobserved voxels.
    fn gradient(&self, index: [usize; 3]) -> Vector3<f64> {
        let center = self.tsdf[index];
        let mut gradient = Vector3::zeros();
        for axis in 0..3 {
            let mut forward = index;
            forward[axis] += 1;
            let forward = self.observed(forward);
            let backward = index[axis].checked_sub(1).and_then(|prev| {
                let mut backward = index;
                backward[axis] = prev;
                self.observed(backward)
            });
            gradient[axis] = f64::from(match (forward, backward) {
                (Some(f), Some(b)) => 0.5 * (f - b),
                (Some(f), None) => f - center,
                (None, Some(b)) => center - b,
                (None, None) => 0.0,
            });
        }
        gradient
    }
}

impl ReconstructionVolume for TsdfVolume {
    fn new(size: f64, resolution: usize) -> Result<Self> {
        if !(size.is_finite() && size > 0.0) {
            return Err(PerceptionError::InvalidSize(size));
        }
        if resolution == 0 {
            return Err(PerceptionError::InvalidResolution(resolution));
        }
        #[allow(clippy::cast_precision_loss)]
        let voxel_size = size / resolution as f64;
        let shape = (resolution, resolution, resolution);
        Ok(Self {
            size,
            resolution,
            voxel_size,
            truncation: TRUNCATION_VOXELS * voxel_size,
            tsdf: Array3::zeros(shape),
            weight: Array3::zeros(shape),
        })
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn integrate(
        &mut self,
        depth: &DepthImage,
        intrinsic: &CameraIntrinsic,
        extrinsic: &Isometry3<f64>,
    ) -> Result<()> {
        intrinsic.validate()?;
        if depth.width() != intrinsic.width || depth.height() != intrinsic.height {
            return Err(PerceptionError::CameraMismatch {
                image_width: depth.width(),
                image_height: depth.height(),
                camera_width: intrinsic.width,
                camera_height: intrinsic.height,
            });
        }

        let voxel_size = self.voxel_size;
        let truncation = self.truncation;
        let width = f64::from(intrinsic.width);
        let height = f64::from(intrinsic.height);
        let mut updated = 0usize;

        Zip::indexed(&mut self.tsdf)
            .and(&mut self.weight)
            .for_each(|(i, j, k), value, weight| {
                let center = Point3::new(
                    (i as f64 + 0.5) * voxel_size,
                    (j as f64 + 0.5) * voxel_size,
                    (k as f64 + 0.5) * voxel_size,
                );
                let in_camera = extrinsic.transform_point(&center);
                let Some((u, v)) = intrinsic.project(&in_camera) else {
                    return;
                };
                let (u, v) = (u.round(), v.round());
                if u < 0.0 || v < 0.0 || u >= width || v >= height {
                    return;
                }
                let Some(measured) = depth.get(u as u32, v as u32) else {
                    return;
                };

                let sdf = f64::from(measured) - in_camera.z;
                if sdf < -truncation {
                    return;
                }
                let observation = (sdf / truncation).min(1.0) as f32;
                *value = (*value * *weight + observation) / (*weight + 1.0);
                *weight += 1.0;
                updated += 1;
            });

        debug!(
            updated,
            valid_pixels = depth.valid_pixel_count(),
            resolution = self.resolution,
            "Integrated depth image"
        );
        Ok(())
    }

    fn size(&self) -> f64 {
        self.size
    }

    fn resolution(&self) -> usize {
        self.resolution
    }

    fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    fn dense_grid(&self) -> Array3<f32> {
        Zip::from(&self.tsdf)
            .and(&self.weight)
            .map_collect(|&value, &weight| {
                if weight > 0.0 && value.abs() < GRID_BAND {
                    (value + 1.0) / 2.0
                } else {
                    0.0
                }
            })
    }

    fn extract_point_cloud(&self) -> PointCloud {
        let mut cloud = PointCloud::new();

        for ((i, j, k), &weight) in self.weight.indexed_iter() {
            if weight <= 0.0 {
                continue;
            }
            let index = [i, j, k];
            let a = self.tsdf[index];

            for axis in 0..3 {
                let mut neighbor = index;
                neighbor[axis] += 1;
                let Some(b) = self.observed(neighbor) else {
                    continue;
                };
                // zero crossing between the two voxel centres
                if (a < 0.0) == (b < 0.0) {
                    continue;
                }

                let t = f64::from(a / (a - b));
                let start = self.voxel_center(index);
                let end = self.voxel_center(neighbor);
                let point = start + (end - start) * t;

                let normal = self.gradient(index).lerp(&self.gradient(neighbor), t);
                if let Some(normal) = normal.try_normalize(1e-12) {
                    cloud.push(point, normal);
                }
            }
        }

        debug!(
            points = cloud.len(),
            resolution = self.resolution,
            "Extracted point cloud"
        );
        cloud
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewpoint::look_at;

    /// Renders a horizontal plane at height `plane_z` as seen from `extrinsic`.
    #[allow(clippy::cast_possible_truncation)]
    fn render_plane(
        intrinsic: &CameraIntrinsic,
        extrinsic: &Isometry3<f64>,
        plane_z: f64,
    ) -> DepthImage {
        let camera_to_world = extrinsic.inverse();
        let origin = camera_to_world.translation.vector;
        let mut depths = Vec::new();
        for v in 0..intrinsic.height {
            for u in 0..intrinsic.width {
                let ray = camera_to_world.rotation * intrinsic.ray(f64::from(u), f64::from(v));
                let t = if ray.z.abs() < 1e-12 {
                    0.0
                } else {
                    (plane_z - origin.z) / ray.z
                };
                depths.push(if t > 0.0 { t as f32 } else { 0.0 });
            }
        }
        DepthImage::new(intrinsic.width, intrinsic.height, depths).unwrap()
    }

    fn camera() -> CameraIntrinsic {
        CameraIntrinsic::new(96, 72, 80.0, 80.0, 47.5, 35.5)
    }

    #[test]
    fn new_rejects_invalid_geometry() {
        assert!(matches!(
            TsdfVolume::new(0.0, 10),
            Err(PerceptionError::InvalidSize(_))
        ));
        assert!(matches!(
            TsdfVolume::new(0.3, 0),
            Err(PerceptionError::InvalidResolution(0))
        ));
    }

    #[test]
    fn integrate_rejects_mismatched_image() {
        let mut volume = TsdfVolume::new(0.3, 10).unwrap();
        let result = volume.integrate(
            &DepthImage::empty(10, 10),
            &camera(),
            &Isometry3::identity(),
        );
        assert!(matches!(result, Err(PerceptionError::CameraMismatch { .. })));
    }

    #[test]
    fn empty_depth_leaves_volume_unobserved() {
        let mut volume = TsdfVolume::new(0.3, 10).unwrap();
        let intrinsic = camera();
        let extrinsic = look_at(
            &Point3::new(0.15, 0.05, 0.6),
            &Point3::new(0.15, 0.15, 0.0),
            &Vector3::z(),
        )
        .unwrap();

        volume
            .integrate(
                &DepthImage::empty(intrinsic.width, intrinsic.height),
                &intrinsic,
                &extrinsic,
            )
            .unwrap();

        assert_eq!(volume.observed_voxel_count(), 0);
        assert!(volume.dense_grid().iter().all(|v| *v == 0.0));
        assert!(volume.extract_point_cloud().is_empty());
    }

    #[test]
    fn fused_plane_yields_points_on_plane_with_upward_normals() {
        let plane_z = 0.1;
        let mut volume = TsdfVolume::new(0.3, 30).unwrap();
        let intrinsic = camera();
        let extrinsic = look_at(
            &Point3::new(0.15, 0.05, 0.6),
            &Point3::new(0.15, 0.15, 0.0),
            &Vector3::z(),
        )
        .unwrap();

        let depth = render_plane(&intrinsic, &extrinsic, plane_z);
        volume.integrate(&depth, &intrinsic, &extrinsic).unwrap();

        let cloud = volume.extract_point_cloud();
        assert!(cloud.len() > 100);
        for (point, normal) in cloud.iter() {
            assert!((point.z - plane_z).abs() < 0.005, "point {point:?} off plane");
            assert!(normal.z > 0.9, "normal {normal:?} not upward");
            assert!((normal.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn dense_grid_centres_surface_at_one_half() {
        let plane_z = 0.1;
        let mut volume = TsdfVolume::new(0.3, 30).unwrap();
        let intrinsic = camera();
        let extrinsic = look_at(
            &Point3::new(0.15, 0.05, 0.6),
            &Point3::new(0.15, 0.15, 0.0),
            &Vector3::z(),
        )
        .unwrap();
        volume
            .integrate(
                &render_plane(&intrinsic, &extrinsic, plane_z),
                &intrinsic,
                &extrinsic,
            )
            .unwrap();

        let grid = volume.dense_grid();
        assert!(grid.iter().all(|v| (0.0..=1.0).contains(v)));
        // voxel centre z = 0.125, inside the truncation band above the plane
        let above = grid[[15, 15, 12]];
        assert!(above > 0.5 && above < 1.0, "above {above}");
        // voxel centre z = 0.085, just below the plane
        let below = grid[[15, 15, 8]];
        assert!(below > 0.0 && below < 0.5, "below {below}");
        // observed free space far above the plane is clamped out of the band
        assert!(volume.observed([15, 15, 25]).is_some());
        assert_eq!(grid[[15, 15, 25]], 0.0);
        // far below the plane: behind truncation, never observed
        assert_eq!(grid[[15, 15, 0]], 0.0);
    }
}
