//! Camera placement around the workspace.

use std::f64::consts::{FRAC_PI_4, TAU};

use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Source of camera poses for multi-view reconstruction.
pub trait ViewpointSampler {
    /// Draws up to `count` world → camera extrinsics around a workspace of side `size`.
    ///
    /// Draws with no valid camera orientation are dropped, so the result may
    /// be shorter than `count`.
    fn sample<R: Rng + ?Sized>(&self, size: f64, count: usize, rng: &mut R)
    -> Vec<Isometry3<f64>>;
}

/// Samples cameras on a spherical cap above the workspace, all looking at
/// the centre of the table `(size/2, size/2, 0)`.
///
/// A draw whose eye coincides with the target has no viewing direction and
/// is dropped with a `debug!` event.
///
/// # Example
///
/// ```
/// use grasp_perception::{HemisphereSampler, ViewpointSampler};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let sampler = HemisphereSampler::default();
/// let mut rng = ChaCha8Rng::seed_from_u64(0);
///
/// for extrinsic in sampler.sample(0.3, 8, &mut rng) {
///     let eye = extrinsic.inverse().translation.vector;
///     assert!(eye.z > 0.0);
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HemisphereSampler {
    /// Camera distance range as multiples of the workspace size, `[min, max)`.
    pub radius_range: (f64, f64),

    /// Largest angle between the viewing ray and the vertical, in radians.
    pub max_polar_angle: f64,
}

impl Default for HemisphereSampler {
    fn default() -> Self {
        Self {
            radius_range: (1.6, 2.4),
            max_polar_angle: FRAC_PI_4,
        }
    }
}

impl HemisphereSampler {
    /// Sets the camera distance range (multiples of the workspace size).
    #[must_use]
    pub const fn with_radius_range(mut self, min: f64, max: f64) -> Self {
        self.radius_range = (min, max);
        self
    }

    /// Sets the largest polar angle.
    #[must_use]
    pub const fn with_max_polar_angle(mut self, angle: f64) -> Self {
        self.max_polar_angle = angle;
        self
    }
}

impl ViewpointSampler for HemisphereSampler {
    fn sample<R: Rng + ?Sized>(
        &self,
        size: f64,
        count: usize,
        rng: &mut R,
    ) -> Vec<Isometry3<f64>> {
        let target = Point3::new(size / 2.0, size / 2.0, 0.0);
        let (min_radius, max_radius) = self.radius_range;

        (0..count)
            .filter_map(|_| {
                let radius = size * uniform(rng, min_radius, max_radius);
                let theta = uniform(rng, 0.0, self.max_polar_angle);
                let phi = uniform(rng, 0.0, TAU);
                let eye = target
                    + radius
                        * Vector3::new(
                            theta.sin() * phi.cos(),
                            theta.sin() * phi.sin(),
                            theta.cos(),
                        );
                let extrinsic = look_at(&eye, &target, &Vector3::z())
                    .or_else(|| look_at(&eye, &target, &Vector3::y()));
                if extrinsic.is_none() {
                    debug!(radius, theta, phi, "Dropped degenerate viewpoint");
                }
                extrinsic
            })
            .collect()
    }
}

/// Draws from `[low, high)`, or returns `low` for an empty range.
fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

/// World → camera extrinsic of a camera at `eye` looking at `target`.
///
/// The camera's Z axis points at the target and its Y axis points away from
/// `up` (image rows grow downwards). Returns `None` when the viewing
/// direction is parallel to `up` or `eye == target`.
///
/// # Example
///
/// ```
/// use grasp_perception::look_at;
/// use nalgebra::{Point3, Vector3};
///
/// let extrinsic = look_at(
///     &Point3::new(0.0, -1.0, 0.0),
///     &Point3::origin(),
///     &Vector3::z(),
/// ).unwrap();
///
/// // The target lies straight ahead of the camera.
/// let target = extrinsic.transform_point(&Point3::origin());
/// assert!((target.coords - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
/// ```
#[must_use]
pub fn look_at(
    eye: &Point3<f64>,
    target: &Point3<f64>,
    up: &Vector3<f64>,
) -> Option<Isometry3<f64>> {
    let forward = (target - eye).try_normalize(1e-12)?;
    let right = forward.cross(up).try_normalize(1e-9)?;
    let down = forward.cross(&right);

    let camera_to_world = Isometry3::from_parts(
        Translation3::from(eye.coords),
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(
            Matrix3::from_columns(&[right, down, forward]),
        )),
    );
    Some(camera_to_world.inverse())
}
