//! Grasp candidate sampling on a reconstructed surface.

use grasp_types::PointCloud;
use nalgebra::{Point3, Vector3};
use rand::Rng;

/// Fraction of the finger depth by which a candidate may miss the nominal
/// contact depth on either side.
pub const GRASP_DEPTH_MARGIN: f64 = 0.2;

/// Draws a raw grasp position and its surface normal.
///
/// A point is picked uniformly from `cloud`. A grasp depth `d` is drawn from
/// `[-ε·f, (1+ε)·f)` with `f = finger_depth` and `ε` =
/// [`GRASP_DEPTH_MARGIN`], and the point is moved along its outward normal by
/// `f - d`. Returns `None` for an empty cloud.
///
/// # Example
///
/// ```
/// use grasp_datagen::sample_grasp_point;
/// use grasp_types::PointCloud;
/// use nalgebra::{Point3, Vector3};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let mut cloud = PointCloud::new();
/// cloud.push(Point3::new(0.1, 0.1, 0.05), Vector3::z());
///
/// let mut rng = ChaCha8Rng::seed_from_u64(0);
/// let (point, normal) = sample_grasp_point(&cloud, 0.05, &mut rng).unwrap();
///
/// assert_eq!(normal, Vector3::z());
/// assert!(point.z >= 0.05 - 0.01 && point.z <= 0.05 + 0.06);
/// ```
pub fn sample_grasp_point<R: Rng + ?Sized>(
    cloud: &PointCloud,
    finger_depth: f64,
    rng: &mut R,
) -> Option<(Point3<f64>, Vector3<f64>)> {
    if cloud.is_empty() {
        return None;
    }
    let (point, normal) = cloud.get(rng.gen_range(0..cloud.len()))?;

    let low = -GRASP_DEPTH_MARGIN * finger_depth;
    let high = (1.0 + GRASP_DEPTH_MARGIN) * finger_depth;
    let grasp_depth = if high > low {
        rng.gen_range(low..high)
    } else {
        low
    };

    Some((point + normal * (finger_depth - grasp_depth), normal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn empty_cloud_yields_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(sample_grasp_point(&PointCloud::new(), 0.05, &mut rng).is_none());
    }

    #[test]
    fn samples_every_point_eventually() {
        let mut cloud = PointCloud::new();
        for i in 0..4 {
            cloud.push(Point3::new(f64::from(i), 0.0, 0.0), Vector3::z());
        }
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut seen = [false; 4];
        for _ in 0..200 {
            let (point, _) = sample_grasp_point(&cloud, 0.05, &mut rng).unwrap();
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let idx = point.x.round() as usize;
            seen[idx] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    proptest! {
        #[test]
        fn offset_stays_within_margin(seed in any::<u64>(), finger_depth in 0.001f64..0.2) {
            let origin = Point3::new(0.1, 0.2, 0.3);
            let normal = Vector3::new(1.0, 2.0, 2.0).normalize();
            let mut cloud = PointCloud::new();
            cloud.push(origin, normal);

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let (point, returned_normal) =
                sample_grasp_point(&cloud, finger_depth, &mut rng).unwrap();

            prop_assert_eq!(returned_normal, normal);
            let offset = point - origin;
            // displacement is parallel to the normal
            prop_assert!(offset.cross(&normal).norm() < 1e-9);
            let along = offset.dot(&normal);
            prop_assert!(along >= -GRASP_DEPTH_MARGIN * finger_depth - 1e-12);
            prop_assert!(along <= (1.0 + GRASP_DEPTH_MARGIN) * finger_depth + 1e-12);
        }
    }
}
