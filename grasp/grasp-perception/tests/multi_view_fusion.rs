//! Integration tests for fusing several hemisphere views into a TSDF volume.

use grasp_perception::{
    CameraIntrinsic, DepthImage, HemisphereSampler, ReconstructionVolume, TsdfVolume,
    ViewpointSampler,
};
use nalgebra::Isometry3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const SIZE: f64 = 0.3;
const TABLE_HEIGHT: f64 = 0.05;

fn camera() -> CameraIntrinsic {
    CameraIntrinsic::new(120, 90, 100.0, 100.0, 59.5, 44.5)
}

/// Ray-casts a horizontal table top at `TABLE_HEIGHT`.
#[allow(clippy::cast_possible_truncation)]
fn render_table(intrinsic: &CameraIntrinsic, extrinsic: &Isometry3<f64>) -> DepthImage {
    let camera_to_world = extrinsic.inverse();
    let origin = camera_to_world.translation.vector;
    let mut depths = Vec::with_capacity((intrinsic.width * intrinsic.height) as usize);
    for v in 0..intrinsic.height {
        for u in 0..intrinsic.width {
            let ray = camera_to_world.rotation * intrinsic.ray(f64::from(u), f64::from(v));
            let t = (TABLE_HEIGHT - origin.z) / ray.z;
            depths.push(if t.is_finite() && t > 0.0 { t as f32 } else { 0.0 });
        }
    }
    DepthImage::new(intrinsic.width, intrinsic.height, depths).unwrap()
}

fn fuse(resolution: usize, views: &[Isometry3<f64>]) -> TsdfVolume {
    let intrinsic = camera();
    let mut volume = TsdfVolume::new(SIZE, resolution).unwrap();
    for extrinsic in views {
        let depth = render_table(&intrinsic, extrinsic);
        volume.integrate(&depth, &intrinsic, extrinsic).unwrap();
    }
    volume
}

#[test]
fn coarse_and_fine_volumes_agree_on_the_table() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let views = HemisphereSampler::default().sample(SIZE, 6, &mut rng);

    let coarse = fuse(20, &views);
    let fine = fuse(40, &views);

    assert_eq!(coarse.dense_grid().shape(), &[20, 20, 20]);
    assert_eq!(fine.dense_grid().shape(), &[40, 40, 40]);

    for volume in [&coarse, &fine] {
        let cloud = volume.extract_point_cloud();
        assert!(!cloud.is_empty());
        for (point, normal) in cloud.iter() {
            assert!(
                (point.z - TABLE_HEIGHT).abs() < volume.voxel_size() / 2.0,
                "point {point:?} off the table"
            );
            assert!(normal.z > 0.9);
        }
    }

    assert!(fine.extract_point_cloud().len() > coarse.extract_point_cloud().len());
}

#[test]
fn more_views_observe_more_voxels() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let views = HemisphereSampler::default().sample(SIZE, 4, &mut rng);

    let one = fuse(20, &views[..1]);
    let four = fuse(20, &views);

    assert!(four.observed_voxel_count() >= one.observed_voxel_count());
}
