//! Depth fusion and viewpoint sampling for grasp data generation.
//!
//! This crate provides the perception side of the pipeline:
//!
//! - [`CameraIntrinsic`] and [`DepthImage`] - Pinhole camera model and depth frames
//! - [`ReconstructionVolume`] - Interface of a volumetric fusion engine
//! - [`TsdfVolume`] - Dense truncated signed distance volume
//! - [`ViewpointSampler`] and [`HemisphereSampler`] - Camera placement around the workspace
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies** and no simulation
//! backend. Depth images come from whatever renderer the caller plugs in.
//!
//! # Conventions
//!
//! - Camera frames follow the pinhole convention: X right, Y down, Z forward.
//! - Extrinsics are **world → camera** transforms.
//! - A volume of side `size` spans `[0, size]³` in world coordinates.
//!
//! # Example
//!
//! ```
//! use grasp_perception::{HemisphereSampler, ReconstructionVolume, TsdfVolume, ViewpointSampler};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let volume = TsdfVolume::new(0.3, 40).unwrap();
//! assert!((volume.voxel_size() - 0.0075).abs() < 1e-12);
//! assert!(volume.extract_point_cloud().is_empty());
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//! let views = HemisphereSampler::default().sample(0.3, 4, &mut rng);
//! assert_eq!(views.len(), 4);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod camera;
mod error;
mod tsdf;
mod viewpoint;
mod volume;

pub use camera::{CameraIntrinsic, DepthImage};
pub use error::{PerceptionError, Result};
pub use tsdf::TsdfVolume;
pub use viewpoint::{HemisphereSampler, ViewpointSampler, look_at};
pub use volume::ReconstructionVolume;
