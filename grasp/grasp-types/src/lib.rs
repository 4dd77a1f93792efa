//! Core data model for grasp-quality training data.
//!
//! This crate provides the types shared by every stage of the grasp data
//! generation pipeline:
//!
//! - [`Grasp`] - Gripper pose at closure plus opening width
//! - [`Label`] - Categorical outcome of one simulated grasp attempt
//! - [`HandConfig`] - Gripper geometry (finger depth, maximum opening)
//! - [`PointCloud`] - Surface points with outward normals
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies** and no simulation
//! backend. It can be shared between data generation workers, training
//! pipelines and dataset inspection tools.
//!
//! # Coordinate Systems
//!
//! Grasps live in one of two frames:
//! - **Task frame**: continuous `f64` metres, origin at the workspace corner
//! - **Voxel frame**: the task frame scaled by `1 / voxel_size`
//!
//! Conversion between the two always produces a new [`Grasp`]; a grasp is
//! never rescaled in place.
//!
//! # Example
//!
//! ```
//! use grasp_types::{Grasp, Label};
//! use nalgebra::{Isometry3, Translation3, UnitQuaternion};
//!
//! let pose = Isometry3::from_parts(
//!     Translation3::new(0.15, 0.15, 0.05),
//!     UnitQuaternion::identity(),
//! );
//! let grasp = Grasp::new(pose, 0.04);
//!
//! let voxel = grasp.to_voxel_coordinates(&Isometry3::identity(), 0.0075).unwrap();
//! assert!((voxel.pose.translation.vector.x - 20.0).abs() < 1e-9);
//!
//! assert!(Label::Success.is_success());
//! assert!(Label::Success > Label::Slipped);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod grasp;
mod hand;
mod label;
mod pointcloud;

pub use error::{GraspTypesError, Result};
pub use grasp::{Grasp, quaternion_xyzw};
pub use hand::HandConfig;
pub use label::Label;
pub use pointcloud::PointCloud;

// Re-export nalgebra types for convenience
pub use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};
