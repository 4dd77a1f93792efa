//! Simulated grasp data generation.
//!
//! This crate turns a physics backend into training data for volumetric
//! grasp-quality networks. For every scene a worker:
//!
//! 1. Resets the simulation to a fresh random arrangement and saves it as a baseline
//! 2. Fuses a random number of depth views into a coarse and a fine volume
//! 3. Samples grasp candidates on the fine surface ([`sample_grasp_point`])
//! 4. Sweeps yaw about each candidate's approach axis ([`evaluate_grasp_point`])
//! 5. Keeps candidates under a class-balancing rule ([`CandidatePool`])
//! 6. Rasterizes the kept grasps into label volumes ([`LabelVolumes`]) and
//!    writes them to a compressed archive ([`store_sample`])
//!
//! The backend is any [`GraspSimulation`]; reconstruction and viewpoint
//! sampling default to the reference implementations in `grasp-perception`.
//!
//! # Parallel Workers
//!
//! Workers are independent processes distinguished by
//! [`GenerationConfig::rank`]. Rank 0 creates the output directory, the
//! others wait for it. Every archive has a random UUID name, so workers never
//! write the same file.
//!
//! # Example
//!
//! ```
//! use grasp_datagen::{CandidatePool, select_widest_peak};
//! use grasp_types::{Grasp, Label};
//!
//! // Yaw sweep outcomes: success at indices 1, 2 and 4.
//! let idx = select_widest_peak(&[false, true, true, false, true]);
//! assert_eq!(idx, Some(1));
//!
//! let mut pool = CandidatePool::new(2);
//! assert!(pool.offer(Grasp::default(), Label::Collision));
//! assert!(!pool.offer(Grasp::default(), Label::Slipped));
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod error;
mod evaluate;
mod generator;
mod labels;
mod output;
mod pool;
mod sampler;
mod sim;
pub mod store;

pub use config::{DirWaitPolicy, GenerationConfig, SimulationSettings};
pub use error::{GenerationError, Result, SimulationError};
pub use evaluate::{evaluate_grasp_point, grasp_frame, select_widest_peak, yaw_angles};
pub use generator::{GenerationReport, SceneGenerator, SceneOutcome};
pub use labels::LabelVolumes;
pub use output::{prepare_output_dir, sample_path};
pub use pool::CandidatePool;
pub use sampler::{GRASP_DEPTH_MARGIN, sample_grasp_point};
pub use sim::{GraspOutcome, GraspSimulation};
pub use store::{load_sample, store_sample};
