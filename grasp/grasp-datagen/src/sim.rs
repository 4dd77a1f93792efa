//! Interface of the physics backend that builds scenes and executes grasps.

use grasp_perception::{CameraIntrinsic, DepthImage};
use grasp_types::Label;
use nalgebra::Isometry3;

use crate::error::SimulationError;

/// Result of one simulated grasp attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraspOutcome {
    /// Categorical outcome.
    pub label: Label,
    /// Gripper opening at the end of the attempt, in metres.
    pub width: f64,
}

impl GraspOutcome {
    /// Creates a new outcome.
    #[must_use]
    pub const fn new(label: Label, width: f64) -> Self {
        Self { label, width }
    }
}

/// A simulated grasping world.
///
/// The generator drives one backend per worker. Each scene is built by
/// [`reset_world`](Self::reset_world), snapshotted with
/// [`save_baseline_state`](Self::save_baseline_state), and every grasp attempt
/// is preceded by [`restore_baseline_state`](Self::restore_baseline_state) so
/// that attempts never observe each other's effects.
///
/// The workspace is the cube `[0, size]³` where `size` is four times the
/// maximum gripper opening.
pub trait GraspSimulation {
    /// Clears the world and drops a fresh random arrangement drawn from `object_set`.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene cannot be built.
    fn reset_world(&mut self, object_set: &str) -> Result<(), SimulationError>;

    /// Records the current world state as the baseline for this scene.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be captured.
    fn save_baseline_state(&mut self) -> Result<(), SimulationError>;

    /// Returns the world to the last saved baseline.
    ///
    /// # Errors
    ///
    /// Returns an error if no baseline exists or it cannot be restored.
    fn restore_baseline_state(&mut self) -> Result<(), SimulationError>;

    /// Intrinsics of the depth camera.
    fn intrinsic(&self) -> CameraIntrinsic;

    /// Renders a depth image from `extrinsic` (world → camera).
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render_depth(&mut self, extrinsic: &Isometry3<f64>) -> Result<DepthImage, SimulationError>;

    /// Executes a grasp with the gripper placed at `pose` (task frame).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails; an unsuccessful grasp is an
    /// outcome, not an error.
    fn attempt_grasp(&mut self, pose: &Isometry3<f64>) -> Result<GraspOutcome, SimulationError>;
}
