//! Gripper geometry.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GraspTypesError, Result};

/// Geometry of a parallel-jaw gripper.
///
/// # Example
///
/// ```
/// use grasp_types::HandConfig;
///
/// let hand = HandConfig::from_json_str(r#"{"finger_depth": 0.05, "max_gripper_width": 0.08}"#).unwrap();
/// assert_eq!(hand.finger_depth, 0.05);
/// assert!((hand.workspace_size() - 0.32).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandConfig {
    /// Length of the fingers along the approach axis, in metres.
    pub finger_depth: f64,

    /// Maximum opening between the fingers, in metres.
    pub max_gripper_width: f64,
}

impl Default for HandConfig {
    /// A Franka Panda style gripper.
    fn default() -> Self {
        Self {
            finger_depth: 0.05,
            max_gripper_width: 0.08,
        }
    }
}

impl HandConfig {
    /// Creates a new hand configuration.
    #[must_use]
    pub const fn new(finger_depth: f64, max_gripper_width: f64) -> Self {
        Self {
            finger_depth,
            max_gripper_width,
        }
    }

    /// Parses and validates a hand configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the geometry is invalid.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let hand: Self = serde_json::from_str(json)?;
        hand.validate()?;
        Ok(hand)
    }

    /// Loads and validates a hand configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or the
    /// geometry is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Side length of the cubic workspace scanned for this hand.
    #[must_use]
    pub fn workspace_size(&self) -> f64 {
        4.0 * self.max_gripper_width
    }

    /// Checks that both dimensions are positive and finite.
    ///
    /// # Errors
    ///
    /// Returns [`GraspTypesError::InvalidHand`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.finger_depth.is_finite() && self.finger_depth > 0.0) {
            return Err(GraspTypesError::invalid_hand(format!(
                "finger_depth must be positive, got {}",
                self.finger_depth
            )));
        }
        if !(self.max_gripper_width.is_finite() && self.max_gripper_width > 0.0) {
            return Err(GraspTypesError::invalid_hand(format!(
                "max_gripper_width must be positive, got {}",
                self.max_gripper_width
            )));
        }
        Ok(())
    }
}
