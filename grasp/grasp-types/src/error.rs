//! Error types for the grasp data model.

use thiserror::Error;

/// Errors that can occur when building or converting grasp data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GraspTypesError {
    /// The voxel size must be positive and finite.
    #[error("voxel size must be positive, got {0}")]
    InvalidVoxelSize(f64),

    /// A numeric code does not name a known outcome label.
    #[error("unknown label code {0}")]
    UnknownLabel(u8),

    /// Hand geometry failed validation.
    #[error("invalid hand configuration: {0}")]
    InvalidHand(String),

    /// Point and normal buffers disagree in length.
    #[error("point cloud has {points} points but {normals} normals")]
    MismatchedCloud {
        /// Number of points.
        points: usize,
        /// Number of normals.
        normals: usize,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl GraspTypesError {
    /// Creates an invalid hand error.
    #[must_use]
    pub fn invalid_hand(reason: impl Into<String>) -> Self {
        Self::InvalidHand(reason.into())
    }
}

impl From<std::io::Error> for GraspTypesError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GraspTypesError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for grasp data model operations.
pub type Result<T> = std::result::Result<T, GraspTypesError>;
