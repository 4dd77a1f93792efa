//! Error types for grasp data generation.

use std::path::PathBuf;

use grasp_perception::PerceptionError;
use grasp_types::GraspTypesError;
use thiserror::Error;

/// Failures reported by a simulation backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimulationError {
    /// The world could not be reset to a fresh arrangement.
    #[error("failed to set up scene from object set {object_set}: {reason}")]
    SceneSetup {
        /// Object set that was being loaded.
        object_set: String,
        /// Reason for failure.
        reason: String,
    },

    /// The baseline state could not be saved.
    #[error("failed to save baseline state: {0}")]
    SaveFailed(String),

    /// The baseline state could not be restored.
    #[error("failed to restore baseline state: {0}")]
    RestoreFailed(String),

    /// A depth image could not be rendered.
    #[error("depth rendering failed: {0}")]
    Render(String),

    /// Any other backend failure.
    #[error("simulation backend error: {0}")]
    Backend(String),
}

impl SimulationError {
    /// Creates a scene setup error.
    #[must_use]
    pub fn scene_setup(object_set: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SceneSetup {
            object_set: object_set.into(),
            reason: reason.into(),
        }
    }

    /// Creates a restore failure.
    #[must_use]
    pub fn restore_failed(reason: impl Into<String>) -> Self {
        Self::RestoreFailed(reason.into())
    }

    /// Creates a backend error.
    #[must_use]
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend(reason.into())
    }
}

/// Errors that abort a generation worker.
///
/// Per-scene problems that only cost one scene (an empty reconstruction, an
/// exhausted attempt budget) are not errors; they are reported through
/// [`crate::SceneOutcome`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    /// The simulation backend failed.
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// Depth fusion failed.
    #[error(transparent)]
    Perception(#[from] PerceptionError),

    /// A grasp could not be converted.
    #[error(transparent)]
    Grasp(#[from] GraspTypesError),

    /// No grasp frame can be built from this surface normal.
    #[error("degenerate grasp frame for normal [{}, {}, {}]", .normal[0], .normal[1], .normal[2])]
    DegenerateFrame {
        /// The offending normal.
        normal: [f64; 3],
    },

    /// The output directory never appeared for a non-zero rank.
    #[error("output directory {} not available after {attempts} attempts", .path.display())]
    OutputDirUnavailable {
        /// Directory that was awaited.
        path: PathBuf,
        /// Number of checks performed.
        attempts: u32,
    },

    /// A volume does not have the expected cubic shape.
    #[error("expected a cubic grid, got shape {0:?}")]
    NonCubicGrid(Vec<usize>),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Reading or writing an npz archive failed.
    #[error("archive error: {0}")]
    Archive(String),
}

impl GenerationError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates an archive error.
    #[must_use]
    pub fn archive(reason: impl Into<String>) -> Self {
        Self::Archive(reason.into())
    }
}

impl From<std::io::Error> for GenerationError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<ndarray_npy::WriteNpzError> for GenerationError {
    fn from(err: ndarray_npy::WriteNpzError) -> Self {
        Self::Archive(err.to_string())
    }
}

impl From<ndarray_npy::ReadNpzError> for GenerationError {
    fn from(err: ndarray_npy::ReadNpzError) -> Self {
        Self::Archive(err.to_string())
    }
}

/// Result type for grasp data generation.
pub type Result<T> = std::result::Result<T, GenerationError>;
