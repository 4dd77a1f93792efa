//! Generation configuration.

use std::path::PathBuf;

use grasp_types::HandConfig;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

/// Configuration of one generation worker.
///
/// # Example
///
/// ```
/// use grasp_datagen::GenerationConfig;
///
/// let config = GenerationConfig::new("blocks", "/tmp/grasps")
///     .with_num_scenes(10)
///     .with_grasps_per_scene(40)
///     .with_rank(2)
///     .with_seed(7);
///
/// assert_eq!(config.resolution, 40);
/// assert_eq!(config.num_rotations, 12);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Object set selector passed to the simulation on every reset.
    pub object_set: String,

    /// Gripper geometry.
    pub hand: HandConfig,

    /// Number of scenes this worker attempts.
    pub num_scenes: usize,

    /// Labeled grasps collected per scene.
    pub num_grasps_per_scene: usize,

    /// Directory receiving one archive per written scene.
    pub root_dir: PathBuf,

    /// Rank of this worker in a parallel run. Rank 0 creates `root_dir`.
    pub rank: usize,

    /// Voxels per axis of the volume stored as network input.
    pub resolution: usize,

    /// Voxels per axis of the volume used for surface extraction.
    pub high_resolution: usize,

    /// Mean number of depth views per scene (at least one view is always rendered).
    pub expected_num_viewpoints: f64,

    /// Yaw angles tried per grasp candidate, spread over a half turn.
    pub num_rotations: usize,

    /// Candidates evaluated per scene before the scene is abandoned.
    pub max_attempts_per_scene: usize,

    /// Random seed; `None` seeds from entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// How non-zero ranks wait for the output directory.
    #[serde(default)]
    pub dir_wait: DirWaitPolicy,

    /// Settings forwarded to the simulation backend.
    #[serde(default)]
    pub simulation: SimulationSettings,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            object_set: String::from("blocks"),
            hand: HandConfig::default(),
            num_scenes: 1000,
            num_grasps_per_scene: 120,
            root_dir: PathBuf::from("data/raw"),
            rank: 0,
            resolution: 40,
            high_resolution: 160,
            expected_num_viewpoints: 8.0,
            num_rotations: 12,
            max_attempts_per_scene: 10_000,
            seed: None,
            dir_wait: DirWaitPolicy::default(),
            simulation: SimulationSettings::default(),
        }
    }
}

impl GenerationConfig {
    /// Creates a config for an object set and output directory with default parameters.
    #[must_use]
    pub fn new(object_set: impl Into<String>, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            object_set: object_set.into(),
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    /// Sets the hand geometry.
    #[must_use]
    pub const fn with_hand(mut self, hand: HandConfig) -> Self {
        self.hand = hand;
        self
    }

    /// Sets the number of scenes.
    #[must_use]
    pub const fn with_num_scenes(mut self, num_scenes: usize) -> Self {
        self.num_scenes = num_scenes;
        self
    }

    /// Sets the per-scene grasp quota.
    #[must_use]
    pub const fn with_grasps_per_scene(mut self, quota: usize) -> Self {
        self.num_grasps_per_scene = quota;
        self
    }

    /// Sets the worker rank.
    #[must_use]
    pub const fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    /// Sets the coarse and fine volume resolutions.
    #[must_use]
    pub const fn with_resolutions(mut self, resolution: usize, high_resolution: usize) -> Self {
        self.resolution = resolution;
        self.high_resolution = high_resolution;
        self
    }

    /// Sets the mean number of views per scene.
    #[must_use]
    pub const fn with_expected_viewpoints(mut self, expected: f64) -> Self {
        self.expected_num_viewpoints = expected;
        self
    }

    /// Sets the number of yaw angles per candidate.
    #[must_use]
    pub const fn with_num_rotations(mut self, num_rotations: usize) -> Self {
        self.num_rotations = num_rotations;
        self
    }

    /// Sets the per-scene attempt budget.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts_per_scene = max_attempts;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the output directory wait policy.
    #[must_use]
    pub const fn with_dir_wait(mut self, dir_wait: DirWaitPolicy) -> Self {
        self.dir_wait = dir_wait;
        self
    }

    /// Sets the simulation backend settings.
    #[must_use]
    pub fn with_simulation(mut self, simulation: SimulationSettings) -> Self {
        self.simulation = simulation;
        self
    }

    /// Side length of the cubic workspace.
    #[must_use]
    pub fn workspace_size(&self) -> f64 {
        self.hand.workspace_size()
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] (or the hand's validation
    /// error) describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.hand.validate()?;
        if self.num_grasps_per_scene == 0 {
            return Err(GenerationError::invalid_config(
                "num_grasps_per_scene must be at least 1",
            ));
        }
        if self.resolution == 0 || self.high_resolution == 0 {
            return Err(GenerationError::invalid_config(format!(
                "resolutions must be at least 1, got {} and {}",
                self.resolution, self.high_resolution
            )));
        }
        if !(self.expected_num_viewpoints.is_finite() && self.expected_num_viewpoints >= 1.0) {
            return Err(GenerationError::invalid_config(format!(
                "expected_num_viewpoints must be at least 1, got {}",
                self.expected_num_viewpoints
            )));
        }
        if self.num_rotations == 0 {
            return Err(GenerationError::invalid_config(
                "num_rotations must be at least 1",
            ));
        }
        if self.max_attempts_per_scene < self.num_grasps_per_scene {
            return Err(GenerationError::invalid_config(format!(
                "max_attempts_per_scene ({}) is below the grasp quota ({})",
                self.max_attempts_per_scene, self.num_grasps_per_scene
            )));
        }
        self.simulation.validate()
    }
}

/// Bounded exponential backoff used by non-zero ranks while waiting for
/// rank 0 to create the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirWaitPolicy {
    /// Number of existence checks before giving up.
    pub max_attempts: u32,

    /// Delay after the first failed check, doubled after each further one.
    pub initial_backoff_ms: u64,

    /// Upper bound on a single delay.
    pub max_backoff_ms: u64,
}

impl Default for DirWaitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff_ms: 50,
            max_backoff_ms: 2_000,
        }
    }
}

impl DirWaitPolicy {
    /// A policy that checks once and never sleeps.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }
}

/// Settings forwarded to the simulation backend factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Directory holding the object and gripper descriptions.
    pub urdf_root: PathBuf,

    /// Open an interactive viewer.
    pub gui: bool,

    /// Real-time factor of the physics stepping (1.0 = wall-clock speed).
    pub real_time_factor: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            urdf_root: PathBuf::from("data/urdfs"),
            gui: false,
            real_time_factor: 1.0,
        }
    }
}

impl SimulationSettings {
    /// Checks the real-time factor.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] if the real-time factor is
    /// not positive.
    pub fn validate(&self) -> Result<()> {
        if self.real_time_factor.is_finite() && self.real_time_factor > 0.0 {
            Ok(())
        } else {
            Err(GenerationError::invalid_config(format!(
                "real_time_factor must be positive, got {}",
                self.real_time_factor
            )))
        }
    }
}
