//! The per-worker scene generation loop.

use std::marker::PhantomData;
use std::path::PathBuf;

use grasp_perception::{HemisphereSampler, ReconstructionVolume, TsdfVolume, ViewpointSampler};
use grasp_types::{HandConfig, PointCloud};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{GenerationConfig, SimulationSettings};
use crate::error::{GenerationError, Result, SimulationError};
use crate::evaluate::evaluate_grasp_point;
use crate::labels::LabelVolumes;
use crate::output::{prepare_output_dir, sample_path};
use crate::pool::CandidatePool;
use crate::sampler::sample_grasp_point;
use crate::sim::GraspSimulation;
use crate::store::store_sample;

/// What happened to one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneOutcome {
    /// The scene reached its quota and was written to `path`.
    Written {
        /// Archive location.
        path: PathBuf,
        /// Accepted successes.
        positives: usize,
        /// Accepted non-successes.
        negatives: usize,
    },

    /// The fine reconstruction had no surface; nothing was written.
    EmptyPointCloud,

    /// The attempt budget ran out before the quota was met; nothing was written.
    AttemptsExhausted {
        /// Candidates evaluated.
        attempts: usize,
        /// Grasps accepted before giving up.
        collected: usize,
    },
}

/// Summary of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Scenes started.
    pub scenes_attempted: usize,
    /// Archives written, in order.
    pub written: Vec<PathBuf>,
    /// Scenes skipped because the reconstruction was empty.
    pub skipped_empty: usize,
    /// Scenes skipped because the attempt budget ran out.
    pub skipped_exhausted: usize,
    /// Successes over all written scenes.
    pub positives: usize,
    /// Non-successes over all written scenes.
    pub negatives: usize,
}

impl GenerationReport {
    /// Adds one scene to the tally.
    pub fn record(&mut self, outcome: &SceneOutcome) {
        self.scenes_attempted += 1;
        match outcome {
            SceneOutcome::Written {
                path,
                positives,
                negatives,
            } => {
                self.written.push(path.clone());
                self.positives += positives;
                self.negatives += negatives;
            }
            SceneOutcome::EmptyPointCloud => self.skipped_empty += 1,
            SceneOutcome::AttemptsExhausted { .. } => self.skipped_exhausted += 1,
        }
    }

    /// Number of scenes skipped for any reason.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped_empty + self.skipped_exhausted
    }
}

/// Generates labeled scenes with one simulation backend.
///
/// `V` is the reconstruction volume and `P` the viewpoint sampler; both
/// default to the reference implementations in `grasp-perception`.
///
/// The random generator is a `ChaCha8Rng` seeded from
/// [`GenerationConfig::seed`] (or entropy) with the worker rank as stream,
/// so workers sharing a seed draw independent sequences.
#[derive(Debug)]
pub struct SceneGenerator<S, V = TsdfVolume, P = HemisphereSampler> {
    sim: S,
    config: GenerationConfig,
    viewpoints: P,
    rng: ChaCha8Rng,
    size: f64,
    _volume: PhantomData<V>,
}

impl<S: GraspSimulation> SceneGenerator<S> {
    /// Creates a generator with the reference volume and viewpoint sampler.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] if `config` does not validate.
    pub fn new(sim: S, config: GenerationConfig) -> Result<Self> {
        Self::with_viewpoints(sim, config, HemisphereSampler::default())
    }

    /// Validates `config`, then builds the backend with `factory` for the
    /// configured simulation settings, hand and workspace size.
    ///
    /// # Errors
    ///
    /// Returns a configuration error or the factory's error.
    pub fn from_factory<F>(config: GenerationConfig, factory: F) -> Result<Self>
    where
        F: FnOnce(&SimulationSettings, &HandConfig, f64) -> std::result::Result<S, SimulationError>,
    {
        config.validate()?;
        let sim = factory(&config.simulation, &config.hand, config.workspace_size())?;
        Self::new(sim, config)
    }
}

impl<S, V, P> SceneGenerator<S, V, P>
where
    S: GraspSimulation,
    V: ReconstructionVolume,
    P: ViewpointSampler,
{
    /// Creates a generator with a custom viewpoint sampler.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] if `config` does not validate.
    pub fn with_viewpoints(sim: S, config: GenerationConfig, viewpoints: P) -> Result<Self> {
        config.validate()?;
        let mut rng = config
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        rng.set_stream(u64::try_from(config.rank).unwrap_or(u64::MAX));
        let size = config.workspace_size();

        Ok(Self {
            sim,
            config,
            viewpoints,
            rng,
            size,
            _volume: PhantomData,
        })
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// The simulation backend.
    #[must_use]
    pub const fn sim(&self) -> &S {
        &self.sim
    }

    /// Consumes the generator, returning the backend.
    #[must_use]
    pub fn into_sim(self) -> S {
        self.sim
    }

    /// Runs every configured scene.
    ///
    /// Skipped scenes are counted in the report. Any error aborts the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory is unavailable, the
    /// simulation or reconstruction fails, or an archive cannot be written.
    pub fn run(&mut self) -> Result<GenerationReport> {
        let rank = self.config.rank;
        info!(
            rank,
            object_set = %self.config.object_set,
            num_scenes = self.config.num_scenes,
            grasps_per_scene = self.config.num_grasps_per_scene,
            size = self.size,
            "Starting grasp data generation"
        );
        prepare_output_dir(&self.config.root_dir, rank, &self.config.dir_wait)?;

        let mut report = GenerationReport::default();
        for scene in 0..self.config.num_scenes {
            let outcome = self.generate_scene(scene)?;
            report.record(&outcome);
            debug!(
                rank,
                scene = scene + 1,
                of = self.config.num_scenes,
                written = report.written.len(),
                "Scene done"
            );
        }

        info!(
            rank,
            written = report.written.len(),
            skipped_empty = report.skipped_empty,
            skipped_exhausted = report.skipped_exhausted,
            positives = report.positives,
            negatives = report.negatives,
            "Generation complete"
        );
        Ok(report)
    }

    /// Builds, reconstructs, labels and stores one scene.
    ///
    /// # Errors
    ///
    /// See [`SceneGenerator::run`].
    pub fn generate_scene(&mut self, scene: usize) -> Result<SceneOutcome> {
        self.sim.reset_world(&self.config.object_set)?;
        self.sim.save_baseline_state()?;

        let (coarse, fine) = self.reconstruct()?;
        let cloud = fine.extract_point_cloud();
        if cloud.is_empty() {
            warn!(scene, "Empty point cloud, skipping scene");
            return Ok(SceneOutcome::EmptyPointCloud);
        }

        let (pool, attempts) = self.collect_grasps(&cloud)?;
        if !pool.is_full() {
            warn!(
                scene,
                attempts,
                collected = pool.len(),
                quota = self.config.num_grasps_per_scene,
                "Attempt budget exhausted, skipping scene"
            );
            return Ok(SceneOutcome::AttemptsExhausted {
                attempts,
                collected: pool.len(),
            });
        }

        let (positives, negatives) = (pool.positives(), pool.negatives());
        let volumes = LabelVolumes::rasterize(&coarse, pool.entries())?;
        let path = sample_path(&self.config.root_dir);
        store_sample(&path, &volumes)?;
        info!(
            scene,
            attempts,
            positives,
            negatives,
            labeled_voxels = volumes.written_voxels(),
            path = %path.display(),
            "Scene written"
        );

        Ok(SceneOutcome::Written {
            path,
            positives,
            negatives,
        })
    }

    /// Fuses a random number of views into a coarse and a fine volume.
    fn reconstruct(&mut self) -> Result<(V, V)> {
        let count = self.num_viewpoints()?;
        let extrinsics = self.viewpoints.sample(self.size, count, &mut self.rng);
        let intrinsic = self.sim.intrinsic();

        let mut coarse = V::new(self.size, self.config.resolution)?;
        let mut fine = V::new(self.size, self.config.high_resolution)?;
        for extrinsic in &extrinsics {
            let depth = self.sim.render_depth(extrinsic)?;
            coarse.integrate(&depth, &intrinsic, extrinsic)?;
            fine.integrate(&depth, &intrinsic, extrinsic)?;
        }

        debug!(views = extrinsics.len(), "Reconstructed scene");
        Ok((coarse, fine))
    }

    /// One plus a Poisson draw with mean `expected_num_viewpoints - 1`.
    fn num_viewpoints(&mut self) -> Result<usize> {
        let lambda = self.config.expected_num_viewpoints - 1.0;
        if lambda <= 0.0 {
            return Ok(1);
        }
        let poisson = Poisson::new(lambda).map_err(|err| {
            GenerationError::invalid_config(format!("expected_num_viewpoints: {err}"))
        })?;
        let extra: f64 = poisson.sample(&mut self.rng);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let extra = extra as usize;
        Ok(extra + 1)
    }

    /// Samples and evaluates candidates until the pool is full or the
    /// attempt budget is spent. Returns the pool and the attempts used.
    fn collect_grasps(&mut self, cloud: &PointCloud) -> Result<(CandidatePool, usize)> {
        let mut pool = CandidatePool::new(self.config.num_grasps_per_scene);
        let mut attempts = 0;

        while !pool.is_full() && attempts < self.config.max_attempts_per_scene {
            let Some((point, normal)) =
                sample_grasp_point(cloud, self.config.hand.finger_depth, &mut self.rng)
            else {
                break;
            };
            attempts += 1;
            let (grasp, label) =
                evaluate_grasp_point(&mut self.sim, &point, &normal, self.config.num_rotations)?;
            pool.offer(grasp, label);
        }

        Ok((pool, attempts))
    }
}
