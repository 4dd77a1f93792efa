//! Rotation-sweep evaluation of a grasp candidate.

use std::f64::consts::PI;

use grasp_types::{Grasp, Label};
use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};
use tracing::trace;

use crate::error::{GenerationError, Result};
use crate::sim::GraspSimulation;

/// Relative tolerance under which the reference axis counts as parallel to
/// the approach axis.
const PARALLEL_RTOL: f64 = 1e-4;
const PARALLEL_ATOL: f64 = 1e-8;

/// Builds the canonical grasp frame for a surface normal.
///
/// The frame's Z axis (approach) is `-normal`. Its X axis is world X
/// projected orthogonal to the approach, or world Y when world X is parallel
/// to it. The Y axis completes a right-handed frame.
///
/// # Errors
///
/// Returns [`GenerationError::DegenerateFrame`] if `normal` is zero or not
/// finite.
///
/// # Example
///
/// ```
/// use grasp_datagen::grasp_frame;
/// use nalgebra::Vector3;
///
/// let frame = grasp_frame(&Vector3::z()).unwrap();
/// let approach = frame * Vector3::z();
/// assert!((approach + Vector3::z()).norm() < 1e-12);
/// ```
pub fn grasp_frame(normal: &Vector3<f64>) -> Result<UnitQuaternion<f64>> {
    let degenerate = || GenerationError::DegenerateFrame {
        normal: [normal.x, normal.y, normal.z],
    };
    if !normal.iter().all(|c| c.is_finite()) {
        return Err(degenerate());
    }
    let z_axis = -normal.try_normalize(1e-12).ok_or_else(degenerate)?;

    let mut x_axis = Vector3::x();
    if (x_axis.dot(&z_axis).abs() - 1.0).abs() <= PARALLEL_ATOL + PARALLEL_RTOL {
        x_axis = Vector3::y();
    }
    let y_axis = z_axis.cross(&x_axis).try_normalize(1e-12).ok_or_else(degenerate)?;
    let x_axis = y_axis.cross(&z_axis);

    Ok(UnitQuaternion::from_rotation_matrix(
        &Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x_axis, y_axis, z_axis])),
    ))
}

/// `count` yaw angles evenly spaced over `[0, π]`, both ends included.
///
/// A single angle is `[0]`.
#[must_use]
pub fn yaw_angles(count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            #[allow(clippy::cast_precision_loss)]
            let step = PI / (count - 1) as f64;
            #[allow(clippy::cast_precision_loss)]
            (0..count).map(|i| i as f64 * step).collect()
        }
    }
}

/// Index at the centre of the widest run of consecutive successes.
///
/// Runs are compared by length and the earliest wins a tie. The centre of a
/// run `[start, end]` is `(start + end) / 2` rounded down. Returns `None`
/// when nothing succeeded.
///
/// # Example
///
/// ```
/// use grasp_datagen::select_widest_peak;
///
/// assert_eq!(select_widest_peak(&[false, true, true, false, true]), Some(1));
/// assert_eq!(select_widest_peak(&[true, false, true, true, true]), Some(3));
/// assert_eq!(select_widest_peak(&[false, false]), None);
/// ```
#[must_use]
pub fn select_widest_peak(successes: &[bool]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    let mut run_start = None;

    for (idx, &success) in successes.iter().chain(std::iter::once(&false)).enumerate() {
        match (success, run_start) {
            (true, None) => run_start = Some(idx),
            (false, Some(start)) => {
                let end = idx - 1;
                let is_wider = best.is_none_or(|(s, e)| end - start > e - s);
                if is_wider {
                    best = Some((start, end));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    best.map(|(start, end)| (start + end) / 2)
}

/// Evaluates a candidate by sweeping yaw about its approach axis.
///
/// For each of `num_rotations` yaw angles in [`yaw_angles`] the simulation is
/// restored to its baseline and a grasp is attempted at
/// `(frame · Rz(yaw), position)`. The returned grasp uses the yaw at the
/// centre of the widest run of successes and the width measured there. When
/// no yaw succeeds the grasp has identity orientation and zero width. The
/// label is the greatest outcome over all yaws.
///
/// # Errors
///
/// Returns an error if `num_rotations` is zero, the frame is degenerate, or
/// the simulation fails.
pub fn evaluate_grasp_point<S: GraspSimulation + ?Sized>(
    sim: &mut S,
    position: &Point3<f64>,
    normal: &Vector3<f64>,
    num_rotations: usize,
) -> Result<(Grasp, Label)> {
    if num_rotations == 0 {
        return Err(GenerationError::invalid_config(
            "num_rotations must be at least 1",
        ));
    }
    let frame = grasp_frame(normal)?;
    let translation = Translation3::from(position.coords);
    let yaws = yaw_angles(num_rotations);

    let mut labels = Vec::with_capacity(yaws.len());
    let mut widths = Vec::with_capacity(yaws.len());
    for &yaw in &yaws {
        let orientation = frame * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw);
        sim.restore_baseline_state()?;
        let outcome = sim.attempt_grasp(&Isometry3::from_parts(translation, orientation))?;
        trace!(yaw, label = %outcome.label, width = outcome.width, "Grasp attempt");
        labels.push(outcome.label);
        widths.push(outcome.width);
    }

    let label = labels.iter().copied().max().unwrap_or_default();
    let successes: Vec<bool> = labels.iter().map(|l| l.is_success()).collect();

    let grasp = match select_widest_peak(&successes) {
        Some(idx) => {
            let orientation = frame * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaws[idx]);
            Grasp::new(Isometry3::from_parts(translation, orientation), widths[idx])
        }
        None => Grasp::new(
            Isometry3::from_parts(translation, UnitQuaternion::identity()),
            0.0,
        ),
    };

    Ok((grasp, label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulationError;
    use crate::sim::GraspOutcome;
    use approx::assert_relative_eq;
    use grasp_perception::{CameraIntrinsic, DepthImage};

    /// Succeeds when the closing direction is roughly aligned with world Y.
    struct YawSim {
        restored: usize,
        attempts: usize,
        dirty: bool,
    }

    impl YawSim {
        fn new() -> Self {
            Self {
                restored: 0,
                attempts: 0,
                dirty: false,
            }
        }
    }

    impl GraspSimulation for YawSim {
        fn reset_world(&mut self, _object_set: &str) -> std::result::Result<(), SimulationError> {
            Ok(())
        }

        fn save_baseline_state(&mut self) -> std::result::Result<(), SimulationError> {
            Ok(())
        }

        fn restore_baseline_state(&mut self) -> std::result::Result<(), SimulationError> {
            self.restored += 1;
            self.dirty = false;
            Ok(())
        }

        fn intrinsic(&self) -> CameraIntrinsic {
            CameraIntrinsic::new(4, 4, 2.0, 2.0, 1.5, 1.5)
        }

        fn render_depth(
            &mut self,
            _extrinsic: &Isometry3<f64>,
        ) -> std::result::Result<DepthImage, SimulationError> {
            Ok(DepthImage::empty(4, 4))
        }

        fn attempt_grasp(
            &mut self,
            pose: &Isometry3<f64>,
        ) -> std::result::Result<GraspOutcome, SimulationError> {
            assert!(!self.dirty, "attempt without restoring the baseline");
            self.dirty = true;
            self.attempts += 1;
            let closing = pose.rotation * Vector3::x();
            let label = if closing.x.abs() < 0.5 {
                Label::Success
            } else {
                Label::Slipped
            };
            Ok(GraspOutcome::new(label, closing.y.abs() * 0.05))
        }
    }

    /// Replays a fixed outcome per yaw, in sweep order.
    struct ScriptedSim {
        outcomes: Vec<GraspOutcome>,
        attempts: usize,
    }

    impl ScriptedSim {
        fn new(labels: &[Label]) -> Self {
            let outcomes = labels
                .iter()
                .enumerate()
                .map(|(idx, &label)| GraspOutcome::new(label, 0.01 * (idx + 1) as f64))
                .collect();
            Self {
                outcomes,
                attempts: 0,
            }
        }
    }

    impl GraspSimulation for ScriptedSim {
        fn reset_world(&mut self, _object_set: &str) -> std::result::Result<(), SimulationError> {
            Ok(())
        }

        fn save_baseline_state(&mut self) -> std::result::Result<(), SimulationError> {
            Ok(())
        }

        fn restore_baseline_state(&mut self) -> std::result::Result<(), SimulationError> {
            Ok(())
        }

        fn intrinsic(&self) -> CameraIntrinsic {
            CameraIntrinsic::new(4, 4, 2.0, 2.0, 1.5, 1.5)
        }

        fn render_depth(
            &mut self,
            _extrinsic: &Isometry3<f64>,
        ) -> std::result::Result<DepthImage, SimulationError> {
            Ok(DepthImage::empty(4, 4))
        }

        fn attempt_grasp(
            &mut self,
            _pose: &Isometry3<f64>,
        ) -> std::result::Result<GraspOutcome, SimulationError> {
            let outcome = self.outcomes[self.attempts];
            self.attempts += 1;
            Ok(outcome)
        }
    }

    #[test]
    fn frame_is_right_handed_with_approach_against_normal() {
        for normal in [
            Vector3::z(),
            Vector3::x(),
            -Vector3::x(),
            Vector3::new(0.3, -0.4, 0.5),
        ] {
            let frame = grasp_frame(&normal).unwrap();
            let (x, y, z) = (frame * Vector3::x(), frame * Vector3::y(), frame * Vector3::z());
            assert_relative_eq!(z, -normal.normalize(), epsilon = 1e-9);
            assert_relative_eq!(x.cross(&y), z, epsilon = 1e-9);
        }
    }

    #[test]
    fn frame_switches_reference_axis_when_parallel() {
        let frame = grasp_frame(&Vector3::x()).unwrap();
        let x = frame * Vector3::x();
        // world Y projected onto the plane orthogonal to world X
        assert_relative_eq!(x, Vector3::y(), epsilon = 1e-9);
    }

    #[test]
    fn frame_rejects_zero_and_nan_normals() {
        assert!(matches!(
            grasp_frame(&Vector3::zeros()),
            Err(GenerationError::DegenerateFrame { .. })
        ));
        assert!(grasp_frame(&Vector3::new(f64::NAN, 0.0, 1.0)).is_err());
    }

    #[test]
    fn yaw_angles_span_half_turn() {
        let yaws = yaw_angles(12);
        assert_eq!(yaws.len(), 12);
        assert_relative_eq!(yaws[0], 0.0);
        assert_relative_eq!(yaws[11], PI);
        assert_eq!(yaw_angles(1), vec![0.0]);
        assert!(yaw_angles(0).is_empty());
    }

    #[test]
    fn widest_peak_prefers_longest_then_earliest() {
        assert_eq!(select_widest_peak(&[false, true, true, false, true]), Some(1));
        assert_eq!(select_widest_peak(&[true, true, false, true, true]), Some(0));
        assert_eq!(select_widest_peak(&[true, true, true, true]), Some(1));
        assert_eq!(select_widest_peak(&[false, false, false, true]), Some(3));
        assert_eq!(select_widest_peak(&[]), None);
    }

    #[test]
    fn sweep_picks_centre_of_successful_yaws() {
        let mut sim = YawSim::new();
        let position = Point3::new(0.1, 0.1, 0.05);
        let (grasp, label) = evaluate_grasp_point(&mut sim, &position, &Vector3::z(), 12).unwrap();

        assert_eq!(sim.attempts, 12);
        assert_eq!(sim.restored, 12);
        assert_eq!(label, Label::Success);

        // successes at yaw indices 4..=7, centre 5
        let expected = grasp_frame(&Vector3::z()).unwrap()
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw_angles(12)[5]);
        assert_relative_eq!(grasp.pose.rotation, expected, epsilon = 1e-9);
        assert_relative_eq!(grasp.pose.translation.vector, position.coords);
        assert!(grasp.width > 0.0);
    }

    #[test]
    fn failed_sweep_yields_identity_and_zero_width() {
        let mut sim = YawSim::new();
        // a single yaw of 0 closes along world X and slips
        let (grasp, label) =
            evaluate_grasp_point(&mut sim, &Point3::origin(), &Vector3::z(), 1).unwrap();

        assert_eq!(label, Label::Slipped);
        assert_eq!(grasp.pose.rotation, UnitQuaternion::identity());
        assert_relative_eq!(grasp.width, 0.0);
    }

    #[test]
    fn zero_rotations_is_rejected() {
        let mut sim = YawSim::new();
        assert!(evaluate_grasp_point(&mut sim, &Point3::origin(), &Vector3::z(), 0).is_err());
        assert_eq!(sim.attempts, 0);
    }

    #[test]
    fn sweep_without_success_reports_greatest_failure() {
        let mut sim = ScriptedSim::new(&[
            Label::Collision,
            Label::Slipped,
            Label::NoContact,
            Label::Collision,
        ]);
        let position = Point3::new(0.05, 0.1, 0.02);
        let (grasp, label) = evaluate_grasp_point(&mut sim, &position, &Vector3::z(), 4).unwrap();

        assert_eq!(sim.attempts, 4);
        assert_eq!(label, Label::Slipped);
        assert_eq!(grasp.pose.rotation, UnitQuaternion::identity());
        assert_relative_eq!(grasp.pose.translation.vector, position.coords);
        assert_relative_eq!(grasp.width, 0.0);
    }

    #[test]
    fn mixed_sweep_keeps_width_of_selected_yaw() {
        let mut sim = ScriptedSim::new(&[
            Label::Success,
            Label::Success,
            Label::Collision,
            Label::NoContact,
            Label::Slipped,
        ]);
        let (grasp, label) =
            evaluate_grasp_point(&mut sim, &Point3::origin(), &Vector3::z(), 5).unwrap();

        assert_eq!(label, Label::Success);
        // run 0..=1 has its centre at yaw index 0
        let expected = grasp_frame(&Vector3::z()).unwrap()
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw_angles(5)[0]);
        assert_relative_eq!(grasp.pose.rotation, expected, epsilon = 1e-9);
        assert_relative_eq!(grasp.width, 0.01);
    }
}
