//! Grasp outcome labels.

use serde::{Deserialize, Serialize};

use crate::error::GraspTypesError;

/// Outcome of a single simulated grasp attempt.
///
/// Variants are declared in ascending order and the derived [`Ord`] follows
/// that order. [`Label::Success`] is the maximal variant: aggregating a
/// rotation sweep with [`Iterator::max`] reports success whenever any
/// attempt in the sweep succeeded.
///
/// # Example
///
/// ```
/// use grasp_types::Label;
///
/// let sweep = [Label::Collision, Label::Success, Label::Slipped];
/// assert_eq!(sweep.iter().copied().max(), Some(Label::Success));
/// assert_eq!(Label::Slipped.quality(), 0.0);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Label {
    /// The gripper collided with the scene before closing.
    #[default]
    Collision = 0,
    /// The fingers closed without touching an object.
    NoContact,
    /// An object was contacted but slipped out while lifting.
    Slipped,
    /// The object was lifted and held.
    Success,
}

impl Label {
    /// The maximal label; equal to [`Label::Success`].
    pub const MAX: Self = Self::Success;

    /// All labels in ascending order.
    pub const ALL: [Self; 4] = [
        Self::Collision,
        Self::NoContact,
        Self::Slipped,
        Self::Success,
    ];

    /// Returns `true` for the success variant.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Training quality of this outcome: 1.0 for success, 0.0 otherwise.
    #[must_use]
    pub const fn quality(self) -> f32 {
        if self.is_success() { 1.0 } else { 0.0 }
    }

    /// Stable numeric code of the label.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns the label name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Collision => "collision",
            Self::NoContact => "no_contact",
            Self::Slipped => "slipped",
            Self::Success => "success",
        }
    }
}

impl TryFrom<u8> for Label {
    type Error = GraspTypesError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(GraspTypesError::UnknownLabel(code))
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
