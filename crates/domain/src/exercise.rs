use derive_more::{Deref, Display, Into};
use uuid::Uuid;

use crate::{
    Equipment, ExerciseFocus, FlagAlgebra, Joints, MovementPattern, MuscleContractions,
    MuscleGroups, MuscleMovement, Section, SkillTypes, Skills, SportsFocus,
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub id: ExerciseID,
    pub name: String,
    pub skill_type: SkillTypes,
    pub skills: Skills,
    pub prerequisites: Vec<Prerequisite>,
    pub disabled_reason: Option<String>,
}

impl Exercise {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.disabled_reason.is_none()
    }

    #[must_use]
    pub fn has_prerequisite(&self, id: ExerciseID) -> bool {
        self.prerequisites.iter().any(|p| p.exercise_id == id)
    }

    /// Two exercises share a skill when they train overlapping skills of the same skill type.
    #[must_use]
    pub fn shares_skills(&self, other: &Exercise) -> bool {
        self.skill_type.has_any(other.skill_type) && self.skills.has_any(other.skills)
    }
}

#[derive(Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExerciseID(Uuid);

impl ExerciseID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for ExerciseID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for ExerciseID {
    fn from(value: u128) -> Self {
        Self::from_u128(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prerequisite {
    pub exercise_id: ExerciseID,
    pub proficiency: Progression,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Variation {
    pub id: VariationID,
    pub exercise_id: ExerciseID,
    pub name: String,
    pub strength_muscles: MuscleGroups,
    pub stretch_muscles: MuscleGroups,
    pub stability_muscles: MuscleGroups,
    pub movement_pattern: MovementPattern,
    pub muscle_contractions: MuscleContractions,
    pub muscle_movement: MuscleMovement,
    pub mobility_joints: Joints,
    pub sports_focus: SportsFocus,
    pub exercise_focus: ExerciseFocus,
    pub section: Section,
    pub progression: ProgressionRange,
    pub uses_caution: bool,
    pub is_weighted: bool,
    pub default_instruction: bool,
    pub instructions: Vec<Instruction>,
    pub disabled_reason: Option<String>,
}

impl Variation {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.disabled_reason.is_none()
    }

    /// Checks whether the variation can be performed with the given equipment, either without
    /// any equipment or through one of its instructions.
    #[must_use]
    pub fn is_possible_with(&self, equipment: Equipment) -> bool {
        self.default_instruction
            || self
                .instructions
                .iter()
                .any(|instruction| instruction.is_possible_with(equipment))
    }
}

#[derive(Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct VariationID(Uuid);

impl VariationID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for VariationID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for VariationID {
    fn from(value: u128) -> Self {
        Self::from_u128(value)
    }
}

/// A root instruction lists the equipment of which any one piece is needed. Its children are
/// alternative continuations, one of which must be possible as well.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub equipment: Equipment,
    pub children: Vec<Instruction>,
}

impl Instruction {
    #[must_use]
    pub fn is_possible_with(&self, equipment: Equipment) -> bool {
        equipment.has_any(self.equipment)
            && (self.children.is_empty()
                || self
                    .children
                    .iter()
                    .any(|child| child.is_possible_with(equipment)))
    }
}

#[derive(Debug, Default, Display, Clone, Copy, Into, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Progression(u8);

impl Progression {
    pub const MIN: Progression = Progression(0);
    pub const MAX: Progression = Progression(100);

    const STEP: u8 = 5;
    const LOWEST_TRACKED: u8 = 5;
    const HIGHEST_TRACKED: u8 = 95;

    pub fn new(value: u8) -> Result<Self, ProgressionError> {
        if value > 100 {
            return Err(ProgressionError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Rounds to the nearest multiple of five within the range a user can be tracked at.
    #[must_use]
    pub fn tracked(value: u8) -> Self {
        let rounded = (u16::from(value) + u16::from(Self::STEP / 2)) / u16::from(Self::STEP)
            * u16::from(Self::STEP);
        #[allow(clippy::cast_possible_truncation)]
        Self((rounded as u8).clamp(Self::LOWEST_TRACKED, Self::HIGHEST_TRACKED))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ProgressionError {
    #[error("Progression must be 100 or less ({0} > 100)")]
    OutOfRange(u8),
}

/// Range of progression levels for which a variation is appropriate. The minimum is
/// inclusive, the maximum exclusive, and a missing bound is unbounded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionRange {
    min: Option<Progression>,
    max: Option<Progression>,
}

impl ProgressionRange {
    pub fn new(
        min: Option<Progression>,
        max: Option<Progression>,
    ) -> Result<Self, ProgressionRangeError> {
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(ProgressionRangeError::Inverted(min, max));
            }
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn min(&self) -> Option<Progression> {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> Option<Progression> {
        self.max
    }

    #[must_use]
    pub fn is_min_in_range(&self, progression: Progression) -> bool {
        self.min.is_none_or(|min| progression >= min)
    }

    #[must_use]
    pub fn is_max_in_range(&self, progression: Progression) -> bool {
        self.max.is_none_or(|max| progression < max)
    }

    #[must_use]
    pub fn contains(&self, progression: Progression) -> bool {
        self.is_min_in_range(progression) && self.is_max_in_range(progression)
    }

    /// Orders variations from easiest to hardest.
    #[must_use]
    pub fn difficulty(&self) -> (Progression, Progression) {
        (
            self.min.unwrap_or(Progression::MIN),
            self.max.unwrap_or(Progression::MAX),
        )
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ProgressionRangeError {
    #[error("Minimum progression must not exceed maximum progression ({0} > {1})")]
    Inverted(Progression, Progression),
}
