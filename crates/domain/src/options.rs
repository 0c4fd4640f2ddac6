use std::collections::{BTreeMap, BTreeSet};

use strum::Display;

use crate::{
    Equipment, ExerciseFocus, ExerciseID, FlagAlgebra, Joints, MovementPattern,
    MuscleContractions, MuscleGroups, MuscleMovement, MuscleTarget, Section, SkillTypes, Skills,
    SportsFocus, VariationID,
};

/// Caller-facing configuration of a selection run. Unset options do not filter.
#[derive(Debug, Clone)]
pub struct SelectionOptions {
    pub section: Section,
    pub muscle_groups: MuscleGroupOptions,
    pub movement_patterns: MovementPatternOptions,
    pub sports_focus: SportsFocusOptions,
    pub joints: Option<Joints>,
    pub equipment: Option<Equipment>,
    pub exercise_ids: Option<BTreeSet<ExerciseID>>,
    pub variation_ids: Option<BTreeSet<VariationID>>,
    pub exercise_focus: Option<ExerciseFocus>,
    pub exclude_exercise_focus: Option<ExerciseFocus>,
    pub muscle_movement: Option<MuscleMovement>,
    pub muscle_contractions: Option<MuscleContractions>,
    pub skills: SkillsOptions,
    pub exclusions: ExclusionOptions,
    pub progression: ProgressionOptions,
    pub unique_exercises: bool,
    pub ordering: Ordering,
    take: Option<usize>,
}

impl SelectionOptions {
    #[must_use]
    pub fn new(section: Section) -> Self {
        Self {
            section,
            muscle_groups: MuscleGroupOptions::default(),
            movement_patterns: MovementPatternOptions::default(),
            sports_focus: SportsFocusOptions::default(),
            joints: None,
            equipment: None,
            exercise_ids: None,
            variation_ids: None,
            exercise_focus: None,
            exclude_exercise_focus: None,
            muscle_movement: None,
            muscle_contractions: None,
            skills: SkillsOptions::default(),
            exclusions: ExclusionOptions::default(),
            progression: ProgressionOptions::default(),
            unique_exercises: true,
            ordering: Ordering::for_section(section),
            take: None,
        }
    }

    pub fn take(self, take: usize) -> Result<Self, OptionsError> {
        if take == 0 {
            return Err(OptionsError::ZeroTake);
        }
        Ok(Self {
            take: Some(take),
            ..self
        })
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.take
    }

    /// An explicitly empty allow-list filters everything.
    #[must_use]
    pub fn is_empty_allow_list(&self) -> bool {
        self.exercise_ids.as_ref().is_some_and(BTreeSet::is_empty)
            || self.variation_ids.as_ref().is_some_and(BTreeSet::is_empty)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MuscleGroupOptions {
    target: Option<MuscleGroups>,
    muscle_target: MuscleTarget,
    exclude: Option<MuscleGroups>,
    coverage_threshold: Option<usize>,
    rda: BTreeMap<MuscleGroups, u32>,
    tul: BTreeMap<MuscleGroups, u32>,
    already_worked: BTreeMap<MuscleGroups, u32>,
}

impl MuscleGroupOptions {
    #[must_use]
    pub fn new(muscle_target: MuscleTarget) -> Self {
        Self {
            muscle_target,
            ..Self::default()
        }
    }

    /// Replaces the target muscles. A previously set coverage threshold must still be
    /// satisfiable by the new target.
    pub fn target(self, muscles: MuscleGroups) -> Result<Self, OptionsError> {
        if let Some(threshold) = self.coverage_threshold {
            check_coverage(muscles, threshold)?;
        }
        Ok(Self {
            target: Some(muscles),
            ..self
        })
    }

    /// Excludes variations working any of the given muscles, e.g. for recovery.
    #[must_use]
    pub fn exclude(self, muscles: MuscleGroups) -> Self {
        Self {
            exclude: Some(muscles),
            ..self
        }
    }

    /// Requires each selected variation to cover at least the given number of target muscles
    /// that are not yet worked enough.
    pub fn coverage(self, threshold: usize) -> Result<Self, OptionsError> {
        let Some(target) = self.target else {
            return Err(OptionsError::CoverageWithoutTarget);
        };
        check_coverage(target, threshold)?;
        Ok(Self {
            coverage_threshold: Some(threshold),
            ..self
        })
    }

    /// Sets the number of times each of the muscles must be worked to count as covered.
    #[must_use]
    pub fn rda(mut self, muscles: MuscleGroups, count: u32) -> Self {
        for muscle in muscles.iter() {
            self.rda.insert(muscle, count);
        }
        self
    }

    /// Sets the number of times each of the muscles may be worked at most.
    #[must_use]
    pub fn tul(mut self, muscles: MuscleGroups, count: u32) -> Self {
        for muscle in muscles.iter() {
            self.tul.insert(muscle, count);
        }
        self
    }

    /// Accounts for work done outside of this selection, e.g. in other sections.
    #[must_use]
    pub fn already_worked(mut self, muscles: MuscleGroups, count: u32) -> Self {
        for muscle in muscles.iter() {
            *self.already_worked.entry(muscle).or_default() += count;
        }
        self
    }

    #[must_use]
    pub fn target_muscles(&self) -> Option<MuscleGroups> {
        self.target
    }

    #[must_use]
    pub fn excluded_muscles(&self) -> Option<MuscleGroups> {
        self.exclude
    }

    #[must_use]
    pub fn muscle_target(&self) -> MuscleTarget {
        self.muscle_target
    }

    #[must_use]
    pub fn coverage_threshold(&self) -> Option<usize> {
        self.coverage_threshold
    }

    #[must_use]
    pub fn rda_of(&self, muscle: MuscleGroups) -> u32 {
        self.rda.get(&muscle).copied().unwrap_or(1)
    }

    #[must_use]
    pub fn tul_of(&self, muscle: MuscleGroups) -> Option<u32> {
        self.tul.get(&muscle).copied()
    }

    #[must_use]
    pub fn worked(&self) -> BTreeMap<MuscleGroups, u32> {
        self.already_worked.clone()
    }
}

fn check_coverage(target: MuscleGroups, threshold: usize) -> Result<(), OptionsError> {
    if threshold == 0 {
        return Err(OptionsError::ZeroCoverageThreshold);
    }
    if threshold > target.count() {
        return Err(OptionsError::CoverageThreshold {
            threshold,
            available: target.count(),
        });
    }
    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MovementPatternOptions {
    pub movement_patterns: Option<MovementPattern>,
    pub is_unique: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SportsFocusOptions {
    pub sports_focus: Option<SportsFocus>,
    pub include_none: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SkillsOptions {
    pub skill_type: Option<SkillTypes>,
    pub skills: Skills,
    pub require: bool,
}

#[derive(Debug, Default, Clone)]
pub struct ExclusionOptions {
    pub exercise_ids: BTreeSet<ExerciseID>,
    pub variation_ids: BTreeSet<VariationID>,
    pub skills: Vec<(SkillTypes, Skills)>,
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressionOptions {
    pub cap_at_proficiency: bool,
    pub allow_lesser_progressions: bool,
    pub allow_greater_progressions: bool,
}

impl Default for ProgressionOptions {
    fn default() -> Self {
        Self {
            cap_at_proficiency: false,
            allow_lesser_progressions: true,
            allow_greater_progressions: true,
        }
    }
}

/// Order of the final selection.
#[derive(Display, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    #[default]
    #[strum(to_string = "none")]
    None,
    #[strum(to_string = "muscle count")]
    MuscleCount,
    #[strum(to_string = "unique muscles")]
    UniqueMuscles,
    #[strum(to_string = "core last")]
    CoreLast,
    #[strum(to_string = "plyometric first")]
    PlyometricFirst,
    #[strum(to_string = "progression")]
    Progression,
    #[strum(to_string = "debug")]
    Debug,
}

impl Ordering {
    /// The ordering conventionally used for a section.
    #[must_use]
    pub fn for_section(section: Section) -> Self {
        if section == Section::WARMUP {
            Ordering::MuscleCount
        } else if section == Section::CORE {
            Ordering::UniqueMuscles
        } else if section == Section::ACCESSORY {
            Ordering::CoreLast
        } else if section == Section::FUNCTIONAL {
            Ordering::PlyometricFirst
        } else if section == Section::DEBUG {
            Ordering::Debug
        } else if section.is_empty() {
            Ordering::Progression
        } else {
            Ordering::None
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum OptionsError {
    #[error("Coverage threshold exceeds number of target muscles ({threshold} > {available})")]
    CoverageThreshold { threshold: usize, available: usize },
    #[error("Coverage threshold must be greater than zero")]
    ZeroCoverageThreshold,
    #[error("Coverage threshold requires target muscles")]
    CoverageWithoutTarget,
    #[error("Number of selections must be greater than zero")]
    ZeroTake,
}
