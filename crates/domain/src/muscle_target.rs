use crate::{MuscleGroups, MuscleRoles, Variation};

/// Selects which muscles of a variation are considered by filtering and ranking.
#[derive(Debug, Default, Clone, Copy)]
pub enum MuscleTarget {
    #[default]
    StrengthWorked,
    StretchWorked,
    StabilityWorked,
    Roles(MuscleRoles),
    Custom(fn(&Variation) -> MuscleGroups),
}

impl MuscleTarget {
    #[must_use]
    pub fn muscles(self, variation: &Variation) -> MuscleGroups {
        match self {
            MuscleTarget::StrengthWorked => variation.strength_muscles,
            MuscleTarget::StretchWorked => variation.stretch_muscles,
            MuscleTarget::StabilityWorked => variation.stability_muscles,
            MuscleTarget::Roles(roles) => roles.iter().fold(MuscleGroups::empty(), |muscles, role| {
                muscles | MuscleTarget::from(role).muscles(variation)
            }),
            MuscleTarget::Custom(f) => f(variation),
        }
    }
}

impl From<MuscleRoles> for MuscleTarget {
    fn from(value: MuscleRoles) -> Self {
        if value == MuscleRoles::STRENGTH {
            MuscleTarget::StrengthWorked
        } else if value == MuscleRoles::STRETCH {
            MuscleTarget::StretchWorked
        } else if value == MuscleRoles::STABILITY {
            MuscleTarget::StabilityWorked
        } else {
            MuscleTarget::Roles(value)
        }
    }
}
