use chrono::NaiveDate;
use regimen_domain as domain;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Serializable image of a storage: the catalog, the known users and their tracking records.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Snapshot {
    pub settings: domain::Settings,
    pub users: Vec<User>,
    pub exercises: Vec<Exercise>,
    pub variations: Vec<Variation>,
    pub user_exercises: Vec<UserExercise>,
    pub user_variations: Vec<UserVariation>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn catalog(&self) -> Result<domain::Catalog, SnapshotError> {
        let exercises = self
            .exercises
            .iter()
            .cloned()
            .map(domain::Exercise::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let variations = self
            .variations
            .iter()
            .cloned()
            .map(domain::Variation::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(domain::Catalog::new(exercises, variations)?)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("unknown bits in {field}: {bits:#x}")]
    UnknownBits { field: &'static str, bits: u64 },
    #[error(transparent)]
    InvalidProgression(#[from] domain::ProgressionError),
    #[error(transparent)]
    InvalidProgressionRange(#[from] domain::ProgressionRangeError),
    #[error(transparent)]
    InvalidCatalog(#[from] domain::CatalogError),
    #[error("user {0} appears more than once")]
    DuplicateUser(Uuid),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn flags<F>(field: &'static str, bits: F::Bits) -> Result<F, SnapshotError>
where
    F: bitflags::Flags,
    F::Bits: Into<u64>,
{
    F::from_bits(bits).ok_or_else(|| SnapshotError::UnknownBits {
        field,
        bits: bits.into(),
    })
}

fn progression(value: Option<u8>) -> Result<Option<domain::Progression>, SnapshotError> {
    Ok(value.map(domain::Progression::new).transpose()?)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub equipment: u32,
    #[serde(default)]
    pub is_new_to_fitness: bool,
}

impl From<&domain::User> for User {
    fn from(value: &domain::User) -> Self {
        Self {
            id: *value.id,
            equipment: value.equipment.bits(),
            is_new_to_fitness: value.is_new_to_fitness,
        }
    }
}

impl TryFrom<User> for domain::User {
    type Error = SnapshotError;

    fn try_from(value: User) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            equipment: flags("equipment", value.equipment)?,
            is_new_to_fitness: value.is_new_to_fitness,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub skill_type: u8,
    #[serde(default)]
    pub skills: u32,
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
    #[serde(default)]
    pub disabled_reason: Option<String>,
}

impl From<&domain::Exercise> for Exercise {
    fn from(value: &domain::Exercise) -> Self {
        Self {
            id: *value.id,
            name: value.name.clone(),
            skill_type: value.skill_type.bits(),
            skills: value.skills.bits(),
            prerequisites: value.prerequisites.iter().map(Prerequisite::from).collect(),
            disabled_reason: value.disabled_reason.clone(),
        }
    }
}

impl TryFrom<Exercise> for domain::Exercise {
    type Error = SnapshotError;

    fn try_from(value: Exercise) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            name: value.name,
            skill_type: flags("skill_type", value.skill_type)?,
            skills: domain::Skills::from_bits_retain(value.skills),
            prerequisites: value
                .prerequisites
                .into_iter()
                .map(domain::Prerequisite::try_from)
                .collect::<Result<Vec<_>, _>>()?,
            disabled_reason: value.disabled_reason,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prerequisite {
    pub exercise_id: Uuid,
    pub proficiency: u8,
}

impl From<&domain::Prerequisite> for Prerequisite {
    fn from(value: &domain::Prerequisite) -> Self {
        Self {
            exercise_id: *value.exercise_id,
            proficiency: value.proficiency.into(),
        }
    }
}

impl TryFrom<Prerequisite> for domain::Prerequisite {
    type Error = SnapshotError;

    fn try_from(value: Prerequisite) -> Result<Self, Self::Error> {
        Ok(Self {
            exercise_id: value.exercise_id.into(),
            proficiency: domain::Progression::new(value.proficiency)?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Variation {
    pub id: Uuid,
    pub exercise_id: Uuid,
    pub name: String,
    pub strength_muscles: u64,
    pub stretch_muscles: u64,
    pub stability_muscles: u64,
    pub movement_pattern: u32,
    pub muscle_contractions: u8,
    pub muscle_movement: u8,
    pub mobility_joints: u32,
    pub sports_focus: u16,
    pub exercise_focus: u16,
    pub section: u16,
    pub min_progression: Option<u8>,
    pub max_progression: Option<u8>,
    pub uses_caution: bool,
    pub is_weighted: bool,
    pub default_instruction: bool,
    pub instructions: Vec<Instruction>,
    pub disabled_reason: Option<String>,
}

impl From<&domain::Variation> for Variation {
    fn from(value: &domain::Variation) -> Self {
        Self {
            id: *value.id,
            exercise_id: *value.exercise_id,
            name: value.name.clone(),
            strength_muscles: value.strength_muscles.bits(),
            stretch_muscles: value.stretch_muscles.bits(),
            stability_muscles: value.stability_muscles.bits(),
            movement_pattern: value.movement_pattern.bits(),
            muscle_contractions: value.muscle_contractions.bits(),
            muscle_movement: value.muscle_movement.bits(),
            mobility_joints: value.mobility_joints.bits(),
            sports_focus: value.sports_focus.bits(),
            exercise_focus: value.exercise_focus.bits(),
            section: value.section.bits(),
            min_progression: value.progression.min().map(u8::from),
            max_progression: value.progression.max().map(u8::from),
            uses_caution: value.uses_caution,
            is_weighted: value.is_weighted,
            default_instruction: value.default_instruction,
            instructions: value.instructions.iter().map(Instruction::from).collect(),
            disabled_reason: value.disabled_reason.clone(),
        }
    }
}

impl TryFrom<Variation> for domain::Variation {
    type Error = SnapshotError;

    fn try_from(value: Variation) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            exercise_id: value.exercise_id.into(),
            name: value.name,
            strength_muscles: flags("strength_muscles", value.strength_muscles)?,
            stretch_muscles: flags("stretch_muscles", value.stretch_muscles)?,
            stability_muscles: flags("stability_muscles", value.stability_muscles)?,
            movement_pattern: flags("movement_pattern", value.movement_pattern)?,
            muscle_contractions: flags("muscle_contractions", value.muscle_contractions)?,
            muscle_movement: flags("muscle_movement", value.muscle_movement)?,
            mobility_joints: flags("mobility_joints", value.mobility_joints)?,
            sports_focus: flags("sports_focus", value.sports_focus)?,
            exercise_focus: flags("exercise_focus", value.exercise_focus)?,
            section: flags("section", value.section)?,
            progression: domain::ProgressionRange::new(
                progression(value.min_progression)?,
                progression(value.max_progression)?,
            )?,
            uses_caution: value.uses_caution,
            is_weighted: value.is_weighted,
            default_instruction: value.default_instruction,
            instructions: value
                .instructions
                .into_iter()
                .map(domain::Instruction::try_from)
                .collect::<Result<Vec<_>, _>>()?,
            disabled_reason: value.disabled_reason,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub equipment: u32,
    #[serde(default)]
    pub children: Vec<Instruction>,
}

impl From<&domain::Instruction> for Instruction {
    fn from(value: &domain::Instruction) -> Self {
        Self {
            equipment: value.equipment.bits(),
            children: value.children.iter().map(Instruction::from).collect(),
        }
    }
}

impl TryFrom<Instruction> for domain::Instruction {
    type Error = SnapshotError;

    fn try_from(value: Instruction) -> Result<Self, Self::Error> {
        Ok(Self {
            equipment: flags("equipment", value.equipment)?,
            children: value
                .children
                .into_iter()
                .map(domain::Instruction::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserExercise {
    pub user_id: Uuid,
    pub exercise_id: Uuid,
    pub progression: u8,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub last_seen: Option<NaiveDate>,
    #[serde(default)]
    pub last_visible: Option<NaiveDate>,
}

impl From<&domain::UserExercise> for UserExercise {
    fn from(value: &domain::UserExercise) -> Self {
        Self {
            user_id: *value.user_id,
            exercise_id: *value.exercise_id,
            progression: value.progression.into(),
            ignore: value.ignore,
            last_seen: value.last_seen,
            last_visible: value.last_visible,
        }
    }
}

impl TryFrom<UserExercise> for domain::UserExercise {
    type Error = SnapshotError;

    fn try_from(value: UserExercise) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: value.user_id.into(),
            exercise_id: value.exercise_id.into(),
            progression: domain::Progression::new(value.progression)?,
            ignore: value.ignore,
            last_seen: value.last_seen,
            last_visible: value.last_visible,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserVariation {
    pub user_id: Uuid,
    pub variation_id: Uuid,
    pub section: u16,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub last_seen: Option<NaiveDate>,
    #[serde(default)]
    pub refresh_after: Option<NaiveDate>,
    #[serde(default)]
    pub lag_refresh_weeks: u8,
    #[serde(default)]
    pub pad_refresh_weeks: u8,
}

impl From<&domain::UserVariation> for UserVariation {
    fn from(value: &domain::UserVariation) -> Self {
        Self {
            user_id: *value.user_id,
            variation_id: *value.variation_id,
            section: value.section.bits(),
            ignore: value.ignore,
            last_seen: value.last_seen,
            refresh_after: value.refresh_after,
            lag_refresh_weeks: value.lag_refresh_weeks,
            pad_refresh_weeks: value.pad_refresh_weeks,
        }
    }
}

impl TryFrom<UserVariation> for domain::UserVariation {
    type Error = SnapshotError;

    fn try_from(value: UserVariation) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: value.user_id.into(),
            variation_id: value.variation_id.into(),
            section: flags("section", value.section)?,
            ignore: value.ignore,
            last_seen: value.last_seen,
            refresh_after: value.refresh_after,
            lag_refresh_weeks: value.lag_refresh_weeks,
            pad_refresh_weeks: value.pad_refresh_weeks,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use crate::tests::data::{EXERCISES, USER, USER_EXERCISE, USER_VARIATION, VARIATIONS};

    use super::*;

    #[test]
    fn test_user_try_from() {
        assert_eq!(
            domain::User::try_from(User::from(&*USER)).unwrap(),
            USER.clone()
        );
    }

    #[test]
    fn test_user_try_from_unknown_equipment() {
        let user = User {
            id: Uuid::from_u128(1),
            equipment: 1 << 31,
            is_new_to_fitness: false,
        };

        assert!(matches!(
            domain::User::try_from(user),
            Err(SnapshotError::UnknownBits {
                field: "equipment",
                bits: 0x8000_0000
            })
        ));
    }

    #[test]
    fn test_exercise_try_from() {
        for exercise in EXERCISES.iter() {
            assert_eq!(
                domain::Exercise::try_from(Exercise::from(exercise)).unwrap(),
                exercise.clone()
            );
        }
    }

    #[test]
    fn test_variation_try_from() {
        for variation in VARIATIONS.iter() {
            assert_eq!(
                domain::Variation::try_from(Variation::from(variation)).unwrap(),
                variation.clone()
            );
        }
    }

    #[rstest]
    #[case::progression_out_of_range(Some(101), None)]
    #[case::inverted_range(Some(70), Some(30))]
    fn test_variation_try_from_invalid_progression(
        #[case] min_progression: Option<u8>,
        #[case] max_progression: Option<u8>,
    ) {
        let variation = Variation {
            min_progression,
            max_progression,
            ..Variation::from(&VARIATIONS[0])
        };

        assert!(matches!(
            domain::Variation::try_from(variation),
            Err(SnapshotError::InvalidProgression(_) | SnapshotError::InvalidProgressionRange(_))
        ));
    }

    #[test]
    fn test_variation_try_from_nested_instruction() {
        let variation = Variation {
            instructions: vec![Instruction {
                equipment: domain::Equipment::BENCH.bits(),
                children: vec![Instruction {
                    equipment: 1 << 31,
                    children: vec![],
                }],
            }],
            ..Variation::from(&VARIATIONS[0])
        };

        assert!(matches!(
            domain::Variation::try_from(variation),
            Err(SnapshotError::UnknownBits {
                field: "equipment",
                ..
            })
        ));
    }

    #[test]
    fn test_user_exercise_try_from() {
        assert_eq!(
            domain::UserExercise::try_from(UserExercise::from(&*USER_EXERCISE)).unwrap(),
            USER_EXERCISE.clone()
        );
    }

    #[test]
    fn test_user_variation_try_from() {
        assert_eq!(
            domain::UserVariation::try_from(UserVariation::from(&*USER_VARIATION)).unwrap(),
            USER_VARIATION.clone()
        );
    }

    #[test]
    fn test_user_variation_serde() {
        let obj = UserVariation::from(&*USER_VARIATION);
        let serialized = json!(obj);
        let deserialized: UserVariation = serde_json::from_value(serialized).unwrap();
        assert_eq!(deserialized, obj);
    }

    #[test]
    fn test_snapshot_defaults() {
        let snapshot = Snapshot::from_json(
            r#"{"users": [{"id": "00000000-0000-0000-0000-000000000001", "equipment": 1}]}"#,
        )
        .unwrap();

        assert_eq!(snapshot.settings, domain::Settings::default());
        assert_eq!(
            snapshot.users,
            vec![User {
                id: Uuid::from_u128(1),
                equipment: 1,
                is_new_to_fitness: false,
            }]
        );
        assert!(snapshot.exercises.is_empty());
    }

    #[test]
    fn test_snapshot_invalid_json() {
        assert!(matches!(
            Snapshot::from_json("{"),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn test_snapshot_catalog() {
        let snapshot = Snapshot {
            exercises: EXERCISES.iter().map(Exercise::from).collect(),
            variations: VARIATIONS.iter().map(Variation::from).collect(),
            ..Snapshot::default()
        };

        let catalog = snapshot.catalog().unwrap();

        assert_eq!(catalog.exercises().count(), EXERCISES.len());
        assert_eq!(catalog.variations(), VARIATIONS.as_slice());
    }

    #[test]
    fn test_snapshot_catalog_unknown_exercise() {
        let snapshot = Snapshot {
            variations: VARIATIONS.iter().map(Variation::from).collect(),
            ..Snapshot::default()
        };

        assert!(matches!(
            snapshot.catalog(),
            Err(SnapshotError::InvalidCatalog(
                domain::CatalogError::UnknownExercise(_)
            ))
        ));
    }
}
