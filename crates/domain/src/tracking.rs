use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use crate::{
    ExerciseID, Progression, ReadError, Section, Selection, UpdateError, User, UserID, VariationID,
};

#[allow(async_fn_in_trait)]
pub trait TrackingRepository {
    async fn read_history(&self, user_id: UserID) -> Result<History, ReadError>;
    async fn upsert_user_exercise(
        &self,
        user_exercise: UserExercise,
    ) -> Result<UserExercise, UpdateError>;
    async fn upsert_user_variation(
        &self,
        user_variation: UserVariation,
    ) -> Result<UserVariation, UpdateError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserExercise {
    pub user_id: UserID,
    pub exercise_id: ExerciseID,
    pub progression: Progression,
    pub ignore: bool,
    pub last_seen: Option<NaiveDate>,
    pub last_visible: Option<NaiveDate>,
}

impl UserExercise {
    #[must_use]
    pub fn new(user_id: UserID, exercise_id: ExerciseID, progression: Progression) -> Self {
        Self {
            user_id,
            exercise_id,
            progression,
            ignore: false,
            last_seen: None,
            last_visible: None,
        }
    }

    pub fn set_progression(&mut self, value: u8) {
        self.progression = Progression::tracked(value);
    }

    pub fn ignore(&mut self, ignore: bool) {
        self.ignore = ignore;
    }

    pub fn mark_seen(&mut self, today: NaiveDate) {
        self.last_seen = Some(today);
        self.last_visible = Some(today);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserVariation {
    pub user_id: UserID,
    pub variation_id: VariationID,
    pub section: Section,
    pub ignore: bool,
    pub last_seen: Option<NaiveDate>,
    pub refresh_after: Option<NaiveDate>,
    pub lag_refresh_weeks: u8,
    pub pad_refresh_weeks: u8,
}

impl UserVariation {
    #[must_use]
    pub fn new(user_id: UserID, variation_id: VariationID, section: Section) -> Self {
        Self {
            user_id,
            variation_id,
            section,
            ignore: false,
            last_seen: None,
            refresh_after: None,
            lag_refresh_weeks: 0,
            pad_refresh_weeks: 0,
        }
    }

    pub fn ignore(&mut self, ignore: bool) {
        self.ignore = ignore;
    }

    /// A pending refresh keeps the variation pinned until the refresh date is reached.
    #[must_use]
    pub fn is_refresh_pending(&self, today: NaiveDate) -> bool {
        self.refresh_after.is_some_and(|date| today < date)
    }

    /// Pads the last seen date into the future to delay the next appearance and pins the
    /// variation for the lag period. Returns whether the record changed.
    pub fn mark_seen(&mut self, today: NaiveDate) -> bool {
        if self.is_refresh_pending(today) {
            return false;
        }

        self.last_seen = Some(today + weeks(self.pad_refresh_weeks));
        self.refresh_after =
            (self.lag_refresh_weeks > 0).then(|| today + weeks(self.lag_refresh_weeks));
        true
    }
}

fn weeks(count: u8) -> Days {
    Days::new(7 * u64::from(count))
}

/// Snapshot of a user's tracking records.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct History {
    exercises: BTreeMap<ExerciseID, UserExercise>,
    variations: BTreeMap<(VariationID, Section), UserVariation>,
}

impl History {
    #[must_use]
    pub fn new(
        user_exercises: impl IntoIterator<Item = UserExercise>,
        user_variations: impl IntoIterator<Item = UserVariation>,
    ) -> Self {
        Self {
            exercises: user_exercises
                .into_iter()
                .map(|e| (e.exercise_id, e))
                .collect(),
            variations: user_variations
                .into_iter()
                .map(|v| ((v.variation_id, v.section), v))
                .collect(),
        }
    }

    #[must_use]
    pub fn user_exercise(&self, id: ExerciseID) -> Option<&UserExercise> {
        self.exercises.get(&id)
    }

    #[must_use]
    pub fn user_variation(&self, id: VariationID, section: Section) -> Option<&UserVariation> {
        self.variations.get(&(id, section))
    }

    pub fn user_exercises(&self) -> impl Iterator<Item = &UserExercise> {
        self.exercises.values()
    }

    pub fn user_variations(&self) -> impl Iterator<Item = &UserVariation> {
        self.variations.values()
    }
}

/// Tracking records to be written back after a selection run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrackingUpdates {
    pub user_exercises: Vec<UserExercise>,
    pub user_variations: Vec<UserVariation>,
}

impl TrackingUpdates {
    #[must_use]
    pub fn new(user: &User, section: Section, selections: &[Selection], today: NaiveDate) -> Self {
        let mut updates = Self::default();

        for selection in selections {
            let mut user_exercise = selection.user_exercise.clone().unwrap_or_else(|| {
                UserExercise::new(
                    user.id,
                    selection.exercise.id,
                    selection.progression.unwrap_or(Progression::MIN),
                )
            });
            user_exercise.mark_seen(today);
            if !updates
                .user_exercises
                .iter()
                .any(|e| e.exercise_id == user_exercise.exercise_id)
            {
                updates.user_exercises.push(user_exercise);
            }

            let mut user_variation = selection
                .user_variation
                .clone()
                .unwrap_or_else(|| UserVariation::new(user.id, selection.variation.id, section));
            let is_new = selection.user_variation.is_none();
            if user_variation.mark_seen(today) || is_new {
                updates.user_variations.push(user_variation);
            }
        }

        updates
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user_exercises.is_empty() && self.user_variations.is_empty()
    }
}
