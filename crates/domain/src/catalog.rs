use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use log::debug;

use crate::{
    Exercise, ExerciseID, History, Progression, ReadError, Section, Settings, User,
    UserExercise, UserVariation, Variation,
};

#[allow(async_fn_in_trait)]
pub trait CatalogRepository {
    async fn read_catalog(&self) -> Result<Catalog, ReadError>;
}

/// Validated snapshot of all exercises and their variations.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Catalog {
    exercises: BTreeMap<ExerciseID, Exercise>,
    variations: Vec<Variation>,
    variations_by_exercise: BTreeMap<ExerciseID, Vec<usize>>,
}

impl Catalog {
    pub fn new(exercises: Vec<Exercise>, variations: Vec<Variation>) -> Result<Self, CatalogError> {
        let exercises = exercises
            .into_iter()
            .map(|e| (e.id, e))
            .collect::<BTreeMap<_, _>>();

        let mut variations_by_exercise: BTreeMap<ExerciseID, Vec<usize>> = BTreeMap::new();
        for (index, variation) in variations.iter().enumerate() {
            if !exercises.contains_key(&variation.exercise_id) {
                return Err(CatalogError::UnknownExercise(variation.name.clone()));
            }
            variations_by_exercise
                .entry(variation.exercise_id)
                .or_default()
                .push(index);
        }

        for exercise in exercises.values() {
            for prerequisite in &exercise.prerequisites {
                if !exercises.contains_key(&prerequisite.exercise_id) {
                    return Err(CatalogError::UnknownPrerequisite(exercise.name.clone()));
                }
            }
        }

        if let Some(exercise) = find_prerequisite_cycle(&exercises) {
            return Err(CatalogError::PrerequisiteCycle(exercise.name.clone()));
        }

        Ok(Self {
            exercises,
            variations,
            variations_by_exercise,
        })
    }

    #[must_use]
    pub fn exercise(&self, id: ExerciseID) -> Option<&Exercise> {
        self.exercises.get(&id)
    }

    pub fn exercises(&self) -> impl Iterator<Item = &Exercise> {
        self.exercises.values()
    }

    #[must_use]
    pub fn variations(&self) -> &[Variation] {
        &self.variations
    }

    /// Active variations of an exercise in catalog order.
    pub fn variations_of(&self, id: ExerciseID) -> impl Iterator<Item = &Variation> {
        self.variations_by_exercise
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&index| &self.variations[index])
            .filter(|v| v.is_active())
    }

    /// Projects the catalog onto one candidate per active exercise and variation, annotated
    /// with the viewer's history and eligibility.
    #[must_use]
    pub fn candidates<'a>(&'a self, context: &Context<'a>, section: Section) -> Vec<Candidate<'a>> {
        let mut candidates = vec![];

        let is_suitable = |variation: &Variation| {
            !(variation.uses_caution && context.user.is_some_and(|u| u.is_new_to_fitness))
        };

        for exercise in self.exercises.values().filter(|e| e.is_active()) {
            let user_exercise = context
                .user
                .and_then(|_| context.history.user_exercise(exercise.id));

            if user_exercise.is_some_and(|e| e.ignore) {
                continue;
            }

            let progression = context.progression(exercise.id, section);
            let annotated = |variation: &'a Variation| {
                annotate(context, exercise, variation, user_exercise, progression, section)
            };

            let current = self
                .variations_of(exercise.id)
                .filter(|v| is_suitable(v) && section.matches(v.section))
                .map(annotated)
                .filter(Candidate::is_progression_in_range)
                .collect::<Vec<_>>();
            let has_current_variations = !current.is_empty();
            let all_current_variations_ignored =
                has_current_variations && current.iter().all(Candidate::is_ignored);
            let all_current_variations_missing_equipment =
                has_current_variations && current.iter().all(|c| !c.user_owns_equipment);

            for variation in self.variations_of(exercise.id).filter(|v| is_suitable(v)) {
                candidates.push(Candidate {
                    has_current_variations,
                    all_current_variations_ignored,
                    all_current_variations_missing_equipment,
                    ..annotated(variation)
                });
            }
        }

        debug!("projected {} candidates", candidates.len());

        candidates
    }
}

fn annotate<'a>(
    context: &Context<'a>,
    exercise: &'a Exercise,
    variation: &'a Variation,
    user_exercise: Option<&'a UserExercise>,
    progression: Option<Progression>,
    section: Section,
) -> Candidate<'a> {
    Candidate {
        exercise,
        variation,
        user_exercise,
        user_variation: context
            .user
            .and_then(|_| context.history.user_variation(variation.id, section)),
        progression,
        is_min_progression_in_range: progression
            .is_none_or(|p| variation.progression.is_min_in_range(p)),
        is_max_progression_in_range: progression
            .is_none_or(|p| variation.progression.is_max_in_range(p)),
        user_owns_equipment: context
            .user
            .is_none_or(|u| variation.is_possible_with(u.equipment)),
        has_current_variations: false,
        all_current_variations_ignored: false,
        all_current_variations_missing_equipment: false,
    }
}

fn find_prerequisite_cycle(exercises: &BTreeMap<ExerciseID, Exercise>) -> Option<&Exercise> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Visiting,
        Done,
    }

    fn visit(
        id: ExerciseID,
        exercises: &BTreeMap<ExerciseID, Exercise>,
        states: &mut BTreeMap<ExerciseID, State>,
    ) -> bool {
        match states.get(&id) {
            Some(State::Visiting) => return true,
            Some(State::Done) => return false,
            None => {}
        }
        states.insert(id, State::Visiting);
        let has_cycle = exercises.get(&id).is_some_and(|exercise| {
            exercise
                .prerequisites
                .iter()
                .any(|p| visit(p.exercise_id, exercises, states))
        });
        states.insert(id, State::Done);
        has_cycle
    }

    let mut states = BTreeMap::new();
    exercises
        .values()
        .find(|exercise| visit(exercise.id, exercises, &mut states))
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("Variation \"{0}\" belongs to an unknown exercise")]
    UnknownExercise(String),
    #[error("Exercise \"{0}\" has an unknown prerequisite")]
    UnknownPrerequisite(String),
    #[error("Exercise \"{0}\" is part of a prerequisite cycle")]
    PrerequisiteCycle(String),
}

/// The viewer of a selection run. Without a user, the catalog is listed without history.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub user: Option<&'a User>,
    pub history: &'a History,
    pub settings: &'a Settings,
    pub today: NaiveDate,
    pub cap_at_proficiency: bool,
}

impl<'a> Context<'a> {
    #[must_use]
    pub fn new(
        user: Option<&'a User>,
        history: &'a History,
        settings: &'a Settings,
        today: NaiveDate,
    ) -> Self {
        Self {
            user,
            history,
            settings,
            today,
            cap_at_proficiency: false,
        }
    }

    #[must_use]
    pub fn cap_at_proficiency(self, cap_at_proficiency: bool) -> Self {
        Self {
            cap_at_proficiency,
            ..self
        }
    }

    /// The user's progression on an exercise, falling back to a default for unseen exercises.
    #[must_use]
    pub fn progression(&self, id: ExerciseID, section: Section) -> Option<Progression> {
        let user = self.user?;
        let progression = self.history.user_exercise(id).map_or_else(
            || user.default_progression(section, self.settings),
            |e| e.progression,
        );
        Some(if self.cap_at_proficiency {
            progression.min(self.settings.proficiency_cap)
        } else {
            progression
        })
    }
}

/// An exercise variation under consideration for a viewer.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub exercise: &'a Exercise,
    pub variation: &'a Variation,
    pub user_exercise: Option<&'a UserExercise>,
    pub user_variation: Option<&'a UserVariation>,
    pub progression: Option<Progression>,
    pub is_min_progression_in_range: bool,
    pub is_max_progression_in_range: bool,
    pub user_owns_equipment: bool,
    pub has_current_variations: bool,
    pub all_current_variations_ignored: bool,
    pub all_current_variations_missing_equipment: bool,
}

impl Candidate<'_> {
    #[must_use]
    pub fn is_progression_in_range(&self) -> bool {
        self.is_min_progression_in_range && self.is_max_progression_in_range
    }

    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.user_variation.is_some_and(|v| v.ignore)
    }

    #[must_use]
    pub fn is_refresh_pending(&self, today: NaiveDate) -> bool {
        self.user_variation
            .is_some_and(|v| v.is_refresh_pending(today))
    }

    /// Days since the common era of the last time the exercise and the variation were seen,
    /// added up. Never seen counts as zero.
    #[must_use]
    pub fn last_seen(&self) -> i64 {
        let days = |date: Option<NaiveDate>| date.map_or(0, |d| i64::from(d.num_days_from_ce()));
        days(self.user_exercise.and_then(|e| e.last_seen))
            + days(self.user_variation.and_then(|v| v.last_seen))
    }
}
