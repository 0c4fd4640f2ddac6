use std::collections::BTreeSet;

use log::debug;

use crate::{
    Catalog, Context, Exercise, ExerciseID, FlagAlgebra, Prerequisite, Progression, Section,
    SelectionOptions, UserExercise,
};

/// Excludes exercises whose prerequisites have not been practised sufficiently.
#[derive(Debug)]
pub struct PrerequisiteGate<'a> {
    context: Context<'a>,
    checked: BTreeSet<(ExerciseID, Progression)>,
}

impl<'a> PrerequisiteGate<'a> {
    #[must_use]
    pub fn new(catalog: &Catalog, context: Context<'a>, options: &SelectionOptions) -> Self {
        let sections = Section::WORKOUT | options.section;
        let sports_focus = options.sports_focus.sports_focus;
        let since = context
            .today
            .checked_sub_days(context.settings.prerequisite_visibility());

        let mut checked = BTreeSet::new();
        for prerequisite in catalog
            .exercises()
            .filter(|e| e.is_active())
            .flat_map(|e| &e.prerequisites)
        {
            let Some(exercise) = catalog.exercise(prerequisite.exercise_id) else {
                continue;
            };
            let user_exercise = context.history.user_exercise(exercise.id);
            let is_visible = user_exercise.is_none_or(|e| {
                !e.ignore
                    && e.last_visible
                        .is_none_or(|date| since.is_none_or(|since| date >= since))
            });
            let has_matching_variation = catalog.variations_of(exercise.id).any(|v| {
                sections.has_any(v.section)
                    && sports_focus
                        .is_none_or(|f| v.sports_focus.is_empty() || v.sports_focus.has_any(f))
                    && v.progression.contains(prerequisite.proficiency)
            });
            if exercise.is_active() && is_visible && has_matching_variation {
                checked.insert((prerequisite.exercise_id, prerequisite.proficiency));
            }
        }

        Self { context, checked }
    }

    #[must_use]
    pub fn is_eligible(&self, exercise: &Exercise) -> bool {
        if self.context.user.is_none() {
            return true;
        }

        exercise
            .prerequisites
            .iter()
            .filter(|p| self.is_checked(p))
            .all(|p| {
                self.context
                    .history
                    .user_exercise(p.exercise_id)
                    .is_some_and(|e| is_met(e, p))
            })
    }

    fn is_checked(&self, prerequisite: &Prerequisite) -> bool {
        self.checked
            .contains(&(prerequisite.exercise_id, prerequisite.proficiency))
    }

    /// Keeps the items whose exercise is eligible.
    pub fn retain<T>(&self, items: &mut Vec<T>, exercise: impl Fn(&T) -> &Exercise) {
        let count = items.len();
        items.retain(|item| self.is_eligible(exercise(item)));
        debug!("{} of {count} candidates meet their prerequisites", items.len());
    }
}

fn is_met(user_exercise: &UserExercise, prerequisite: &Prerequisite) -> bool {
    user_exercise.progression >= prerequisite.proficiency && user_exercise.last_visible.is_some()
}
