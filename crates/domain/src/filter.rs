use log::debug;

use crate::{Candidate, FlagAlgebra, SelectionOptions};

type Filter = fn(&SelectionOptions, &Candidate<'_>) -> bool;

const FILTERS: [Filter; 14] = [
    section,
    sports_focus,
    skills,
    equipment,
    exercise_ids,
    variation_ids,
    exclusions,
    exercise_focus,
    movement_patterns,
    muscle_movement,
    muscle_contractions,
    joints,
    target_muscles,
    excluded_muscles,
];

/// Keeps the candidates satisfying all set options.
#[must_use]
pub fn filter<'a>(
    options: &SelectionOptions,
    candidates: Vec<Candidate<'a>>,
) -> Vec<Candidate<'a>> {
    let count = candidates.len();
    let filtered = candidates
        .into_iter()
        .filter(|candidate| matches(options, candidate))
        .collect::<Vec<_>>();
    debug!("filtered {} of {count} candidates", filtered.len());
    filtered
}

#[must_use]
pub fn matches(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    FILTERS.iter().all(|f| f(options, candidate))
}

fn section(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    options.section.matches(candidate.variation.section)
}

fn sports_focus(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    let focus = candidate.variation.sports_focus;
    match options.sports_focus.sports_focus {
        None => true,
        Some(requested) if requested.is_empty() => focus.is_empty(),
        Some(requested) => {
            focus.has_any(requested) || (options.sports_focus.include_none && focus.is_empty())
        }
    }
}

fn skills(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    let Some(skill_type) = options.skills.skill_type else {
        return true;
    };
    let exercise = candidate.exercise;
    let overlaps =
        exercise.skill_type.has_any(skill_type) && exercise.skills.has_any(options.skills.skills);
    overlaps || (!options.skills.require && exercise.skills.is_empty())
}

fn equipment(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    options
        .equipment
        .is_none_or(|e| candidate.variation.is_possible_with(e))
}

fn exercise_ids(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    options
        .exercise_ids
        .as_ref()
        .is_none_or(|ids| ids.contains(&candidate.exercise.id))
}

fn variation_ids(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    options
        .variation_ids
        .as_ref()
        .is_none_or(|ids| ids.contains(&candidate.variation.id))
}

fn exclusions(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    let exclusions = &options.exclusions;
    let exercise = candidate.exercise;
    !exclusions.exercise_ids.contains(&exercise.id)
        && !exclusions.variation_ids.contains(&candidate.variation.id)
        && !exclusions.skills.iter().any(|(skill_type, skills)| {
            exercise.skill_type.has_any(*skill_type) && exercise.skills.has_any(*skills)
        })
}

fn exercise_focus(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    let focus = candidate.variation.exercise_focus;
    options.exercise_focus.is_none_or(|f| focus.has_any(f))
        && options.exclude_exercise_focus.is_none_or(|f| !focus.has_any(f))
}

fn movement_patterns(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    let pattern = candidate.variation.movement_pattern;
    options
        .movement_patterns
        .movement_patterns
        .is_none_or(|requested| {
            if requested.is_empty() {
                pattern.is_empty()
            } else {
                pattern.has_any(requested)
            }
        })
}

fn muscle_movement(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    options
        .muscle_movement
        .is_none_or(|m| candidate.variation.muscle_movement.has_any(m))
}

fn muscle_contractions(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    options
        .muscle_contractions
        .is_none_or(|c| candidate.variation.muscle_contractions.has_any(c))
}

fn joints(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    options
        .joints
        .is_none_or(|j| candidate.variation.mobility_joints.has_any(j))
}

fn target_muscles(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    let muscle_groups = &options.muscle_groups;
    muscle_groups.target_muscles().is_none_or(|target| {
        muscle_groups
            .muscle_target()
            .muscles(candidate.variation)
            .has_any(target)
    })
}

fn excluded_muscles(options: &SelectionOptions, candidate: &Candidate<'_>) -> bool {
    let muscle_groups = &options.muscle_groups;
    muscle_groups.excluded_muscles().is_none_or(|excluded| {
        !muscle_groups
            .muscle_target()
            .muscles(candidate.variation)
            .has_any(excluded)
    })
}
