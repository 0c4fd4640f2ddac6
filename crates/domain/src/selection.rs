use std::{cmp::Reverse, collections::BTreeMap};

use log::{debug, warn};
use rand::Rng;

use crate::{
    Catalog, Context, Exercise, FallbackReason, FlagAlgebra, MovementPattern, MuscleGroups,
    MuscleMovement, Ordering, PrerequisiteGate, Progression, Resolution, Section,
    SelectionOptions, UserExercise, UserVariation, Variation, filter, resolve, siblings,
};

/// A selected exercise variation.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub exercise: Exercise,
    pub variation: Variation,
    pub user_exercise: Option<UserExercise>,
    pub user_variation: Option<UserVariation>,
    pub progression: Option<Progression>,
    pub easier_variation: Option<Variation>,
    pub harder_variation: Option<Variation>,
    pub reason: Option<FallbackReason>,
    pub next_progression: Option<Progression>,
    pub is_fallback: bool,
}

impl From<&Resolution<'_>> for Selection {
    fn from(value: &Resolution<'_>) -> Self {
        let candidate = value.candidate;
        Self {
            exercise: candidate.exercise.clone(),
            variation: candidate.variation.clone(),
            user_exercise: candidate.user_exercise.cloned(),
            user_variation: candidate.user_variation.cloned(),
            progression: candidate.progression,
            easier_variation: value.easier_variation.cloned(),
            harder_variation: value.harder_variation.cloned(),
            reason: value.reason,
            next_progression: value.next_progression,
            is_fallback: value.is_fallback,
        }
    }
}

/// Selects and orders exercise variations for the given context.
pub fn select(
    catalog: &Catalog,
    context: Context<'_>,
    options: &SelectionOptions,
    rng: &mut impl Rng,
) -> Vec<Selection> {
    if options.is_empty_allow_list() {
        debug!("empty allow list, skipping selection");
        return vec![];
    }

    let context = context.cap_at_proficiency(options.progression.cap_at_proficiency);
    let candidates = catalog.candidates(&context, options.section);
    let siblings = siblings(&candidates, options.section);
    let mut candidates = filter(options, candidates);
    PrerequisiteGate::new(catalog, context, options).retain(&mut candidates, |c| c.exercise);
    let resolutions = resolve(&candidates, &siblings, &options.progression);

    let mut selected = greedy(pre_sort(resolutions, &context, rng), options);
    order(&mut selected, options);

    debug!("selected {} variations", selected.len());

    selected.iter().map(Selection::from).collect()
}

/// Puts variations with a pending refresh first, followed by the least recently seen.
fn pre_sort<'a>(
    resolutions: Vec<Resolution<'a>>,
    context: &Context<'_>,
    rng: &mut impl Rng,
) -> Vec<Resolution<'a>> {
    let mut keyed = resolutions
        .into_iter()
        .map(|r| {
            let key = (
                !r.candidate.is_refresh_pending(context.today),
                r.candidate.last_seen(),
                rng.random::<u64>(),
            );
            (key, r)
        })
        .collect::<Vec<_>>();
    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, r)| r).collect()
}

fn greedy<'a>(resolutions: Vec<Resolution<'a>>, options: &SelectionOptions) -> Vec<Resolution<'a>> {
    let mut state = State::new(options);
    let mut threshold = options.muscle_groups.coverage_threshold();

    loop {
        for resolution in &resolutions {
            if state.is_complete(options) {
                break;
            }
            if state.accepts(resolution, threshold, options) {
                state.add(*resolution, options);
            }
        }

        match threshold {
            Some(t) if t > 1 && !state.is_complete(options) => {
                warn!("decreasing muscle coverage threshold to {}", t - 1);
                threshold = Some(t - 1);
            }
            _ => break,
        }
    }

    state.selected
}

struct State<'a> {
    selected: Vec<Resolution<'a>>,
    worked: BTreeMap<MuscleGroups, u32>,
    movement_patterns: MovementPattern,
}

impl<'a> State<'a> {
    fn new(options: &SelectionOptions) -> Self {
        Self {
            selected: vec![],
            worked: options.muscle_groups.worked(),
            movement_patterns: MovementPattern::empty(),
        }
    }

    fn is_complete(&self, options: &SelectionOptions) -> bool {
        options.limit().is_some_and(|take| self.selected.len() >= take)
            || (options.muscle_groups.coverage_threshold().is_some()
                && self.unworked_muscles(options).is_empty())
    }

    fn unworked_muscles(&self, options: &SelectionOptions) -> MuscleGroups {
        let muscle_groups = &options.muscle_groups;
        muscle_groups
            .target_muscles()
            .unwrap_or_else(MuscleGroups::empty)
            .iter()
            .filter(|m| self.worked.get(m).copied().unwrap_or(0) < muscle_groups.rda_of(*m))
            .fold(MuscleGroups::empty(), |muscles, m| muscles | m)
    }

    fn overworked_muscles(&self, options: &SelectionOptions) -> MuscleGroups {
        self.worked
            .iter()
            .filter(|(m, count)| {
                options
                    .muscle_groups
                    .tul_of(**m)
                    .is_some_and(|tul| **count >= tul)
            })
            .fold(MuscleGroups::empty(), |muscles, (m, _)| muscles | *m)
    }

    fn accepts(
        &self,
        resolution: &Resolution<'_>,
        threshold: Option<usize>,
        options: &SelectionOptions,
    ) -> bool {
        let exercise = resolution.candidate.exercise;
        let variation = resolution.candidate.variation;
        let muscles = options.muscle_groups.muscle_target().muscles(variation);

        if self.selected.iter().any(|s| {
            let other = s.candidate.exercise;
            s.candidate.variation.id == variation.id
                || (options.unique_exercises && other.id == exercise.id)
                || other.has_prerequisite(exercise.id)
                || exercise.has_prerequisite(other.id)
                || (other.id != exercise.id && other.shares_skills(exercise))
        }) {
            return false;
        }

        if muscles.has_any(self.overworked_muscles(options)) {
            return false;
        }

        if let Some(threshold) = threshold {
            let unworked = self.unworked_muscles(options);
            let required = threshold.min(unworked.count()).max(1);
            if (muscles & unworked).count() < required {
                return false;
            }
        }

        if options.movement_patterns.is_unique {
            if let Some(requested) = options
                .movement_patterns
                .movement_patterns
                .filter(|p| !p.is_empty())
            {
                let unworked = requested.unset(self.movement_patterns);
                if !variation.movement_pattern.has_any(unworked) {
                    return false;
                }
            }
        }

        true
    }

    fn add(&mut self, resolution: Resolution<'a>, options: &SelectionOptions) {
        let variation = resolution.candidate.variation;
        for muscle in options.muscle_groups.muscle_target().muscles(variation).iter() {
            *self.worked.entry(muscle).or_default() += 1;
        }
        self.movement_patterns |= variation.movement_pattern;
        self.selected.push(resolution);
    }
}

fn order(selected: &mut [Resolution<'_>], options: &SelectionOptions) {
    let muscle_target = options.muscle_groups.muscle_target();
    let target = options
        .muscle_groups
        .target_muscles()
        .unwrap_or_else(MuscleGroups::all);
    let difficulty = |r: &Resolution<'_>| r.candidate.variation.progression.difficulty();
    let is_core = |r: &Resolution<'_>| r.candidate.variation.section.contains(Section::CORE);

    match options.ordering {
        Ordering::None => {}
        Ordering::MuscleCount => {
            selected.sort_by_key(|r| muscle_target.muscles(r.candidate.variation).count());
        }
        Ordering::UniqueMuscles => selected.sort_by_key(|r| {
            (
                Reverse((muscle_target.muscles(r.candidate.variation) & target).count()),
                Reverse(difficulty(r)),
            )
        }),
        Ordering::CoreLast => selected.sort_by_key(|r| (is_core(r), Reverse(difficulty(r)))),
        Ordering::PlyometricFirst => selected.sort_by_key(|r| {
            (
                !r.candidate
                    .variation
                    .muscle_movement
                    .contains(MuscleMovement::PLYOMETRIC),
                is_core(r),
                Reverse(difficulty(r)),
            )
        }),
        Ordering::Progression => {
            selected.sort_by(|a, b| progression_key(a).cmp(&progression_key(b)));
        }
        Ordering::Debug => selected.sort_by(|a, b| {
            (&a.candidate.exercise.name, progression_key(a))
                .cmp(&(&b.candidate.exercise.name, progression_key(b)))
        }),
    }
}

fn progression_key<'a>(
    resolution: &Resolution<'a>,
) -> (Progression, bool, Option<Progression>, &'a str) {
    let variation = resolution.candidate.variation;
    let range = variation.progression;
    (
        range.min().unwrap_or(Progression::MIN),
        range.max().is_none(),
        range.max(),
        variation.name.as_str(),
    )
}
