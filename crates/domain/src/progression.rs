use std::{cmp::Reverse, collections::BTreeMap};

use log::debug;
use strum::Display;

use crate::{Candidate, ExerciseID, Progression, ProgressionOptions, Section, Variation};

/// Variations of an exercise in the queried section, before filtering.
pub type Siblings<'a> = BTreeMap<ExerciseID, Vec<Candidate<'a>>>;

#[must_use]
pub fn siblings<'a>(candidates: &[Candidate<'a>], section: Section) -> Siblings<'a> {
    let mut siblings = Siblings::new();
    for candidate in candidates
        .iter()
        .filter(|c| section.matches(c.variation.section))
    {
        siblings
            .entry(candidate.exercise.id)
            .or_default()
            .push(*candidate);
    }
    siblings
}

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    #[strum(to_string = "Ignored")]
    Ignored,
    #[strum(to_string = "Missing Equipment")]
    MissingEquipment,
}

/// The variation chosen for an exercise together with the neighbouring progressions.
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub candidate: Candidate<'a>,
    pub easier_variation: Option<&'a Variation>,
    pub harder_variation: Option<&'a Variation>,
    pub reason: Option<FallbackReason>,
    pub next_progression: Option<Progression>,
    pub is_fallback: bool,
}

/// Replaces each candidate by the variation of its exercise matching the user's progression.
/// Candidates resolving to the same variation are merged.
#[must_use]
pub fn resolve<'a>(
    candidates: &[Candidate<'a>],
    siblings: &Siblings<'a>,
    options: &ProgressionOptions,
) -> Vec<Resolution<'a>> {
    let mut resolutions: Vec<Resolution<'a>> = vec![];

    for candidate in candidates {
        let siblings = siblings
            .get(&candidate.exercise.id)
            .map_or(&[][..], Vec::as_slice);
        let Some(resolution) = resolve_candidate(candidate, siblings, options) else {
            continue;
        };
        if resolutions
            .iter()
            .all(|r| r.candidate.variation.id != resolution.candidate.variation.id)
        {
            resolutions.push(resolution);
        }
    }

    debug!(
        "resolved {} of {} candidates",
        resolutions.len(),
        candidates.len()
    );

    resolutions
}

fn resolve_candidate<'a>(
    candidate: &Candidate<'a>,
    siblings: &[Candidate<'a>],
    options: &ProgressionOptions,
) -> Option<Resolution<'a>> {
    if is_usable(candidate) {
        return Some(resolution(*candidate, siblings, None, false));
    }

    if siblings.iter().any(is_usable) {
        return None;
    }

    let progression = candidate.progression?;
    let all_ignored = candidate.all_current_variations_ignored;
    let reason = if all_ignored {
        Some(FallbackReason::Ignored)
    } else if candidate.all_current_variations_missing_equipment {
        Some(FallbackReason::MissingEquipment)
    } else {
        None
    };
    let harder_cap = next_bound(
        siblings
            .iter()
            .filter(|c| c.user_owns_equipment && !c.is_ignored()),
        progression,
    );
    let is_preferred = |c: &Candidate<'_>| c.is_ignored() == all_ignored;
    let pool = siblings
        .iter()
        .filter(|c| c.user_owns_equipment && !c.is_progression_in_range());

    let find_easier = || {
        pool.clone()
            .filter(|c| {
                c.variation
                    .progression
                    .max()
                    .is_some_and(|max| max <= progression)
            })
            .min_by_key(|c| (Reverse(c.variation.progression.max()), !is_preferred(c)))
    };
    let find_harder = || {
        pool.clone()
            .filter(|c| {
                c.variation.progression.min().is_some_and(|min| {
                    min >= progression && harder_cap.is_none_or(|cap| min <= cap)
                })
            })
            .min_by_key(|c| (c.variation.progression.min(), !is_preferred(c)))
    };
    let may_progress = all_ignored
        || candidate.all_current_variations_missing_equipment
        || !candidate.has_current_variations;

    let fallback = options
        .allow_lesser_progressions
        .then(find_easier)
        .flatten()
        .or_else(|| {
            (options.allow_greater_progressions && may_progress)
                .then(find_harder)
                .flatten()
        })?;

    debug!(
        "falling back from {} to {} ({reason:?})",
        candidate.variation.name, fallback.variation.name
    );

    Some(resolution(*fallback, siblings, reason, true))
}

fn is_usable(candidate: &Candidate<'_>) -> bool {
    candidate.is_progression_in_range() && !candidate.is_ignored() && candidate.user_owns_equipment
}

fn resolution<'a>(
    candidate: Candidate<'a>,
    siblings: &[Candidate<'a>],
    reason: Option<FallbackReason>,
    is_fallback: bool,
) -> Resolution<'a> {
    let difficulty = candidate.variation.progression.difficulty();
    let neighbours = siblings.iter().filter(|c| {
        c.user_owns_equipment && !c.is_ignored() && c.variation.id != candidate.variation.id
    });

    Resolution {
        candidate,
        easier_variation: neighbours
            .clone()
            .filter(|c| c.variation.progression.difficulty() < difficulty)
            .max_by_key(|c| c.variation.progression.difficulty())
            .map(|c| c.variation),
        harder_variation: neighbours
            .filter(|c| c.variation.progression.difficulty() > difficulty)
            .min_by_key(|c| c.variation.progression.difficulty())
            .map(|c| c.variation),
        reason,
        next_progression: next_progression(siblings, candidate.progression),
        is_fallback,
    }
}

/// The lowest progression above the current one at which another variation begins or ends.
fn next_progression(
    siblings: &[Candidate<'_>],
    progression: Option<Progression>,
) -> Option<Progression> {
    next_bound(siblings.iter().filter(|c| !c.is_ignored()), progression?)
}

fn next_bound<'a, 'b: 'a>(
    candidates: impl Iterator<Item = &'a Candidate<'b>>,
    progression: Progression,
) -> Option<Progression> {
    candidates
        .flat_map(|c| [c.variation.progression.min(), c.variation.progression.max()])
        .flatten()
        .filter(|bound| *bound > progression)
        .min()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{
        Catalog, Context, Equipment, Exercise, History, Instruction, ProgressionRange, Settings,
        User, UserExercise, UserVariation,
        tests::data::{
            self, PUSH_UP, PUSH_UP_ARCHER, PUSH_UP_KNEE, PUSH_UP_STANDARD, SQUAT, TODAY,
        },
    };

    struct Fixture {
        catalog: Catalog,
        user: User,
        history: History,
        settings: Settings,
    }

    impl Fixture {
        fn new(progression: u8, ignored: &[crate::VariationID]) -> Self {
            let user = data::user();
            let history = History::new(
                [UserExercise::new(user.id, PUSH_UP, data::progression(progression))],
                ignored.iter().map(|id| UserVariation {
                    ignore: true,
                    ..UserVariation::new(user.id, *id, Section::FUNCTIONAL)
                }),
            );
            Self {
                catalog: data::catalog(),
                user,
                history,
                settings: Settings::default(),
            }
        }

        fn resolve(&self, options: &ProgressionOptions) -> Vec<(String, Option<FallbackReason>)> {
            let context = Context::new(Some(&self.user), &self.history, &self.settings, TODAY);
            let candidates = self.catalog.candidates(&context, Section::FUNCTIONAL);
            let siblings = siblings(&candidates, Section::FUNCTIONAL);
            let push_ups = candidates
                .iter()
                .filter(|c| c.exercise.id == PUSH_UP)
                .copied()
                .collect::<Vec<_>>();
            resolve(&push_ups, &siblings, options)
                .into_iter()
                .map(|r| (r.candidate.variation.name.clone(), r.reason))
                .collect()
        }
    }

    #[rstest]
    #[case::beginner(10, "Knee Push Up")]
    #[case::intermediate(50, "Push Up")]
    #[case::advanced(80, "Archer Push Up")]
    fn test_resolve_in_range(#[case] progression: u8, #[case] expected: &str) {
        assert_eq!(
            Fixture::new(progression, &[]).resolve(&ProgressionOptions::default()),
            vec![(expected.to_string(), None)]
        );
    }

    #[test]
    fn test_resolve_in_range_hints() {
        let fixture = Fixture::new(50, &[]);
        let context = Context::new(
            Some(&fixture.user),
            &fixture.history,
            &fixture.settings,
            TODAY,
        );
        let candidates = fixture.catalog.candidates(&context, Section::FUNCTIONAL);
        let siblings = siblings(&candidates, Section::FUNCTIONAL);

        let resolutions = resolve(&candidates, &siblings, &ProgressionOptions::default());
        let push_up = resolutions
            .iter()
            .find(|r| r.candidate.exercise.id == PUSH_UP)
            .unwrap();

        assert_eq!(push_up.candidate.variation.id, PUSH_UP_STANDARD);
        assert_eq!(push_up.easier_variation.map(|v| v.id), Some(PUSH_UP_KNEE));
        assert_eq!(push_up.harder_variation.map(|v| v.id), Some(PUSH_UP_ARCHER));
        assert_eq!(push_up.next_progression, Some(data::progression(70)));
        assert_eq!(push_up.reason, None);
        assert!(!push_up.is_fallback);
    }

    #[test]
    fn test_resolve_ignored_falls_back_to_easier() {
        assert_eq!(
            Fixture::new(50, &[PUSH_UP_STANDARD]).resolve(&ProgressionOptions::default()),
            vec![("Knee Push Up".to_string(), Some(FallbackReason::Ignored))]
        );
    }

    #[test]
    fn test_resolve_ignored_prefers_ignored_siblings() {
        assert_eq!(
            Fixture::new(50, &[PUSH_UP_STANDARD, PUSH_UP_KNEE])
                .resolve(&ProgressionOptions::default()),
            vec![("Knee Push Up".to_string(), Some(FallbackReason::Ignored))]
        );
    }

    #[test]
    fn test_resolve_ignored_falls_back_to_harder() {
        assert_eq!(
            Fixture::new(50, &[PUSH_UP_STANDARD]).resolve(&ProgressionOptions {
                allow_lesser_progressions: false,
                ..ProgressionOptions::default()
            }),
            vec![("Archer Push Up".to_string(), Some(FallbackReason::Ignored))]
        );
    }

    #[test]
    fn test_resolve_without_fallbacks() {
        assert_eq!(
            Fixture::new(50, &[PUSH_UP_STANDARD]).resolve(&ProgressionOptions {
                cap_at_proficiency: false,
                allow_lesser_progressions: false,
                allow_greater_progressions: false,
            }),
            vec![]
        );
    }

    #[test]
    fn test_resolve_lowest_progression_ignored() {
        assert_eq!(
            Fixture::new(10, &[PUSH_UP_KNEE]).resolve(&ProgressionOptions::default()),
            vec![("Push Up".to_string(), Some(FallbackReason::Ignored))]
        );
    }

    #[test]
    fn test_resolve_owned_sibling_is_not_a_fallback() {
        let user = User {
            equipment: Equipment::DUMBBELLS,
            ..data::user()
        };
        let history = History::default();
        let settings = Settings::default();
        let catalog = data::catalog();
        let context = Context::new(Some(&user), &history, &settings, TODAY);
        let candidates = catalog.candidates(&context, Section::FUNCTIONAL);
        let siblings = siblings(&candidates, Section::FUNCTIONAL);
        let squats = candidates
            .iter()
            .filter(|c| c.exercise.id == SQUAT)
            .copied()
            .collect::<Vec<_>>();

        let resolutions = resolve(&squats, &siblings, &ProgressionOptions::default());

        assert_eq!(
            resolutions
                .iter()
                .map(|r| r.candidate.variation.name.as_str())
                .collect::<Vec<_>>(),
            vec!["Goblet Squat"]
        );
        assert_eq!(resolutions[0].reason, None);
    }

    const ROW: ExerciseID = ExerciseID::from_u128(9);

    fn row(id: u128, name: &str, range: (u8, Option<u8>), equipment: Equipment) -> Variation {
        Variation {
            id: id.into(),
            exercise_id: ROW,
            name: name.to_string(),
            section: Section::FUNCTIONAL,
            progression: ProgressionRange::new(
                Some(data::progression(range.0)),
                range.1.map(data::progression),
            )
            .unwrap(),
            instructions: vec![Instruction {
                equipment,
                children: vec![],
            }],
            ..Variation::default()
        }
    }

    #[rstest]
    #[case::easier_owned(Equipment::DUMBBELLS, 75, Some("Inverted Row"))]
    #[case::harder_with_gap(Equipment::BARBELL, 75, Some("Dumbbell Row"))]
    #[case::harder_adjacent(Equipment::BARBELL, 70, Some("Dumbbell Row"))]
    fn test_resolve_missing_equipment_falls_back(
        #[case] easier_equipment: Equipment,
        #[case] harder_min: u8,
        #[case] expected: Option<&str>,
    ) {
        let user = data::user();
        let catalog = Catalog::new(
            vec![Exercise {
                id: ROW,
                name: "Row".to_string(),
                ..Exercise::default()
            }],
            vec![
                row(91, "Inverted Row", (0, Some(30)), easier_equipment),
                row(92, "Ring Row", (30, Some(70)), Equipment::GYMNASTIC_RINGS),
                row(93, "Dumbbell Row", (harder_min, None), Equipment::DUMBBELLS),
            ],
        )
        .unwrap();
        let history = History::new(
            [UserExercise::new(user.id, ROW, data::progression(50))],
            [],
        );
        let settings = Settings::default();
        let context = Context::new(Some(&user), &history, &settings, TODAY);
        let candidates = catalog.candidates(&context, Section::FUNCTIONAL);
        let siblings = siblings(&candidates, Section::FUNCTIONAL);

        let resolutions = resolve(&candidates, &siblings, &ProgressionOptions::default());

        assert_eq!(
            resolutions
                .iter()
                .map(|r| {
                    let name = r.candidate.variation.name.as_str();
                    (name, r.reason, r.is_fallback)
                })
                .collect::<Vec<_>>(),
            expected
                .map(|name| (name, Some(FallbackReason::MissingEquipment), true))
                .into_iter()
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_resolve_missing_equipment_without_owned_siblings() {
        let user = data::user();
        let catalog = Catalog::new(
            vec![Exercise {
                id: ROW,
                name: "Row".to_string(),
                ..Exercise::default()
            }],
            vec![
                row(91, "Inverted Row", (0, Some(30)), Equipment::BARBELL),
                row(92, "Ring Row", (30, Some(70)), Equipment::GYMNASTIC_RINGS),
            ],
        )
        .unwrap();
        let history = History::new(
            [UserExercise::new(user.id, ROW, data::progression(50))],
            [],
        );
        let settings = Settings::default();
        let context = Context::new(Some(&user), &history, &settings, TODAY);
        let candidates = catalog.candidates(&context, Section::FUNCTIONAL);
        let siblings = siblings(&candidates, Section::FUNCTIONAL);

        assert!(resolve(&candidates, &siblings, &ProgressionOptions::default()).is_empty());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let fixture = Fixture::new(50, &[PUSH_UP_STANDARD]);

        assert_eq!(
            fixture.resolve(&ProgressionOptions::default()),
            fixture.resolve(&ProgressionOptions::default())
        );
    }

    #[test]
    fn test_fallback_reason_display() {
        assert_eq!(FallbackReason::Ignored.to_string(), "Ignored");
        assert_eq!(
            FallbackReason::MissingEquipment.to_string(),
            "Missing Equipment"
        );
    }
}
