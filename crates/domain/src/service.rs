use chrono::{Local, NaiveDate};
use log::{debug, error};
use rand::Rng;

use crate::{
    CatalogRepository, Context, ExerciseID, History, ReadError, Section, Selection,
    SelectionError, SelectionOptions, SettingsRepository, TrackingRepository, TrackingUpdates,
    UpdateError, User, UserExercise, UserVariation, VariationID, select,
};

pub trait Clock {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

pub struct Service<R, C = SystemClock> {
    repository: R,
    clock: C,
}

impl<R> Service<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            clock: SystemClock,
        }
    }
}

impl<R, C> Service<R, C> {
    pub fn with_clock(repository: R, clock: C) -> Self {
        Self { repository, clock }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }
}

macro_rules! log_on_error {
    ($func: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $func.await;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                $error::Storage(crate::StorageError::NoConnection) => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
            },
        }
        result
    }};
}

impl<R, C> Service<R, C>
where
    R: CatalogRepository + TrackingRepository + SettingsRepository,
    C: Clock,
{
    /// Selects exercise variations and records them as seen by the user.
    pub async fn select(
        &self,
        user: Option<&User>,
        options: &SelectionOptions,
        rng: &mut impl Rng,
    ) -> Result<Vec<Selection>, SelectionError> {
        let settings = log_on_error!(
            self.repository.read_settings(),
            ReadError,
            "read",
            "settings"
        )?;
        let catalog = log_on_error!(
            self.repository.read_catalog(),
            ReadError,
            "read",
            "catalog"
        )?;
        let history = self.history(user).await?;
        let today = self.clock.today();

        let selections = select(
            &catalog,
            Context::new(user, &history, &settings, today),
            options,
            rng,
        );

        if let Some(user) = user {
            let updates = TrackingUpdates::new(user, options.section, &selections, today);
            debug!(
                "updating {} exercises and {} variations",
                updates.user_exercises.len(),
                updates.user_variations.len()
            );
            for user_exercise in updates.user_exercises {
                log_on_error!(
                    self.repository.upsert_user_exercise(user_exercise),
                    UpdateError,
                    "update",
                    "user exercise"
                )?;
            }
            for user_variation in updates.user_variations {
                log_on_error!(
                    self.repository.upsert_user_variation(user_variation),
                    UpdateError,
                    "update",
                    "user variation"
                )?;
            }
        }

        Ok(selections)
    }

    pub async fn set_progression(
        &self,
        user: &User,
        exercise_id: ExerciseID,
        value: u8,
    ) -> Result<UserExercise, UpdateError> {
        let mut user_exercise = self.user_exercise(user, exercise_id).await?;
        user_exercise.set_progression(value);
        log_on_error!(
            self.repository.upsert_user_exercise(user_exercise),
            UpdateError,
            "update",
            "user exercise"
        )
    }

    pub async fn ignore_exercise(
        &self,
        user: &User,
        exercise_id: ExerciseID,
        ignore: bool,
    ) -> Result<UserExercise, UpdateError> {
        let mut user_exercise = self.user_exercise(user, exercise_id).await?;
        user_exercise.ignore(ignore);
        log_on_error!(
            self.repository.upsert_user_exercise(user_exercise),
            UpdateError,
            "update",
            "user exercise"
        )
    }

    pub async fn ignore_variation(
        &self,
        user: &User,
        variation_id: VariationID,
        section: Section,
        ignore: bool,
    ) -> Result<UserVariation, UpdateError> {
        let history = self.history(Some(user)).await?;
        let mut user_variation = history
            .user_variation(variation_id, section)
            .cloned()
            .unwrap_or_else(|| UserVariation::new(user.id, variation_id, section));
        user_variation.ignore(ignore);
        log_on_error!(
            self.repository.upsert_user_variation(user_variation),
            UpdateError,
            "update",
            "user variation"
        )
    }

    async fn history(&self, user: Option<&User>) -> Result<History, ReadError> {
        match user {
            Some(user) => {
                log_on_error!(
                    self.repository.read_history(user.id),
                    ReadError,
                    "read",
                    "history"
                )
            }
            None => Ok(History::default()),
        }
    }

    async fn user_exercise(
        &self,
        user: &User,
        exercise_id: ExerciseID,
    ) -> Result<UserExercise, ReadError> {
        let history = self.history(Some(user)).await?;
        if let Some(user_exercise) = history.user_exercise(exercise_id) {
            return Ok(user_exercise.clone());
        }
        let settings = log_on_error!(
            self.repository.read_settings(),
            ReadError,
            "read",
            "settings"
        )?;
        Ok(UserExercise::new(
            user.id,
            exercise_id,
            user.default_progression(Section::WORKOUT, &settings),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        Catalog, Progression, Settings, StorageError, UserID,
        tests::data::{self, PUSH_UP, PUSH_UP_STANDARD, TODAY},
    };

    struct FixedClock;

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            TODAY
        }
    }

    #[derive(Default)]
    struct FakeRepository {
        user_exercises: RefCell<Vec<UserExercise>>,
        user_variations: RefCell<Vec<UserVariation>>,
        offline: bool,
    }

    impl CatalogRepository for FakeRepository {
        async fn read_catalog(&self) -> Result<Catalog, ReadError> {
            if self.offline {
                return Err(StorageError::NoConnection.into());
            }
            Ok(data::catalog())
        }
    }

    impl SettingsRepository for FakeRepository {
        async fn read_settings(&self) -> Result<Settings, ReadError> {
            Ok(Settings::default())
        }
    }

    impl TrackingRepository for FakeRepository {
        async fn read_history(&self, _: UserID) -> Result<History, ReadError> {
            Ok(History::new(
                self.user_exercises.borrow().clone(),
                self.user_variations.borrow().clone(),
            ))
        }

        async fn upsert_user_exercise(
            &self,
            user_exercise: UserExercise,
        ) -> Result<UserExercise, UpdateError> {
            let mut user_exercises = self.user_exercises.borrow_mut();
            user_exercises.retain(|e| e.exercise_id != user_exercise.exercise_id);
            user_exercises.push(user_exercise.clone());
            Ok(user_exercise)
        }

        async fn upsert_user_variation(
            &self,
            user_variation: UserVariation,
        ) -> Result<UserVariation, UpdateError> {
            let mut user_variations = self.user_variations.borrow_mut();
            user_variations.retain(|v| {
                (v.variation_id, v.section) != (user_variation.variation_id, user_variation.section)
            });
            user_variations.push(user_variation.clone());
            Ok(user_variation)
        }
    }

    fn service(repository: FakeRepository) -> Service<FakeRepository, FixedClock> {
        Service::with_clock(repository, FixedClock)
    }

    #[tokio::test]
    async fn test_select_records_seen_variations() {
        let service = service(FakeRepository::default());
        let user = data::user();
        let options = SelectionOptions::new(Section::FUNCTIONAL);

        let selections = service
            .select(Some(&user), &options, &mut StdRng::seed_from_u64(1))
            .await
            .unwrap();

        let user_exercises = service.repository.user_exercises.borrow();
        let user_variations = service.repository.user_variations.borrow();
        assert!(!selections.is_empty());
        assert_eq!(user_exercises.len(), selections.len());
        assert_eq!(user_variations.len(), selections.len());
        assert!(
            user_exercises
                .iter()
                .all(|e| e.last_seen == Some(TODAY) && e.last_visible == Some(TODAY))
        );
        assert!(
            user_variations
                .iter()
                .all(|v| v.last_seen == Some(TODAY) && v.section == Section::FUNCTIONAL)
        );
    }

    #[tokio::test]
    async fn test_select_without_user_records_nothing() {
        let service = service(FakeRepository::default());
        let options = SelectionOptions::new(Section::FUNCTIONAL);

        let selections = service
            .select(None, &options, &mut StdRng::seed_from_u64(1))
            .await
            .unwrap();

        assert!(!selections.is_empty());
        assert!(service.repository.user_exercises.borrow().is_empty());
        assert!(service.repository.user_variations.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_select_keeps_pending_refresh() {
        let user = data::user();
        let pending = UserVariation {
            last_seen: Some(TODAY),
            refresh_after: Some(TODAY + chrono::Days::new(7)),
            lag_refresh_weeks: 1,
            ..UserVariation::new(user.id, PUSH_UP_STANDARD, Section::FUNCTIONAL)
        };
        let service = service(FakeRepository {
            user_exercises: RefCell::new(vec![UserExercise::new(
                user.id,
                PUSH_UP,
                data::progression(50),
            )]),
            user_variations: RefCell::new(vec![pending.clone()]),
            ..FakeRepository::default()
        });
        let mut options = SelectionOptions::new(Section::FUNCTIONAL);
        options.exercise_ids = Some([PUSH_UP].into());

        let selections = service
            .select(Some(&user), &options, &mut StdRng::seed_from_u64(1))
            .await
            .unwrap();

        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0].variation.id, PUSH_UP_STANDARD);
        assert_eq!(*service.repository.user_variations.borrow(), vec![pending]);
    }

    #[tokio::test]
    async fn test_select_propagates_storage_error() {
        let service = service(FakeRepository {
            offline: true,
            ..FakeRepository::default()
        });

        assert!(matches!(
            service
                .select(
                    None,
                    &SelectionOptions::new(Section::FUNCTIONAL),
                    &mut StdRng::seed_from_u64(1)
                )
                .await,
            Err(SelectionError::Read(ReadError::Storage(
                StorageError::NoConnection
            )))
        ));
    }

    #[tokio::test]
    async fn test_set_progression() {
        let service = service(FakeRepository::default());
        let user = data::user();

        let user_exercise = service.set_progression(&user, PUSH_UP, 62).await.unwrap();

        assert_eq!(user_exercise.progression, Progression::tracked(60));
        assert_eq!(*service.repository.user_exercises.borrow(), vec![user_exercise]);
    }

    #[tokio::test]
    async fn test_ignore_exercise() {
        let service = service(FakeRepository::default());
        let user = data::user();

        let user_exercise = service.ignore_exercise(&user, PUSH_UP, true).await.unwrap();

        assert!(user_exercise.ignore);
        assert_eq!(user_exercise.progression, data::progression(50));
    }

    #[tokio::test]
    async fn test_ignore_variation() {
        let service = service(FakeRepository::default());
        let user = data::user();

        service
            .ignore_variation(&user, PUSH_UP_STANDARD, Section::FUNCTIONAL, true)
            .await
            .unwrap();
        let user_variation = service
            .ignore_variation(&user, PUSH_UP_STANDARD, Section::FUNCTIONAL, false)
            .await
            .unwrap();

        assert!(!user_variation.ignore);
        assert_eq!(service.repository.user_variations.borrow().len(), 1);
    }
}
