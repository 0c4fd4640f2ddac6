use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use log::debug;
use regimen_domain as domain;

use crate::snapshot::{self, Snapshot, SnapshotError};

type UserExercises = BTreeMap<(domain::UserID, domain::ExerciseID), domain::UserExercise>;
type UserVariations =
    BTreeMap<(domain::UserID, domain::VariationID, domain::Section), domain::UserVariation>;

/// Keeps the catalog, the settings and the tracking records of all known users in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    catalog: domain::Catalog,
    settings: domain::Settings,
    users: BTreeMap<domain::UserID, domain::User>,
    user_exercises: RwLock<UserExercises>,
    user_variations: RwLock<UserVariations>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new(
        catalog: domain::Catalog,
        settings: domain::Settings,
        users: impl IntoIterator<Item = domain::User>,
    ) -> Self {
        Self {
            catalog,
            settings,
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            user_exercises: RwLock::default(),
            user_variations: RwLock::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Self::try_from(Snapshot::from_json(json)?)
    }

    pub fn to_json(&self) -> Result<String, domain::ReadError> {
        self.snapshot()?
            .to_json()
            .map_err(|err| domain::ReadError::Other(Box::new(err)))
    }

    #[must_use]
    pub fn user(&self, id: domain::UserID) -> Option<&domain::User> {
        self.users.get(&id)
    }

    pub fn snapshot(&self) -> Result<Snapshot, domain::StorageError> {
        Ok(Snapshot {
            settings: self.settings,
            users: self.users.values().map(snapshot::User::from).collect(),
            exercises: self
                .catalog
                .exercises()
                .map(snapshot::Exercise::from)
                .collect(),
            variations: self
                .catalog
                .variations()
                .iter()
                .map(snapshot::Variation::from)
                .collect(),
            user_exercises: self
                .user_exercises
                .read()
                .map_err(poisoned)?
                .values()
                .map(snapshot::UserExercise::from)
                .collect(),
            user_variations: self
                .user_variations
                .read()
                .map_err(poisoned)?
                .values()
                .map(snapshot::UserVariation::from)
                .collect(),
        })
    }

    fn check_user(&self, id: domain::UserID) -> Result<(), domain::StorageError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            debug!("unknown user {}", *id);
            Err(domain::StorageError::NoSession)
        }
    }
}

impl TryFrom<Snapshot> for MemoryStorage {
    type Error = SnapshotError;

    fn try_from(value: Snapshot) -> Result<Self, Self::Error> {
        let catalog = value.catalog()?;

        let mut users = BTreeMap::new();
        for user in value.users {
            let user = domain::User::try_from(user)?;
            if users.insert(user.id, user.clone()).is_some() {
                return Err(SnapshotError::DuplicateUser(*user.id));
            }
        }

        let user_exercises = value
            .user_exercises
            .into_iter()
            .map(|e| domain::UserExercise::try_from(e).map(|e| ((e.user_id, e.exercise_id), e)))
            .collect::<Result<UserExercises, _>>()?;
        let user_variations = value
            .user_variations
            .into_iter()
            .map(|v| {
                domain::UserVariation::try_from(v)
                    .map(|v| ((v.user_id, v.variation_id, v.section), v))
            })
            .collect::<Result<UserVariations, _>>()?;

        debug!(
            "loaded {} exercises, {} variations and {} users",
            catalog.exercises().count(),
            catalog.variations().len(),
            users.len()
        );

        Ok(Self {
            catalog,
            settings: value.settings,
            users,
            user_exercises: RwLock::new(user_exercises),
            user_variations: RwLock::new(user_variations),
        })
    }
}

fn poisoned<T>(err: PoisonError<T>) -> domain::StorageError {
    domain::StorageError::Other(err.to_string().into())
}

impl domain::CatalogRepository for MemoryStorage {
    async fn read_catalog(&self) -> Result<domain::Catalog, domain::ReadError> {
        Ok(self.catalog.clone())
    }
}

impl domain::SettingsRepository for MemoryStorage {
    async fn read_settings(&self) -> Result<domain::Settings, domain::ReadError> {
        Ok(self.settings)
    }
}

impl domain::TrackingRepository for MemoryStorage {
    async fn read_history(
        &self,
        user_id: domain::UserID,
    ) -> Result<domain::History, domain::ReadError> {
        self.check_user(user_id)?;
        let user_exercises = self.user_exercises.read().map_err(poisoned)?;
        let user_variations = self.user_variations.read().map_err(poisoned)?;
        Ok(domain::History::new(
            user_exercises
                .values()
                .filter(|e| e.user_id == user_id)
                .cloned(),
            user_variations
                .values()
                .filter(|v| v.user_id == user_id)
                .cloned(),
        ))
    }

    async fn upsert_user_exercise(
        &self,
        user_exercise: domain::UserExercise,
    ) -> Result<domain::UserExercise, domain::UpdateError> {
        self.check_user(user_exercise.user_id)?;
        self.user_exercises.write().map_err(poisoned)?.insert(
            (user_exercise.user_id, user_exercise.exercise_id),
            user_exercise.clone(),
        );
        Ok(user_exercise)
    }

    async fn upsert_user_variation(
        &self,
        user_variation: domain::UserVariation,
    ) -> Result<domain::UserVariation, domain::UpdateError> {
        self.check_user(user_variation.user_id)?;
        self.user_variations.write().map_err(poisoned)?.insert(
            (
                user_variation.user_id,
                user_variation.variation_id,
                user_variation.section,
            ),
            user_variation.clone(),
        );
        Ok(user_variation)
    }
}
