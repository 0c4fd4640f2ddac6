use derive_more::Deref;
use uuid::Uuid;

use crate::{Equipment, Progression, Section, Settings};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserID,
    pub equipment: Equipment,
    pub is_new_to_fitness: bool,
}

impl User {
    /// Progression assumed for exercises the user has never been exposed to.
    #[must_use]
    pub fn default_progression(&self, section: Section, settings: &Settings) -> Progression {
        if self.is_new_to_fitness || section.contains(Section::REHAB) {
            settings.new_to_fitness_progression
        } else {
            settings.seasoned_progression
        }
    }
}

#[derive(Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UserID(Uuid);

impl UserID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for UserID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for UserID {
    fn from(value: u128) -> Self {
        Self::from_u128(value)
    }
}
