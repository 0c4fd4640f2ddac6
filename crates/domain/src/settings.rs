use chrono::Days;
use serde::{Deserialize, Serialize};

use crate::Progression;

#[allow(async_fn_in_trait)]
pub trait SettingsRepository {
    async fn read_settings(&self) -> Result<Settings, crate::ReadError>;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    #[serde(with = "progression")]
    pub new_to_fitness_progression: Progression,
    #[serde(with = "progression")]
    pub seasoned_progression: Progression,
    #[serde(with = "progression")]
    pub proficiency_cap: Progression,
    pub prerequisite_visibility_days: u64,
}

impl Settings {
    #[must_use]
    pub fn prerequisite_visibility(&self) -> Days {
        Days::new(self.prerequisite_visibility_days)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            new_to_fitness_progression: Progression::tracked(5),
            seasoned_progression: Progression::tracked(50),
            proficiency_cap: Progression::tracked(75),
            prerequisite_visibility_days: 365,
        }
    }
}

mod progression {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use crate::Progression;

    pub fn serialize<S: Serializer>(value: &Progression, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8((*value).into())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Progression, D::Error> {
        Progression::new(u8::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();

        assert!(settings.new_to_fitness_progression < settings.seasoned_progression);
        assert!(settings.seasoned_progression < settings.proficiency_cap);
        assert_eq!(settings.prerequisite_visibility(), Days::new(365));
    }
}
