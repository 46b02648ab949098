use derive_more::{Display, Error, From};
use lib::eval::Budget;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, str::FromStr};

#[cfg(test)]
use proptest::prelude::*;

/// Extra options passed to a UCI engine, by name.
pub type UciOptions = BTreeMap<String, Option<String>>;

/// The reason why parsing engine configuration failed.
#[derive(Debug, Display, Eq, PartialEq, Error, From)]
#[display(fmt = "failed to parse engine configuration")]
pub struct ParseEngineConfigError(ron::de::SpannedError);

/// Runtime configuration for the UCI engine that scores positions.
#[derive(Debug, Display, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display(fmt = "{}", "ron::ser::to_string(self).unwrap()")]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Path to the engine binary.
    pub path: String,

    /// How much each evaluation may cost.
    #[cfg_attr(
        test,
        strategy((any::<u8>(), 0u64..3600).prop_map(|(depth, secs)| Budget {
            depth,
            timeout: std::time::Duration::from_secs(secs),
        }))
    )]
    #[serde(default)]
    pub budget: Budget,

    /// Whether to spawn a new engine process for every evaluation.
    #[serde(default)]
    pub fresh: bool,

    /// Options set once the engine is spawned.
    #[serde(default)]
    pub options: UciOptions,
}

impl EngineConfig {
    /// Constructs [`EngineConfig`] for the engine at `path` with default settings.
    pub fn new(path: impl Into<String>) -> Self {
        EngineConfig {
            path: path.into(),
            budget: Budget::default(),
            fresh: false,
            options: UciOptions::default(),
        }
    }
}

impl FromStr for EngineConfig {
    type Err = ParseEngineConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ron::de::from_str(s)?)
    }
}
