use crate::chess::Position;
use async_trait::async_trait;
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};

#[cfg(test)]
use proptest::prelude::*;

/// The outcome of scoring a [`Position`].
#[derive(Debug, Display, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Evaluation {
    /// A score in centipawns, positive values favor white.
    #[display(fmt = "{_0:+}cp")]
    Score(i32),

    /// A forced mate was found, the position has no material value.
    #[display(fmt = "mate")]
    ForcedMate,

    /// The oracle failed to answer in time.
    #[display(fmt = "timeout")]
    Timeout,

    /// The oracle failed to answer.
    #[display(fmt = "error: {_0}")]
    Error(String),
}

impl Evaluation {
    /// The score in centipawns, if any.
    pub fn score(&self) -> Option<i32> {
        match self {
            Evaluation::Score(s) => Some(*s),
            _ => None,
        }
    }
}

/// Trait for types that score chess positions.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Oracle: Send {
    /// Scores a [`Position`].
    ///
    /// Never fails, failures are classified as [`Evaluation::Timeout`] or [`Evaluation::Error`].
    async fn evaluate(&mut self, pos: &Position) -> Evaluation;
}

#[async_trait]
impl<O: Oracle + ?Sized> Oracle for Box<O> {
    async fn evaluate(&mut self, pos: &Position) -> Evaluation {
        (**self).evaluate(pos).await
    }
}

/// How much an [`Oracle`] may spend on a single [`Position`].
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display(fmt = "{}", "ron::ser::to_string(self).unwrap()")]
#[serde(deny_unknown_fields)]
pub struct Budget {
    /// The search depth in plies.
    #[serde(default = "Budget::default_depth")]
    pub depth: u8,

    /// The wall-clock ceiling for one evaluation.
    #[cfg_attr(test, strategy((0u64..=3600).prop_map(Duration::from_secs)))]
    #[serde(default = "Budget::default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Budget {
    fn default_depth() -> u8 {
        20
    }

    fn default_timeout() -> Duration {
        Duration::from_secs(300)
    }
}

impl Default for Budget {
    fn default() -> Self {
        Budget {
            depth: Budget::default_depth(),
            timeout: Budget::default_timeout(),
        }
    }
}

/// The reason why parsing [`Budget`] failed.
#[derive(Debug, Display, Eq, PartialEq, Error, From)]
#[display(fmt = "failed to parse evaluation budget")]
pub struct ParseBudgetError(ron::de::SpannedError);

impl FromStr for Budget {
    type Err = ParseBudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ron::de::from_str(s)?)
    }
}
