//! Load-time options.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What to do when the source lists the same document id twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Abort the load with `IndexError::DuplicateId`.
    #[default]
    Reject,
    /// Keep the last occurrence and log a warning.
    LastWins,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "last_wins" | "last-wins" => Ok(Self::LastWins),
            other => Err(format!(
                "unknown duplicate policy {:?} (expected \"reject\" or \"last_wins\")",
                other
            )),
        }
    }
}

/// Options controlling how a catalog is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Duplicate id handling.
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

impl LoadOptions {
    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }
}
