//! Per-action weight table

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Weight used for actions missing from the table
pub const DEFAULT_WEIGHT: u32 = 1;

/// Relative weights keyed by action name
///
/// Weights are relative: `{a: 80, b: 20}` and `{a: 4, b: 1}` generate the same
/// distribution. Unlisted actions weigh [`DEFAULT_WEIGHT`]; a weight of 0
/// excludes the action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights {
    table: HashMap<String, u32>,
}

impl Weights {
    /// Empty table: every action weighs the same
    pub fn new() -> Self {
        Self::default()
    }

    /// The feed-scrolling mix the tool ships with
    pub fn reference() -> Self {
        [
            ("swipe_down", 10),
            ("swipe_up", 80),
            ("like", 5),
            ("bookmark", 3),
            ("follow", 2),
        ]
        .into_iter()
        .collect()
    }

    /// Builder-style setter
    pub fn with(mut self, name: impl Into<String>, weight: u32) -> Self {
        self.set(name, weight);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, weight: u32) {
        self.table.insert(name.into(), weight);
    }

    /// Weight for `name`, falling back to [`DEFAULT_WEIGHT`]
    pub fn get(&self, name: &str) -> u32 {
        self.table.get(name).copied().unwrap_or(DEFAULT_WEIGHT)
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for Weights {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        Self {
            table: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
