//! Generation policies and the adjacency constraint

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{GenError, GenResult};

/// How slots are filled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum GenerationPolicy {
    /// Independent weighted draw per slot
    #[default]
    WeightedDraw,

    /// Weighted quotas, shuffled, repaired to honor the adjacency rule
    QuotaPool(AdjacencyRule),
}

/// Constraint on consecutive steps for [`GenerationPolicy::QuotaPool`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyRule {
    /// Actions that must never directly follow themselves
    #[serde(default)]
    pub no_consecutive: BTreeSet<String>,

    /// Actions inserted, in alternation, when no pool entry fits, and used
    /// to pad a short pool
    #[serde(default)]
    pub fillers: Vec<String>,
}

impl AdjacencyRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// No two likes in a row; scroll up and down as fillers
    pub fn reference() -> Self {
        Self::new()
            .no_consecutive("like")
            .fillers(["swipe_up", "swipe_down"])
    }

    /// Forbid `name` from directly following itself
    pub fn no_consecutive(mut self, name: impl Into<String>) -> Self {
        self.no_consecutive.insert(name.into());
        self
    }

    /// Set the filler actions
    pub fn fillers<I, S>(mut self, fillers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fillers = fillers.into_iter().map(Into::into).collect();
        self
    }

    /// Whether placing `next` right after `prev` breaks the rule
    pub fn violates(&self, prev: Option<&str>, next: &str) -> bool {
        prev == Some(next) && self.no_consecutive.contains(next)
    }

    /// A filler that is itself constrained could break the rule it repairs
    pub fn validate(&self) -> GenResult<()> {
        if let Some(filler) = self.fillers.iter().find(|f| self.no_consecutive.contains(*f)) {
            return Err(GenError::InvalidRule(format!(
                "filler '{}' is also marked no-consecutive",
                filler
            )));
        }
        Ok(())
    }
}
