//! Sequence of action references produced by the generator

use serde::{Deserialize, Serialize};

use crate::action::{display_name, Action, ActionKind};
use crate::catalog::ActionCatalog;

/// Number of steps in a generated sequence unless the caller asks otherwise
pub const DEFAULT_SEQUENCE_LENGTH: usize = 100;

/// One step of a sequence: a reference to a catalog action
///
/// Steps store the name and kind only, so a sequence stays valid when an
/// action's coordinates are re-recorded; parameters are resolved against the
/// catalog when a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceStep {
    /// Kind at generation time
    #[serde(rename = "type")]
    pub kind: ActionKind,

    /// Catalog name of the action
    pub name: String,
}

impl SequenceStep {
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Build a step referring to an existing action
    pub fn for_action(action: &Action) -> Self {
        Self::new(action.name.clone(), action.kind())
    }

    /// Resolve the step to the current action parameters
    pub fn resolve<'a>(&self, catalog: &'a ActionCatalog) -> Option<&'a Action> {
        catalog.get(&self.name)
    }

    pub fn display_name(&self) -> String {
        display_name(&self.name)
    }
}

/// Ordered list of steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence {
    steps: Vec<SequenceStep>,
}

impl Sequence {
    pub fn new(steps: Vec<SequenceStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[SequenceStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequenceStep> {
        self.steps.iter()
    }

    /// Count how many steps name `action`
    pub fn count_of(&self, action: &str) -> usize {
        self.steps.iter().filter(|s| s.name == action).count()
    }

    /// Resolve every step against `catalog`
    ///
    /// Returns the name of the first step that has no recorded action.
    pub fn resolve(&self, catalog: &ActionCatalog) -> Result<Vec<Action>, String> {
        self.steps
            .iter()
            .map(|step| step.resolve(catalog).cloned().ok_or_else(|| step.name.clone()))
            .collect()
    }
}

impl From<Vec<SequenceStep>> for Sequence {
    fn from(steps: Vec<SequenceStep>) -> Self {
        Self::new(steps)
    }
}

impl FromIterator<SequenceStep> for Sequence {
    fn from_iter<I: IntoIterator<Item = SequenceStep>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Sequence {
    type Item = SequenceStep;
    type IntoIter = std::vec::IntoIter<SequenceStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a SequenceStep;
    type IntoIter = std::slice::Iter<'a, SequenceStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sequence_serializes_as_list() {
        let seq = Sequence::new(vec![
            SequenceStep::new("swipe_up", ActionKind::Scroll),
            SequenceStep::new("like", ActionKind::Click),
        ]);
        let value = serde_json::to_value(&seq).unwrap();
        assert_eq!(
            value,
            json!([
                {"type": "scroll", "name": "swipe_up"},
                {"type": "click", "name": "like"}
            ])
        );
        let back: Sequence = serde_json::from_value(value).unwrap();
        assert_eq!(back.count_of("like"), 1);
    }

    #[test]
    fn test_resolve_uses_current_parameters() {
        let mut catalog = ActionCatalog::new();
        catalog.record_click("like", 1, 1).unwrap();
        let seq: Sequence = vec![SequenceStep::new("like", ActionKind::Click)].into();

        catalog.record_click("like", 50, 60).unwrap();
        let actions = seq.resolve(&catalog).unwrap();
        assert_eq!(actions[0], Action::click("like", 50, 60));
    }

    #[test]
    fn test_resolve_reports_missing_step() {
        let mut catalog = ActionCatalog::new();
        catalog.declare("follow");
        let seq: Sequence = vec![SequenceStep::new("follow", ActionKind::Click)].into();
        assert_eq!(seq.resolve(&catalog), Err("follow".to_string()));
    }
}
