//! Typed configuration document

use fc_core::{
    Action, ActionCatalog, ActionKind, ActionParams, CatalogError, RunSettings, Sequence,
    DEFAULT_SEQUENCE_LENGTH, RECORDABLE_CLICKS,
};
use fc_sequence::{GenerationPolicy, SequenceGenerator, Weights, DEFAULT_MIN_ACTIONS};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// One entry of the `actions` map as it appears on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEntry {
    /// "click" or "scroll"
    #[serde(rename = "type")]
    pub kind: ActionKind,

    /// Screen coordinates of a click
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<(i32, i32)>,

    /// Signed scroll amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i32>,
}

impl ActionEntry {
    /// Turn the entry into a validated action named `name`
    pub fn to_action(&self, name: &str) -> ConfigResult<Action> {
        let params = match self.kind {
            ActionKind::Click => {
                let pos = self.pos.ok_or_else(|| ConfigError::InvalidAction {
                    name: name.to_string(),
                    reason: "click action has no position".to_string(),
                })?;
                ActionParams::Click { pos }
            }
            ActionKind::Scroll => {
                let amount = self.amount.ok_or_else(|| ConfigError::InvalidAction {
                    name: name.to_string(),
                    reason: "scroll action has no amount".to_string(),
                })?;
                ActionParams::Scroll { amount }
            }
        };

        let action = Action {
            name: name.to_string(),
            params,
        };
        action.validate().map_err(catalog_error)?;
        Ok(action)
    }
}

impl From<&Action> for ActionEntry {
    fn from(action: &Action) -> Self {
        match action.params {
            ActionParams::Click { pos } => Self {
                kind: ActionKind::Click,
                pos: Some(pos),
                amount: None,
            },
            ActionParams::Scroll { amount } => Self {
                kind: ActionKind::Scroll,
                pos: None,
                amount: Some(amount),
            },
        }
    }
}

/// Parameters for sequence generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Number of steps per generated sequence
    #[serde(default = "default_length")]
    pub length: usize,

    /// Recorded actions required before generating
    #[serde(default = "default_min_actions")]
    pub min_actions: usize,

    /// Relative weight per action (unlisted: 1)
    #[serde(default = "Weights::reference")]
    pub weights: Weights,

    /// Sampling policy
    #[serde(default)]
    pub policy: GenerationPolicy,
}

fn default_length() -> usize {
    DEFAULT_SEQUENCE_LENGTH
}

fn default_min_actions() -> usize {
    DEFAULT_MIN_ACTIONS
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            length: default_length(),
            min_actions: default_min_actions(),
            weights: Weights::reference(),
            policy: GenerationPolicy::default(),
        }
    }
}

impl GenerationConfig {
    /// Build a generator from these settings
    pub fn generator(&self) -> SequenceGenerator {
        SequenceGenerator::new()
            .with_policy(self.policy.clone())
            .with_min_actions(self.min_actions)
    }
}

/// The whole configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Recorded actions by name; `null` means not recorded yet
    #[serde(default)]
    pub actions: IndexMap<String, Option<ActionEntry>>,

    /// Last generated sequence
    #[serde(default)]
    pub sequence: Sequence,

    /// Replay settings
    #[serde(default)]
    pub settings: RunSettings,

    /// Generation parameters
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut actions = IndexMap::new();
        for name in RECORDABLE_CLICKS {
            actions.insert(name.to_string(), None);
        }
        actions.insert(
            "swipe_up".to_string(),
            Some(ActionEntry::from(&Action::scroll("swipe_up", -200000))),
        );
        actions.insert(
            "swipe_down".to_string(),
            Some(ActionEntry::from(&Action::scroll("swipe_down", 200000))),
        );

        Self {
            actions,
            sequence: Sequence::default(),
            settings: RunSettings::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Validate the `actions` map into a catalog
    pub fn catalog(&self) -> ConfigResult<ActionCatalog> {
        let mut catalog = ActionCatalog::new();
        for (name, entry) in &self.actions {
            match entry {
                Some(entry) => {
                    let action = entry.to_action(name)?;
                    catalog.set(name, action).map_err(catalog_error)?;
                }
                None => catalog.declare(name.clone()),
            }
        }
        Ok(catalog)
    }

    /// Replace the `actions` map with the contents of `catalog`
    pub fn set_catalog(&mut self, catalog: &ActionCatalog) {
        self.actions = catalog
            .iter()
            .map(|(name, action)| (name.to_string(), action.map(ActionEntry::from)))
            .collect();
    }

    /// The stored sequence
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Replace the stored sequence
    pub fn set_sequence(&mut self, sequence: Sequence) {
        self.sequence = sequence;
    }
}

fn catalog_error(err: CatalogError) -> ConfigError {
    match err {
        CatalogError::InvalidAction { name, reason } => ConfigError::InvalidAction { name, reason },
    }
}
