//! Action type representing one recordable pointer or scroll behavior

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::CatalogError;

/// The kind of an action, independent of its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Pointer click at a screen position
    Click,
    /// Scroll wheel movement
    Scroll,
}

impl ActionKind {
    /// Get the kind as the lowercase string used in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Scroll => "scroll",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of an action, tagged by kind
///
/// Serializes to the persisted form: `{"type": "click", "pos": [x, y]}` or
/// `{"type": "scroll", "amount": n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActionParams {
    /// Click at absolute screen coordinates
    Click { pos: (i32, i32) },
    /// Scroll by a signed amount; the sign gives the direction
    Scroll { amount: i32 },
}

impl ActionParams {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionParams::Click { .. } => ActionKind::Click,
            ActionParams::Scroll { .. } => ActionKind::Scroll,
        }
    }
}

/// A recorded action (e.g., "like" as a click, "swipe_up" as a scroll)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Unique action name
    pub name: String,

    /// Kind-specific parameters
    #[serde(flatten)]
    pub params: ActionParams,
}

impl Action {
    /// Create a click action at the given coordinates
    pub fn click(name: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            name: name.into(),
            params: ActionParams::Click { pos: (x, y) },
        }
    }

    /// Create a scroll action with the given signed amount
    pub fn scroll(name: impl Into<String>, amount: i32) -> Self {
        Self {
            name: name.into(),
            params: ActionParams::Scroll { amount },
        }
    }

    /// Get the kind of this action
    pub fn kind(&self) -> ActionKind {
        self.params.kind()
    }

    /// Human-readable name, e.g. "swipe_up" -> "Swipe Up"
    pub fn display_name(&self) -> String {
        display_name(&self.name)
    }

    /// Check the parameters are usable for execution
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::InvalidAction {
                name: self.name.clone(),
                reason: "action name cannot be empty".to_string(),
            });
        }
        if let ActionParams::Scroll { amount: 0 } = self.params {
            return Err(CatalogError::InvalidAction {
                name: self.name.clone(),
                reason: "scroll amount must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.params {
            ActionParams::Click { pos: (x, y) } => write!(f, "{} (click at {}, {})", self.name, x, y),
            ActionParams::Scroll { amount } => write!(f, "{} (scroll {})", self.name, amount),
        }
    }
}

/// Convert a snake_case action name to title case words
pub fn display_name(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
