//! JSON configuration for feedclicker
//!
//! The config file holds the recorded actions, the last generated sequence
//! and the run settings:
//!
//! ```json
//! {
//!   "actions": {
//!     "like": {"type": "click", "pos": [880, 540]},
//!     "follow": null,
//!     "swipe_up": {"type": "scroll", "amount": -200000}
//!   },
//!   "sequence": [{"type": "scroll", "name": "swipe_up"}],
//!   "settings": {"random_order": true, "random_delay": true, "delay_range": [1, 5]}
//! }
//! ```
//!
//! Entries are validated when they are turned into typed values
//! ([`AppConfig::catalog`]), not while parsing, so a half-recorded file still
//! loads and reports which action is broken.
//!
//! # Example
//!
//! ```ignore
//! use fc_config::ConfigStore;
//!
//! let store = ConfigStore::new("clicker_config.json");
//! let config = store.load_or_default()?;
//! let catalog = config.catalog()?;
//! ```

mod error;
mod model;
mod store;

pub use error::{ConfigError, ConfigResult};
pub use model::{ActionEntry, AppConfig, GenerationConfig};
pub use store::{ConfigStore, DEFAULT_CONFIG_FILE};
