//! Core types for feedclicker
//!
//! This crate provides the data model shared by the generator, the execution
//! engine and the config layer: Action, ActionCatalog, Sequence and
//! RunSettings.

mod action;
mod catalog;
mod run;
mod sequence;
mod settings;

pub use action::{display_name, Action, ActionKind, ActionParams};
pub use catalog::{
    ActionCatalog, CatalogError, CatalogResult, CatalogSource, SharedCatalog, RECORDABLE_CLICKS,
};
pub use run::RunId;
pub use sequence::{Sequence, SequenceStep, DEFAULT_SEQUENCE_LENGTH};
pub use settings::RunSettings;
