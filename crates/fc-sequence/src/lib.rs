//! Sequence generation
//!
//! Turns the recorded actions of a catalog into a fixed-length, pseudo-random
//! sequence of steps.
//!
//! # Policies
//!
//! - [`GenerationPolicy::WeightedDraw`] (default) - every slot is an
//!   independent draw, proportional to the action's weight. Streaks of the
//!   same action are possible.
//! - [`GenerationPolicy::QuotaPool`] - each action gets a quota proportional to
//!   its weight; the shuffled pool is consumed while an [`AdjacencyRule`]
//!   keeps selected actions from appearing twice in a row, falling back to
//!   filler actions when no other pick is possible.
//!
//! # Key Types
//!
//! - [`SequenceGenerator`] - Generates sequences
//! - [`Weights`] - Per-action weight table
//! - [`AdjacencyRule`] - Consecutive-step constraint for the quota policy

mod error;
mod generator;
mod policy;
mod weights;

pub use error::{GenError, GenResult};
pub use generator::{SequenceGenerator, DEFAULT_MIN_ACTIONS};
pub use policy::{AdjacencyRule, GenerationPolicy};
pub use weights::Weights;
