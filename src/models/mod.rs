//! Records produced and consumed by the dam pipeline.
//!
//! # Core Concepts
//!
//! - [`Milestone`]: A named group of tasks with a declared card range, an archive
//!   identifier and a selection pattern. The registry of milestones is the single
//!   source of truth for both card synthesis and packaging.
//! - [`WorkCard`]: One generated task-tracking record. Created once, written once,
//!   never mutated here.
//! - [`VaultEntry`]: One generated credential per milestone, persisted as a list to
//!   the vault file.

mod card;
mod milestone;
mod vault;

pub use card::*;
pub use milestone::*;
pub use vault::*;
