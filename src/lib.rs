//! Work card synthesis and milestone packaging.
//!
//! A milestone registry is expanded into numbered work cards (YAML files), the
//! cards are bundled into one zip archive per milestone, and a credential per
//! milestone is recorded in an owner-only vault file.

pub mod catalog;
pub mod config;
pub mod error;
pub mod matcher;
pub mod models;
pub mod packager;
pub mod pipeline;
pub mod store;
pub mod synth;
pub mod tree_render;
pub mod vault;

pub use error::{DamError, Result};
