use serde::{Deserialize, Serialize};

/// A named group of roadmap tasks.
///
/// Task order determines card numbering. The declared `card_range` is informational:
/// nothing forces the synthesized card numbers to land inside it (see
/// [`crate::catalog::audit`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Human-readable name, unique across the registry. Also drives card filenames.
    pub name: String,
    /// Archive and credential identifier, e.g. `MILESTONE_2_CORE_KV_OPS`.
    pub identifier: String,
    pub card_range: CardRange,
    /// Comma-separated selection pattern used by the packager.
    pub selection: String,
    pub tasks: Vec<String>,
}

/// Inclusive range of card numbers a milestone claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRange {
    pub start: u32,
    pub end: u32,
}

impl CardRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, number: u32) -> bool {
        (self.start..=self.end).contains(&number)
    }

    /// Number of card slots in the range. Zero for an inverted range.
    pub fn width(&self) -> u64 {
        if self.end < self.start {
            0
        } else {
            u64::from(self.end) - u64::from(self.start) + 1
        }
    }
}

impl std::fmt::Display for CardRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
