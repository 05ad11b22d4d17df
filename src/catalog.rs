//! The milestone registry.
//!
//! Synthesis, packaging and the credential vault all read the same
//! `[Milestone]` slice, so the card catalog and the packaging list cannot drift.

use std::path::Path;

use crate::error::{DamError, Result};
use crate::models::{CardRange, Milestone};
use crate::synth::{self, Numbering};

fn milestone(
    name: &str,
    identifier: &str,
    range: (u32, u32),
    selection: &str,
    tasks: &[&str],
) -> Milestone {
    Milestone {
        name: name.to_string(),
        identifier: identifier.to_string(),
        card_range: CardRange::new(range.0, range.1),
        selection: selection.to_string(),
        tasks: tasks.iter().map(|t| t.to_string()).collect(),
    }
}

/// The built-in roadmap.
pub fn builtin() -> Vec<Milestone> {
    vec![
        milestone(
            "TDD Foundation",
            "MILESTONE_1_TDD_FOUNDATION",
            (1, 8),
            "CARD_00[1-8].yml",
            &[
                "Fix config_tests.rs complex type violations",
                "Convert Config struct tests to string functions",
                "Convert ConfigError tests to string outputs",
                "Test `do_*` functions, not internal structs",
                "Fix integration.rs RSB pattern violations",
                "Replace std::env with RSB patterns",
                "Replace std::fs with RSB operations",
                "Replace std::process with shell ops",
                "Establish RED-GREEN cycle discipline",
                "Document TDD workflow",
                "Create TDD templates",
                "Update test runner configuration",
                "Pass all existing tests with TDD patterns",
            ],
        ),
        milestone(
            "Core KV Operations",
            "MILESTONE_2_CORE_KV_OPS",
            (6, 12),
            "CARD_00[6-9].yml,CARD_01[0-2].yml",
            &[
                "Implement core KV commands (set, get, del, keys, scan)",
                "Develop namespace management",
                "Create basic auth system",
                "Implement stream processing with meta-directives",
                "Define exit code standards",
                "Ensure TDD for each new function",
                "Implement RSB string-first patterns",
                "Add comprehensive error handling",
                "Develop integration test coverage",
            ],
        ),
        milestone(
            "TTL & Cache System",
            "MILESTONE_3_TTL_CACHE",
            (13, 20),
            "CARD_01[3-9].yml",
            &[
                "Create TTL namespace creation functionality",
                "Implement lazy expiry on read/write operations",
                "Add `--include-expired` flag",
                "Develop cache configuration management",
                "Design eviction policies",
                "Validate near-SQLite performance benchmarks",
                "Verify memory efficiency",
                "Implement concurrent access testing",
            ],
        ),
        milestone(
            "Security & Auth",
            "MILESTONE_4_SECURITY",
            (21, 28),
            "CARD_02[1-8].yml",
            &[
                "Enforce stream auth preamble",
                "Create user management system",
                "Implement session tokens",
                "Generate and validate API keys",
                "Design configurable security policies",
                "Delegate encryption to system tools",
                "Prevent auth bypass",
                "Implement input validation security",
                "Protect against stream injection",
            ],
        ),
        milestone(
            "Data Management",
            "MILESTONE_5_DATA_MGMT",
            (29, 35),
            "CARD_02[9-35].yml",
            &[
                "Create backup system with optional encryption",
                "Implement TSV import/export",
                "Validate database integrity",
                "Develop migration utilities",
                "Add data compression options",
                "Verify backup restoration",
                "Test large dataset import/export",
                "Create corruption recovery procedures",
            ],
        ),
        milestone(
            "Filesystem Mirror",
            "MILESTONE_6_FILESYSTEM_MIRROR",
            (36, 42),
            "CARD_03[6-42].yml",
            &[
                "Implement `export-fs` directory mapping",
                "Create `import-fs` synchronization",
                "Handle context suffix mapping",
                "Manage file formats (JSON default)",
                "Develop incremental sync capabilities",
                "Ensure `grep`/`rg` compatibility",
                "Integrate file system watch",
                "Design conflict resolution policies",
            ],
        ),
    ]
}

/// Load a registry from a YAML file (a sequence of milestones).
pub fn load(path: &Path) -> Result<Vec<Milestone>> {
    let content = std::fs::read_to_string(path).map_err(|e| DamError::io(path, e))?;
    serde_yaml::from_str(&content).map_err(|e| DamError::yaml(path, e))
}

/// Look a milestone up by display name or identifier.
pub fn find<'a>(registry: &'a [Milestone], key: &str) -> Option<&'a Milestone> {
    registry
        .iter()
        .find(|m| m.name == key || m.identifier == key)
}

/// A disagreement between a milestone's declared range and its tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeMismatch {
    /// The task list is longer or shorter than the range is wide.
    TaskCount {
        milestone: String,
        range: CardRange,
        tasks: usize,
    },
    /// Numbering places cards outside the declared range.
    OutOfRange {
        milestone: String,
        range: CardRange,
        first: u32,
        last: u32,
    },
}

impl std::fmt::Display for RangeMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskCount {
                milestone,
                range,
                tasks,
            } => write!(
                f,
                "{}: range {} has {} slots but {} tasks",
                milestone,
                range,
                range.width(),
                tasks
            ),
            Self::OutOfRange {
                milestone,
                range,
                first,
                last,
            } => write!(
                f,
                "{}: cards {}-{} fall outside declared range {}",
                milestone, first, last, range
            ),
        }
    }
}

/// Report every range inconsistency in the registry.
///
/// Mismatches are reported, not raised. The only error is a registry whose
/// numbering does not fit a card number.
pub fn audit(registry: &[Milestone], numbering: Numbering) -> Result<Vec<RangeMismatch>> {
    let mut mismatches = Vec::new();
    let groups = synth::assign_numbers(registry, numbering)?;

    for (milestone, numbers) in registry.iter().zip(groups) {
        if milestone.tasks.len() as u64 != milestone.card_range.width() {
            mismatches.push(RangeMismatch::TaskCount {
                milestone: milestone.name.clone(),
                range: milestone.card_range,
                tasks: milestone.tasks.len(),
            });
        }

        if let (Some(first), Some(last)) = (numbers.first(), numbers.last()) {
            if numbers.iter().any(|n| !milestone.card_range.contains(n.value())) {
                mismatches.push(RangeMismatch::OutOfRange {
                    milestone: milestone.name.clone(),
                    range: milestone.card_range,
                    first: first.value(),
                    last: last.value(),
                });
            }
        }
    }

    for mismatch in &mismatches {
        tracing::warn!("{}", mismatch);
    }

    Ok(mismatches)
}
