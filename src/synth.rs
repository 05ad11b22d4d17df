//! Card synthesis.
//!
//! [`synthesize`] is pure and total: any task string and any number produce a card.
//! Numbering is threaded through [`assign_numbers`] as an explicit accumulator
//! rather than read from a counter that lives across calls.

use serde::{Deserialize, Serialize};

use crate::error::{DamError, Result};
use crate::models::{CardNumber, CardStatus, Milestone, TestPhases, WorkCard, VAULT_MARKER};

/// How card numbers are assigned across the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Numbering {
    /// One counter, starting at 1, running across all milestones in registry order.
    #[default]
    Global,
    /// Each milestone counts up from the start of its declared range.
    RangeStart,
}

/// Complexity score: one point per five characters, clamped to 1..=10.
pub fn complexity(feature_name: &str) -> u8 {
    (feature_name.chars().count() / 5).clamp(1, 10) as u8
}

/// Build the card for one task.
pub fn synthesize(milestone: &Milestone, card_number: CardNumber, task: &str) -> WorkCard {
    WorkCard {
        card_number,
        milestone: milestone.name.clone(),
        feature_name: task.to_string(),
        complexity: complexity(task),
        status: CardStatus::Locked,
        tests_required: TestPhases {
            red_phase: format!("Failing test for {}", task),
            green_phase: format!("Minimal implementation to pass {} test", task),
            refactor_phase: format!("Improve code quality for {}", task),
        },
        dependencies: Vec::new(),
        acceptance_criteria: vec![format!("Complete {} with TDD evidence", task)],
        tag: VAULT_MARKER.to_string(),
    }
}

/// Card numbers for every task, grouped per milestone in registry order.
///
/// Fails with [`DamError::NumberOverflow`] when a milestone's numbers would not
/// fit a card number.
pub fn assign_numbers(
    registry: &[Milestone],
    numbering: Numbering,
) -> Result<Vec<Vec<CardNumber>>> {
    let (groups, _) = registry.iter().try_fold(
        (Vec::with_capacity(registry.len()), 1u64),
        |(mut groups, next), m| {
            let first = match numbering {
                Numbering::Global => next,
                Numbering::RangeStart => u64::from(m.card_range.start),
            };
            let count = m.tasks.len();
            let overflow = || DamError::NumberOverflow {
                milestone: m.name.clone(),
                first,
                count,
            };

            let numbers = (0..count as u64)
                .map(|offset| {
                    u32::try_from(first + offset)
                        .map(CardNumber)
                        .map_err(|_| overflow())
                })
                .collect::<Result<Vec<_>>>()?;
            groups.push(numbers);
            Ok::<_, DamError>((groups, next + count as u64))
        },
    )?;
    Ok(groups)
}

/// Synthesize every card in the registry.
pub fn synthesize_all(registry: &[Milestone], numbering: Numbering) -> Result<Vec<WorkCard>> {
    let numbers = assign_numbers(registry, numbering)?;
    Ok(registry
        .iter()
        .zip(numbers)
        .flat_map(|(milestone, numbers)| {
            milestone
                .tasks
                .iter()
                .zip(numbers)
                .map(move |(task, number)| synthesize(milestone, number, task))
        })
        .collect())
}
