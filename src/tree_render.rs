//! ASCII tree rendering for the milestone registry.

use crate::error::Result;
use crate::models::{CardNumber, Milestone};
use crate::synth::{self, Numbering};

const IN_RANGE: char = '●';
const OUT_OF_RANGE: char = '✗';

/// Symbol for a card depending on whether it lands inside its milestone's range.
fn range_symbol(milestone: &Milestone, number: CardNumber) -> char {
    if milestone.card_range.contains(number.value()) {
        IN_RANGE
    } else {
        OUT_OF_RANGE
    }
}

/// Render the registry with the card numbers `numbering` would assign.
///
/// Example output with range-start numbering:
/// ```text
/// Core KV Operations [6-12] MILESTONE_2_CORE_KV_OPS
/// ├── ● CARD_006 Implement core KV commands (set, get, del, keys, scan)
/// ├── ● CARD_007 Develop namespace management
/// ...
/// ├── ✗ CARD_013 Add comprehensive error handling
/// └── ✗ CARD_014 Develop integration test coverage
/// ```
pub fn render_registry(registry: &[Milestone], numbering: Numbering) -> Result<String> {
    let mut output = String::new();
    let groups = synth::assign_numbers(registry, numbering)?;
    for (milestone, numbers) in registry.iter().zip(groups) {
        render_milestone(&mut output, milestone, &numbers);
    }
    Ok(output)
}

fn render_milestone(output: &mut String, milestone: &Milestone, numbers: &[CardNumber]) {
    output.push_str(&format!(
        "{} [{}] {}\n",
        milestone.name, milestone.card_range, milestone.identifier
    ));

    for (i, (task, number)) in milestone.tasks.iter().zip(numbers).enumerate() {
        let is_last = i == milestone.tasks.len() - 1;
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(branch);
        output.push(range_symbol(milestone, *number));
        output.push(' ');
        output.push_str(&number.tag());
        output.push(' ');
        output.push_str(task);
        output.push('\n');
    }
}
