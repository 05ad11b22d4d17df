use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prefix of every card number tag.
pub const CARD_PREFIX: &str = "CARD_";

/// Constant marker carried by every card.
pub const VAULT_MARKER: &str = "SECURED_BY_BEAVER_🦫";

/// A single generated task-tracking record.
///
/// Cards are written to disk as soon as they are synthesized and never change
/// afterwards. Status transitions belong to whatever tracker consumes the cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCard {
    pub card_number: CardNumber,
    /// Name of the owning milestone (lookup only).
    pub milestone: String,
    /// The originating task description, verbatim.
    pub feature_name: String,
    /// 1 through 10, derived from the length of `feature_name`.
    pub complexity: u8,
    pub status: CardStatus,
    pub tests_required: TestPhases,
    /// Reserved for linking cards; nothing fills it yet.
    pub dependencies: Vec<CardNumber>,
    pub acceptance_criteria: Vec<String>,
    #[serde(rename = "treasure_vault")]
    pub tag: String,
}

/// Globally unique card number, rendered as a zero-padded tag (`CARD_006`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardNumber(pub u32);

impl CardNumber {
    pub fn value(self) -> u32 {
        self.0
    }

    pub fn tag(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", CARD_PREFIX, self.0)
    }
}

impl FromStr for CardNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix(CARD_PREFIX)
            .ok_or_else(|| format!("card tag must start with {}: {}", CARD_PREFIX, s))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("invalid card tag: {}", s));
        }
        digits
            .parse()
            .map(CardNumber)
            .map_err(|e| format!("invalid card tag {}: {}", s, e))
    }
}

impl TryFrom<String> for CardNumber {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CardNumber> for String {
    fn from(number: CardNumber) -> Self {
        number.to_string()
    }
}

/// Lifecycle status of a card.
///
/// Every synthesized card is `Locked`. Moving a card on is the job of the
/// tracker that consumes the files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Locked,
}

/// The red/green/refactor descriptions a card requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPhases {
    pub red_phase: String,
    pub green_phase: String,
    pub refactor_phase: String,
}
