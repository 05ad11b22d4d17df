//! Selection patterns decide which card files belong in a milestone archive.
//!
//! A pattern is a comma-separated list of segments such as
//! `CARD_00[6-9].yml,CARD_01[0-2].yml`. A file is selected when any segment
//! matches its name. How a segment matches depends on the [`MatchMode`]:
//!
//! - [`MatchMode::Literal`] tests each segment as a plain substring, brackets
//!   included. Bracket segments therefore select nothing against generated
//!   card names. Segments are the raw comma split: surrounding spaces are kept
//!   and an empty segment (`"a,"`) selects every file. This is the compatible
//!   default.
//! - [`MatchMode::NumericRange`] reads `<prefix><digits>[<lo>-<hi>]<suffix>` as an
//!   inclusive card-number range.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DamError, Result};

/// Which strategy interprets selection segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    #[default]
    Literal,
    NumericRange,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::NumericRange => "numeric-range",
        }
    }

    /// Build the matcher for one milestone's selection text.
    pub fn matcher(self, selection: &str) -> Result<Box<dyn CardMatcher>> {
        Ok(match self {
            Self::Literal => Box::new(LiteralMatcher::new(SelectionPattern::raw(selection))),
            Self::NumericRange => {
                Box::new(NumericRangeMatcher::new(SelectionPattern::parse(selection))?)
            }
        })
    }
}

/// Decides whether a card file belongs to an archive.
pub trait CardMatcher {
    fn matches(&self, file_name: &str) -> bool;
}

/// The segments of a selection pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPattern {
    segments: Vec<String>,
}

impl SelectionPattern {
    /// Split on commas, trimming whitespace and dropping empty segments.
    pub fn parse(text: &str) -> Self {
        let segments = text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    /// Split on commas and keep every segment verbatim, empty ones included.
    pub fn raw(text: &str) -> Self {
        Self {
            segments: text.split(',').map(str::to_string).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

/// Substring matching, segment text taken verbatim.
#[derive(Debug, Clone)]
pub struct LiteralMatcher {
    pattern: SelectionPattern,
}

impl LiteralMatcher {
    pub fn new(pattern: SelectionPattern) -> Self {
        Self { pattern }
    }
}

impl CardMatcher for LiteralMatcher {
    fn matches(&self, file_name: &str) -> bool {
        self.pattern
            .segments()
            .iter()
            .any(|segment| file_name.contains(segment.as_str()))
    }
}

/// Card-number range matching for bracket segments.
#[derive(Debug, Clone)]
pub struct NumericRangeMatcher {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Range(RangeSegment),
}

#[derive(Debug, Clone)]
struct RangeSegment {
    locator: Regex,
    width: usize,
    start: u32,
    end: u32,
    suffix: String,
}

fn bracket_syntax() -> &'static Regex {
    static SYNTAX: OnceLock<Regex> = OnceLock::new();
    SYNTAX.get_or_init(|| {
        Regex::new(r"^(?P<prefix>.*?)(?P<digits>\d*)\[(?P<lo>\d+)-(?P<hi>\d+)\](?P<suffix>.*)$")
            .expect("bracket syntax regex is valid")
    })
}

impl NumericRangeMatcher {
    pub fn new(pattern: SelectionPattern) -> Result<Self> {
        let segments = pattern
            .segments()
            .iter()
            .map(|s| Segment::parse(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }

    /// Inclusive ranges of the bracket segments, in order.
    pub fn ranges(&self) -> Vec<(u32, u32)> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Range(r) => Some((r.start, r.end)),
                Segment::Literal(_) => None,
            })
            .collect()
    }
}

impl Segment {
    fn parse(segment: &str) -> Result<Self> {
        let Some(caps) = bracket_syntax().captures(segment) else {
            return Ok(Self::Literal(segment.to_string()));
        };

        let invalid = |reason: String| DamError::Pattern {
            segment: segment.to_string(),
            reason,
        };

        let prefix = &caps["prefix"];
        let lo = &caps["lo"];
        let hi = &caps["hi"];
        let base = format!("{}{}", &caps["digits"], lo);
        let width = base.len();

        // The upper bound overlays `hi` onto the right of the lower bound:
        // `03[6-42]` spans 036..=042.
        if hi.len() > width {
            return Err(invalid(format!(
                "upper bound {} is wider than the {}-digit card number",
                hi, width
            )));
        }
        let upper = format!("{}{}", &base[..width - hi.len()], hi);

        let parse = |digits: &str| {
            digits
                .parse::<u32>()
                .map_err(|e| invalid(format!("{}: {}", digits, e)))
        };
        let start = parse(&base)?;
        let end = parse(&upper)?;
        if start > end {
            return Err(invalid(format!("range {}..={} is empty", start, end)));
        }

        let locator = Regex::new(&format!(r"{}(\d+)", regex::escape(prefix)))
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self::Range(RangeSegment {
            locator,
            width,
            start,
            end,
            suffix: caps["suffix"].to_string(),
        }))
    }

    fn matches(&self, file_name: &str) -> bool {
        match self {
            Self::Literal(text) => file_name.contains(text.as_str()),
            Self::Range(range) => range.matches(file_name),
        }
    }
}

impl RangeSegment {
    fn matches(&self, file_name: &str) -> bool {
        self.locator.captures_iter(file_name).any(|caps| {
            let Some(digits) = caps.get(1) else {
                return false;
            };
            if digits.as_str().len() != self.width {
                return false;
            }
            let in_range = digits
                .as_str()
                .parse::<u32>()
                .map(|n| (self.start..=self.end).contains(&n))
                .unwrap_or(false);
            in_range && file_name[digits.end()..].contains(self.suffix.as_str())
        })
    }
}

impl CardMatcher for NumericRangeMatcher {
    fn matches(&self, file_name: &str) -> bool {
        self.segments.iter().any(|s| s.matches(file_name))
    }
}
