use std::collections::BTreeSet;
use std::str::FromStr;

use regex::Regex;

use crate::instruction::Instruction;
use crate::projection::{Projection, Source};

/// Selects matches by their ordinal in the full, unfiltered match sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFilter {
    ordinals: BTreeSet<usize>,
}

impl MatchFilter {
    pub fn new(ordinals: impl IntoIterator<Item = usize>) -> Self {
        Self {
            ordinals: ordinals.into_iter().collect(),
        }
    }

    pub fn contains(&self, ordinal: usize) -> bool {
        self.ordinals.contains(&ordinal)
    }
}

impl FromStr for MatchFilter {
    type Err = std::num::ParseIntError;

    /// Parses a comma-separated list such as `0,2,5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect::<Result<BTreeSet<usize>, _>>()
            .map(|ordinals| Self { ordinals })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
    /// Position in the unfiltered match sequence.
    pub ordinal: usize,
    /// Byte range in the projected text.
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Leftmost-first, non-overlapping matches over the whole projected text.
pub fn find_spans(text: &str, pattern: &Regex, filter: Option<&MatchFilter>) -> Vec<MatchSpan> {
    pattern
        .find_iter(text)
        .enumerate()
        .filter(|(ordinal, _)| filter.is_none_or(|f| f.contains(*ordinal)))
        .map(|(ordinal, m)| MatchSpan {
            ordinal,
            start: m.start(),
            end: m.end(),
            text: m.as_str().to_string(),
        })
        .collect()
}

/// A position inside one string operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub instruction: usize,
    pub operand: usize,
    /// Character offset within the operand's decoded text.
    pub offset: usize,
}

/// Something a match covers: an operand, or an instruction through its implied character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Touched {
    pub instruction: usize,
    pub operand: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSpan {
    pub ordinal: usize,
    pub first: Boundary,
    /// Inclusive: the last matched character.
    pub last: Boundary,
    /// Unmatched text sharing the first operand, before the match.
    pub prefix: String,
    /// Unmatched text sharing the last operand, after the match.
    pub suffix: String,
    pub matched: String,
    /// Every operand (including kerning that implies nothing) and implied character
    /// from `first` through `last`, in document order.
    pub touched: Vec<Touched>,
}

impl ResolvedSpan {
    /// Touched instructions in document order, without repeats.
    pub fn instructions(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self.touched.iter().map(|t| t.instruction).collect();
        out.dedup();
        out
    }
}

/// Maps a match onto the operands it covers. Boundaries that fall on inferred spacing
/// move inward to the nearest string operand. Returns `None` for empty matches and
/// for matches made only of inferred characters.
pub fn resolve(
    span: &MatchSpan,
    projection: &Projection,
    instructions: &[Instruction],
) -> Option<ResolvedSpan> {
    if span.start >= span.end {
        return None;
    }
    let lo = projection.char_index(span.start);
    let hi = projection.char_index(span.end);
    let covered = projection.chars.get(lo..hi)?;

    let first_index = covered.iter().position(|c| c.source == Source::Text)?;
    let last_index = covered.iter().rposition(|c| c.source == Source::Text)?;
    let first_char = covered[first_index];
    let last_char = covered[last_index];
    let first = Boundary {
        instruction: first_char.instruction,
        operand: first_char.operand?,
        offset: first_char.offset,
    };
    let last = Boundary {
        instruction: last_char.instruction,
        operand: last_char.operand?,
        offset: last_char.offset,
    };

    let first_text = &instructions[first.instruction].text_operands()[first.operand].text;
    let last_text = &instructions[last.instruction].text_operands()[last.operand].text;
    let prefix: String = first_text.chars().take(first.offset).collect();
    let suffix: String = last_text.chars().skip(last.offset + 1).collect();

    // Walk operands rather than characters: kerning numbers that imply nothing
    // still sit inside the match.
    let mut touched: Vec<Touched> = Vec::new();
    for index in first.instruction..=last.instruction {
        let instruction = &instructions[index];
        if index > first.instruction && instruction.implied().is_some() {
            touched.push(Touched {
                instruction: index,
                operand: None,
            });
        }
        let count = instruction.text_operands().len();
        if count == 0 {
            continue;
        }
        let lo = if index == first.instruction { first.operand } else { 0 };
        let hi = if index == last.instruction { last.operand } else { count - 1 };
        touched.extend((lo..=hi).map(|operand| Touched {
            instruction: index,
            operand: Some(operand),
        }));
    }

    Some(ResolvedSpan {
        ordinal: span.ordinal,
        first,
        last,
        prefix,
        suffix,
        matched: span.text.clone(),
        touched,
    })
}
