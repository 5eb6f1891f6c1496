use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, trace};

use crate::error::Result;
use crate::font::FontSet;
use crate::instruction::{Instruction, InstructionKind, TextOperand};
use crate::matcher::ResolvedSpan;
use crate::model::Operation;

/// Edit attached to an instruction or to one of its text operands.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Change {
    #[default]
    NoChange,
    ReplaceText(String),
    DeleteElement,
    /// Text move relocated to just after the surviving replacement point.
    ClusterMove,
    /// Instruction survives with some of its operands edited or removed.
    Modified,
}

impl Change {
    pub fn describe(&self) -> String {
        match self {
            Change::NoChange => String::new(),
            Change::ReplaceText(text) => format!("replace with {text:?}"),
            Change::DeleteElement => "delete".to_string(),
            Change::ClusterMove => "move".to_string(),
            Change::Modified => "modified".to_string(),
        }
    }
}

static NO_CHANGE: Change = Change::NoChange;

/// Side table of scheduled changes, keyed by instruction index and operand index.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    instructions: BTreeMap<usize, Change>,
    operands: BTreeMap<(usize, usize), Change>,
    anchors: BTreeMap<usize, usize>,
    scheduled: usize,
}

impl Schedule {
    pub fn instruction(&self, index: usize) -> &Change {
        self.instructions.get(&index).unwrap_or(&NO_CHANGE)
    }

    pub fn operand(&self, instruction: usize, operand: usize) -> &Change {
        self.operands
            .get(&(instruction, operand))
            .unwrap_or(&NO_CHANGE)
    }

    /// Instruction a cluster-moved text move is relocated behind.
    pub fn anchor(&self, index: usize) -> Option<usize> {
        self.anchors.get(&index).copied()
    }

    /// Number of matches that received changes.
    pub fn scheduled(&self) -> usize {
        self.scheduled
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty() && self.operands.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Splice {
    start: usize,
    end: usize,
    text: String,
}

#[derive(Debug, Clone)]
enum OperandEdit {
    Splices(Vec<Splice>),
    Delete,
}

/// Applies `splices` (character ranges of `text`) to the part of `text` from `from` on.
fn apply_splices(text: &str, splices: &[Splice], from: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut ordered: Vec<&Splice> = splices.iter().filter(|s| s.start >= from).collect();
    ordered.sort_by_key(|s| s.start);
    let mut out = String::new();
    let mut pos = from.min(chars.len());
    for splice in ordered {
        out.extend(&chars[pos..splice.start.min(chars.len())]);
        out.push_str(&splice.text);
        pos = splice.end.min(chars.len());
    }
    out.extend(&chars[pos..]);
    out
}

fn push_splice(edits: &mut HashMap<(usize, usize), OperandEdit>, key: (usize, usize), splice: Splice) {
    match edits
        .entry(key)
        .or_insert_with(|| OperandEdit::Splices(Vec::new()))
    {
        OperandEdit::Splices(splices) => splices.push(splice),
        OperandEdit::Delete => {}
    }
}

/// Assigns changes for every resolved span. `spans` must be in document order and
/// non-overlapping, as produced by the matcher.
pub fn schedule(
    instructions: &[Instruction],
    spans: &[ResolvedSpan],
    substitute: &dyn Fn(&ResolvedSpan) -> String,
) -> Schedule {
    let text_of = move |(i, j): (usize, usize)| instructions[i].text_operands()[j].text.as_str();

    let mut edits: HashMap<(usize, usize), OperandEdit> = HashMap::new();
    let mut absorbed_by: HashMap<usize, usize> = HashMap::new();

    // Back to front, so a suffix carried out of a deleted operand already holds
    // the edits of later matches that start inside it.
    for span in spans.iter().rev() {
        let replacement = substitute(span);
        let first_key = (span.first.instruction, span.first.operand);
        let last_key = (span.last.instruction, span.last.operand);
        trace!(
            "match #{} {:?} -> {:?} at {:?}..={:?}",
            span.ordinal, span.matched, replacement, first_key, last_key
        );

        if first_key == last_key {
            push_splice(
                &mut edits,
                first_key,
                Splice {
                    start: span.first.offset,
                    end: span.last.offset + 1,
                    text: replacement,
                },
            );
            continue;
        }

        let carried = match edits.get(&last_key) {
            Some(OperandEdit::Splices(splices)) => {
                apply_splices(text_of(last_key), splices, span.last.offset + 1)
            }
            _ => span.suffix.clone(),
        };
        push_splice(
            &mut edits,
            first_key,
            Splice {
                start: span.first.offset,
                end: text_of(first_key).chars().count(),
                text: replacement + &carried,
            },
        );
        for touched in &span.touched {
            if let Some(operand) = touched.operand {
                let key = (touched.instruction, operand);
                if key != first_key {
                    edits.insert(key, OperandEdit::Delete);
                }
            }
            if touched.instruction != span.first.instruction {
                absorbed_by.insert(touched.instruction, span.first.instruction);
            }
        }
    }

    let mut out = Schedule {
        scheduled: spans.len(),
        ..Schedule::default()
    };
    for (key, edit) in edits {
        let change = match edit {
            OperandEdit::Splices(splices) => Change::ReplaceText(apply_splices(text_of(key), &splices, 0)),
            // Quote operators also move to the next line, so they stay as empty shows.
            OperandEdit::Delete if instructions[key.0].implied().is_some() => {
                Change::ReplaceText(String::new())
            }
            OperandEdit::Delete => Change::DeleteElement,
        };
        out.operands.insert(key, change);
    }

    let touched: BTreeSet<usize> = spans.iter().flat_map(ResolvedSpan::instructions).collect();
    for &index in &touched {
        let instruction = &instructions[index];
        let change = if instruction.kind() == InstructionKind::MoveText {
            Change::ClusterMove
        } else {
            // Kerning that implies no character does not keep an instruction alive.
            let operands = instruction.text_operands();
            let all_deleted = operands.iter().any(TextOperand::is_string)
                && operands.iter().enumerate().all(|(j, operand)| {
                    *out.operand(index, j) == Change::DeleteElement
                        || (!operand.is_string() && operand.text.is_empty())
                });
            if all_deleted {
                Change::DeleteElement
            } else {
                Change::Modified
            }
        };
        out.instructions.insert(index, change);
    }

    for span in spans {
        for touched in span.touched.iter().filter(|t| t.operand.is_none()) {
            if instructions[touched.instruction].kind() != InstructionKind::MoveText {
                continue;
            }
            let mut anchor = span.first.instruction;
            while *out.instruction(anchor) == Change::DeleteElement {
                match absorbed_by.get(&anchor) {
                    Some(&next) if next < anchor => anchor = next,
                    _ => break,
                }
            }
            out.anchors.insert(touched.instruction, anchor);
        }
    }

    debug!(
        "scheduled {} match(es): {} instruction change(s), {} operand change(s), {} relocation(s)",
        out.scheduled,
        out.instructions.len(),
        out.operands.len(),
        out.anchors.len()
    );
    out
}

/// Applies `schedule` in a single back-to-front pass and returns the surviving operations.
pub fn rewrite(
    instructions: Vec<Instruction>,
    schedule: &Schedule,
    fonts: &FontSet,
) -> Result<Vec<Operation>> {
    let mut relocated: BTreeMap<usize, Vec<Operation>> = BTreeMap::new();
    let mut reversed: Vec<Operation> = Vec::with_capacity(instructions.len());

    for (index, instruction) in instructions.into_iter().enumerate().rev() {
        let operation = match schedule.instruction(index) {
            Change::DeleteElement => {
                if let Some(moved) = relocated.remove(&index) {
                    reversed.extend(moved);
                }
                continue;
            }
            Change::ClusterMove => match schedule.anchor(index) {
                Some(anchor) if anchor < index => {
                    relocated
                        .entry(anchor)
                        .or_default()
                        .push(instruction.to_operation());
                    continue;
                }
                _ => instruction.to_operation(),
            },
            Change::NoChange => instruction.to_operation(),
            Change::Modified | Change::ReplaceText(_) => {
                apply_operand_changes(index, instruction, schedule, fonts)?.to_operation()
            }
        };
        // Relocated moves were collected back to front, which is the order they go in here.
        if let Some(moved) = relocated.remove(&index) {
            reversed.extend(moved);
        }
        reversed.push(operation);
    }

    reversed.reverse();
    Ok(reversed)
}

fn apply_operand_changes(
    index: usize,
    instruction: Instruction,
    schedule: &Schedule,
    fonts: &FontSet,
) -> Result<Instruction> {
    let Some(font) = instruction.font().map(|name| fonts.get(name)).transpose()? else {
        return Ok(instruction);
    };

    let mut kept: Vec<TextOperand> = Vec::with_capacity(instruction.text_operands().len());
    for (j, operand) in instruction.text_operands().iter().enumerate().rev() {
        match schedule.operand(index, j) {
            Change::DeleteElement => {}
            Change::ReplaceText(text) => kept.push(TextOperand {
                operand: font.encode(text, &operand.operand)?,
                text: text.clone(),
            }),
            _ => kept.push(operand.clone()),
        }
    }
    kept.reverse();
    Ok(instruction.with_text_operands(kept))
}
