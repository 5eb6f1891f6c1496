use std::fmt::Write as _;

use crate::instruction::Instruction;
use crate::schedule::{Change, Schedule};

/// One instruction as seen by a reviewer: what it is, what it says and what will happen to it.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectRow {
    pub index: usize,
    pub operator: String,
    pub operands: String,
    pub text: String,
    pub change: String,
}

pub fn inspect(instructions: &[Instruction], schedule: &Schedule) -> Vec<InspectRow> {
    instructions
        .iter()
        .enumerate()
        .map(|(index, instruction)| {
            let operation = instruction.to_operation();
            let operands = operation
                .operands
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");

            let mut text = String::new();
            if let Some(ch) = instruction.implied() {
                text.push(ch);
            }
            for operand in instruction.text_operands() {
                text.push_str(&operand.text);
            }

            let mut change = schedule.instruction(index).describe();
            for j in 0..instruction.text_operands().len() {
                let operand_change = schedule.operand(index, j);
                if *operand_change != Change::NoChange {
                    if !change.is_empty() {
                        change.push_str("; ");
                    }
                    let _ = write!(change, "#{j}: {}", operand_change.describe());
                }
            }

            InspectRow {
                index,
                operator: instruction.operator().to_string(),
                operands,
                text,
                change,
            }
        })
        .collect()
}

/// Tab-separated table, control characters in text escaped.
pub fn render_table(rows: &[InspectRow]) -> String {
    let mut out = String::from("index\toperator\toperands\ttext\tchange\n");
    for row in rows {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            row.index,
            row.operator,
            row.operands.escape_debug(),
            row.text.escape_debug(),
            row.change
        );
    }
    out
}
