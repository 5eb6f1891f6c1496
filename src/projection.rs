use crate::instruction::Instruction;

/// Where a projected character came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Decoded from a string operand.
    Text,
    /// Inferred from a kerning number inside an adjusted array.
    Adjustment,
    /// Implied by the instruction itself (text moves, `T*`, `'`, `"`).
    Implied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectedChar {
    pub ch: char,
    /// Byte offset of `ch` in the projected text.
    pub byte: usize,
    pub instruction: usize,
    /// Index into the instruction's text operands; `None` for implied characters.
    pub operand: Option<usize>,
    /// Character offset within the operand's text.
    pub offset: usize,
    pub source: Source,
}

/// Linear text of one instruction sequence, with per-character provenance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub text: String,
    pub chars: Vec<ProjectedChar>,
}

impl Projection {
    /// Index of the first projected character at or after byte offset `byte`.
    pub fn char_index(&self, byte: usize) -> usize {
        self.chars.partition_point(|c| c.byte < byte)
    }

    fn push(
        &mut self,
        ch: char,
        instruction: usize,
        operand: Option<usize>,
        offset: usize,
        source: Source,
    ) {
        self.chars.push(ProjectedChar {
            ch,
            byte: self.text.len(),
            instruction,
            operand,
            offset,
            source,
        });
        self.text.push(ch);
    }
}

pub fn project(instructions: &[Instruction]) -> Projection {
    let mut projection = Projection::default();
    for (index, instruction) in instructions.iter().enumerate() {
        if let Some(ch) = instruction.implied() {
            projection.push(ch, index, None, 0, Source::Implied);
        }
        for (operand_index, operand) in instruction.text_operands().iter().enumerate() {
            let source = if operand.is_string() {
                Source::Text
            } else {
                Source::Adjustment
            };
            for (offset, ch) in operand.text.chars().enumerate() {
                projection.push(ch, index, Some(operand_index), offset, source);
            }
        }
    }
    projection
}
