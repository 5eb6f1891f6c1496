use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::font::FontSet;
use crate::model::{Operand, Operation};

/// Decides which characters positioning instructions and kerning adjustments imply.
///
/// The defaults follow what common PDF generators emit: a vertical move is a line
/// break, a purely horizontal move is a word space, and a kerning adjustment wider
/// than the font's halfspace is a word space. None of this is guaranteed by the
/// format, so callers can swap the policy.
pub trait SpacingPolicy {
    fn for_move(&self, dx: f64, dy: f64) -> Option<char>;

    fn for_adjustment(&self, amount: f64, halfspace: f64) -> Option<char>;

    fn for_next_line(&self) -> Option<char> {
        Some('\n')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicSpacing {
    pub newline_on_vertical_move: bool,
    pub space_on_horizontal_move: bool,
    pub space_on_adjustment: bool,
}

impl Default for HeuristicSpacing {
    fn default() -> Self {
        Self {
            newline_on_vertical_move: true,
            space_on_horizontal_move: true,
            space_on_adjustment: true,
        }
    }
}

impl SpacingPolicy for HeuristicSpacing {
    fn for_move(&self, dx: f64, dy: f64) -> Option<char> {
        if dy != 0.0 {
            self.newline_on_vertical_move.then_some('\n')
        } else if dx != 0.0 {
            self.space_on_horizontal_move.then_some(' ')
        } else {
            None
        }
    }

    fn for_adjustment(&self, amount: f64, halfspace: f64) -> Option<char> {
        (self.space_on_adjustment && amount < -halfspace).then_some(' ')
    }

    fn for_next_line(&self) -> Option<char> {
        self.newline_on_vertical_move.then_some('\n')
    }
}

/// An operand that can contribute projected text: a string (decoded text) or a
/// kerning number inside an adjusted array (inferred spacing, possibly empty).
#[derive(Debug, Clone, PartialEq)]
pub struct TextOperand {
    pub operand: Operand,
    pub text: String,
}

impl TextOperand {
    pub fn is_string(&self) -> bool {
        self.operand.is_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    SelectFont,
    MoveText,
    ShowText,
    ShowTextAdjusted,
    Passthrough,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `Tf`. Updates the cursor; carries no text.
    SelectFont { operands: Vec<Operand>, font: String },
    /// `Td`, `TD`, `T*`.
    MoveText {
        operator: String,
        operands: Vec<Operand>,
        implied: Option<char>,
    },
    /// `Tj`, `'`, `"`. `leading` holds the spacing operands of `"`.
    ShowText {
        operator: String,
        font: String,
        leading: Vec<Operand>,
        text: TextOperand,
        implied: Option<char>,
    },
    /// `TJ`.
    ShowTextAdjusted { font: String, elements: Vec<TextOperand> },
    Passthrough(Operation),
}

/// Cursor threaded through instruction construction, left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cursor {
    pub active_font: Option<String>,
}

pub struct BuildContext<'a> {
    pub fonts: &'a FontSet,
    pub spacing: &'a dyn SpacingPolicy,
}

type Constructor = fn(Operation, Cursor, &BuildContext<'_>) -> Result<(Instruction, Cursor)>;

fn constructors() -> &'static HashMap<&'static str, Constructor> {
    static TABLE: OnceLock<HashMap<&'static str, Constructor>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table: HashMap<&'static str, Constructor> = HashMap::new();
        table.insert("Tf", select_font);
        table.insert("Td", move_text);
        table.insert("TD", move_text);
        table.insert("T*", next_line);
        table.insert("Tj", show_text);
        table.insert("'", show_text);
        table.insert("\"", show_text);
        table.insert("TJ", show_text_adjusted);
        table
    })
}

/// Interprets `operations` in order. Font selection only ever flows forward: each
/// show-text instruction decodes with the font active when it was constructed.
pub fn build_instructions(
    operations: Vec<Operation>,
    ctx: &BuildContext<'_>,
) -> Result<Vec<Instruction>> {
    let capacity = operations.len();
    operations
        .into_iter()
        .try_fold(
            (Cursor::default(), Vec::with_capacity(capacity)),
            |(cursor, mut out), op| {
                let (instruction, cursor) = Instruction::from_operation(op, cursor, ctx)?;
                out.push(instruction);
                Ok((cursor, out))
            },
        )
        .map(|(_, out)| out)
}

impl Instruction {
    pub fn from_operation(
        op: Operation,
        cursor: Cursor,
        ctx: &BuildContext<'_>,
    ) -> Result<(Instruction, Cursor)> {
        match constructors().get(op.operator.as_str()) {
            Some(constructor) => constructor(op, cursor, ctx),
            None => Ok((Instruction::Passthrough(op), cursor)),
        }
    }

    pub fn kind(&self) -> InstructionKind {
        match self {
            Instruction::SelectFont { .. } => InstructionKind::SelectFont,
            Instruction::MoveText { .. } => InstructionKind::MoveText,
            Instruction::ShowText { .. } => InstructionKind::ShowText,
            Instruction::ShowTextAdjusted { .. } => InstructionKind::ShowTextAdjusted,
            Instruction::Passthrough(_) => InstructionKind::Passthrough,
        }
    }

    pub fn operator(&self) -> &str {
        match self {
            Instruction::SelectFont { .. } => "Tf",
            Instruction::MoveText { operator, .. } | Instruction::ShowText { operator, .. } => {
                operator
            }
            Instruction::ShowTextAdjusted { .. } => "TJ",
            Instruction::Passthrough(op) => &op.operator,
        }
    }

    /// Font snapshotted at construction time, for text-bearing instructions.
    pub fn font(&self) -> Option<&str> {
        match self {
            Instruction::ShowText { font, .. } | Instruction::ShowTextAdjusted { font, .. } => {
                Some(font)
            }
            _ => None,
        }
    }

    /// Character implied before any operand text (line break of `T*`, `'`, `"`, spacing of `Td`).
    pub fn implied(&self) -> Option<char> {
        match self {
            Instruction::MoveText { implied, .. } | Instruction::ShowText { implied, .. } => {
                *implied
            }
            _ => None,
        }
    }

    pub fn text_operands(&self) -> &[TextOperand] {
        match self {
            Instruction::ShowText { text, .. } => std::slice::from_ref(text),
            Instruction::ShowTextAdjusted { elements, .. } => elements,
            _ => &[],
        }
    }

    /// Decoded text of the instruction's string operands, without inferred spacing.
    pub fn decoded_text(&self) -> String {
        self.text_operands()
            .iter()
            .filter(|t| t.is_string())
            .map(|t| t.text.as_str())
            .collect()
    }

    /// Replaces the text operands, e.g. after re-encoding edited strings.
    pub(crate) fn with_text_operands(self, replacement: Vec<TextOperand>) -> Instruction {
        match self {
            Instruction::ShowText {
                operator,
                font,
                leading,
                text,
                implied,
            } => Instruction::ShowText {
                operator,
                font,
                leading,
                text: replacement.into_iter().next().unwrap_or(text),
                implied,
            },
            Instruction::ShowTextAdjusted { font, .. } => Instruction::ShowTextAdjusted {
                font,
                elements: replacement,
            },
            other => other,
        }
    }

    pub fn to_operation(&self) -> Operation {
        match self {
            Instruction::SelectFont { operands, .. } => Operation::new(operands.clone(), "Tf"),
            Instruction::MoveText {
                operator, operands, ..
            } => Operation::new(operands.clone(), operator.clone()),
            Instruction::ShowText {
                operator,
                leading,
                text,
                ..
            } => {
                let mut operands = leading.clone();
                operands.push(text.operand.clone());
                Operation::new(operands, operator.clone())
            }
            Instruction::ShowTextAdjusted { elements, .. } => Operation::new(
                vec![Operand::Array(
                    elements.iter().map(|e| e.operand.clone()).collect(),
                )],
                "TJ",
            ),
            Instruction::Passthrough(op) => op.clone(),
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        self.to_operation().write_to(out);
    }
}

fn select_font(
    op: Operation,
    _cursor: Cursor,
    _ctx: &BuildContext<'_>,
) -> Result<(Instruction, Cursor)> {
    let Some(font) = op.operands.first().and_then(Operand::as_name) else {
        return Err(Error::malformed("Tf", "first operand must be a font name"));
    };
    let font = font.to_string();
    let cursor = Cursor {
        active_font: Some(font.clone()),
    };
    Ok((
        Instruction::SelectFont {
            operands: op.operands,
            font,
        },
        cursor,
    ))
}

fn move_text(
    op: Operation,
    cursor: Cursor,
    ctx: &BuildContext<'_>,
) -> Result<(Instruction, Cursor)> {
    let (dx, dy) = match op.operands.as_slice() {
        [dx, dy] => match (dx.as_f64(), dy.as_f64()) {
            (Some(dx), Some(dy)) => (dx, dy),
            _ => return Err(Error::malformed(&op.operator, "offsets must be numbers")),
        },
        _ => {
            return Err(Error::malformed(
                &op.operator,
                format!("expected 2 operands, got {}", op.operands.len()),
            ));
        }
    };
    Ok((
        Instruction::MoveText {
            implied: ctx.spacing.for_move(dx, dy),
            operator: op.operator,
            operands: op.operands,
        },
        cursor,
    ))
}

fn next_line(
    op: Operation,
    cursor: Cursor,
    ctx: &BuildContext<'_>,
) -> Result<(Instruction, Cursor)> {
    if !op.operands.is_empty() {
        return Err(Error::malformed("T*", "takes no operands"));
    }
    Ok((
        Instruction::MoveText {
            implied: ctx.spacing.for_next_line(),
            operator: op.operator,
            operands: op.operands,
        },
        cursor,
    ))
}

fn active_font(cursor: &Cursor) -> Result<&str> {
    cursor
        .active_font
        .as_deref()
        .ok_or_else(|| Error::UnknownFont(String::new()))
}

fn show_text(
    op: Operation,
    cursor: Cursor,
    ctx: &BuildContext<'_>,
) -> Result<(Instruction, Cursor)> {
    let (expected, implied) = match op.operator.as_str() {
        "\"" => (3, ctx.spacing.for_next_line()),
        "'" => (1, ctx.spacing.for_next_line()),
        _ => (1, None),
    };
    if op.operands.len() != expected {
        return Err(Error::malformed(
            &op.operator,
            format!("expected {expected} operand(s), got {}", op.operands.len()),
        ));
    }
    let mut leading = op.operands;
    let operand = leading.pop().filter(Operand::is_string).ok_or_else(|| {
        Error::malformed(&op.operator, "last operand must be a string")
    })?;
    if !leading.iter().all(Operand::is_number) {
        return Err(Error::malformed(&op.operator, "spacing operands must be numbers"));
    }

    let font_name = active_font(&cursor)?.to_string();
    let text = ctx.fonts.get(&font_name)?.decode(&operand)?;
    Ok((
        Instruction::ShowText {
            operator: op.operator,
            font: font_name,
            leading,
            text: TextOperand { operand, text },
            implied,
        },
        cursor,
    ))
}

fn show_text_adjusted(
    op: Operation,
    cursor: Cursor,
    ctx: &BuildContext<'_>,
) -> Result<(Instruction, Cursor)> {
    let mut operands = op.operands;
    let items = match (operands.pop(), operands.is_empty()) {
        (Some(Operand::Array(items)), true) => items,
        _ => {
            return Err(Error::malformed("TJ", "expected exactly one array operand"));
        }
    };

    let font_name = active_font(&cursor)?.to_string();
    let font = ctx.fonts.get(&font_name)?;
    let elements = items
        .into_iter()
        .map(|operand| {
            let text = if operand.is_string() {
                font.decode(&operand)?
            } else if let Some(amount) = operand.as_f64() {
                ctx.spacing
                    .for_adjustment(amount, font.halfspace())
                    .map(String::from)
                    .unwrap_or_default()
            } else {
                return Err(Error::UnsupportedRepresentation(format!(
                    "TJ array element {operand} is neither a string nor a number"
                )));
            };
            Ok(TextOperand { operand, text })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((
        Instruction::ShowTextAdjusted {
            font: font_name,
            elements,
        },
        cursor,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::parse_operations;
    use crate::font::{EncodingMode, FontMap};

    fn fonts() -> FontSet {
        [
            FontMap::new("F1", EncodingMode::Direct),
            FontMap::new("F2", EncodingMode::ByteTable)
                .with_glyphs([(1, "x".to_string()), (2, "y".to_string())]),
        ]
        .into_iter()
        .collect()
    }

    fn build(input: &[u8]) -> Result<Vec<Instruction>> {
        let fonts = fonts();
        let spacing = HeuristicSpacing::default();
        let ctx = BuildContext {
            fonts: &fonts,
            spacing: &spacing,
        };
        build_instructions(parse_operations(input), &ctx)
    }

    #[test]
    fn font_is_snapshotted_per_instruction() {
        let ins = build(b"/F1 12 Tf (ab) Tj /F2 12 Tf <0102> Tj").unwrap();
        assert_eq!(ins[1].font(), Some("F1"));
        assert_eq!(ins[1].decoded_text(), "ab");
        assert_eq!(ins[3].font(), Some("F2"));
        assert_eq!(ins[3].decoded_text(), "xy");
    }

    #[test]
    fn move_text_implies_spacing() {
        let ins = build(b"0 -14 Td 30 0 Td 0 0 Td T*").unwrap();
        let implied: Vec<Option<char>> = ins.iter().map(Instruction::implied).collect();
        assert_eq!(implied, vec![Some('\n'), Some(' '), None, Some('\n')]);
    }

    #[test]
    fn adjustments_beyond_halfspace_become_spaces() {
        let ins = build(b"/F1 10 Tf [(a) -100 (b) -300 (c) 200] TJ").unwrap();
        let texts: Vec<&str> = ins[1]
            .text_operands()
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "", "b", " ", "c", ""]);
    }

    #[test]
    fn quote_operators_carry_line_break() {
        let ins = build(b"/F1 10 Tf (a) ' 1 2 (b) \"").unwrap();
        assert_eq!(ins[1].implied(), Some('\n'));
        assert_eq!(ins[2].decoded_text(), "b");
        assert_eq!(
            ins[2].to_operation().operands,
            vec![
                Operand::Integer(1),
                Operand::Integer(2),
                Operand::String(b"b".to_vec())
            ]
        );
    }

    #[test]
    fn unknown_operators_pass_through() {
        let ins = build(b"q 1 0 0 1 5 5 cm Q").unwrap();
        assert!(ins.iter().all(|i| i.kind() == InstructionKind::Passthrough));
        assert_eq!(ins[1].operator(), "cm");
    }

    #[test]
    fn adjusted_show_requires_single_array() {
        let err = build(b"/F1 10 Tf (a) TJ").unwrap_err();
        assert!(matches!(err, Error::MalformedInstruction { ref operator, .. } if operator == "TJ"));
    }

    #[test]
    fn adjusted_show_rejects_foreign_elements() {
        let err = build(b"/F1 10 Tf [(a) /Name] TJ").unwrap_err();
        assert!(matches!(err, Error::UnsupportedRepresentation(_)));
    }

    #[test]
    fn show_text_without_font_fails() {
        let err = build(b"(a) Tj").unwrap_err();
        assert!(matches!(err, Error::UnknownFont(ref name) if name.is_empty()));
    }

    #[test]
    fn custom_policy_is_respected() {
        struct NoSpacing;
        impl SpacingPolicy for NoSpacing {
            fn for_move(&self, _dx: f64, _dy: f64) -> Option<char> {
                None
            }
            fn for_adjustment(&self, _amount: f64, _halfspace: f64) -> Option<char> {
                None
            }
        }
        let fonts = fonts();
        let ctx = BuildContext {
            fonts: &fonts,
            spacing: &NoSpacing,
        };
        let ins = build_instructions(parse_operations(b"0 -14 Td T*"), &ctx).unwrap();
        assert_eq!(ins[0].implied(), None);
        assert_eq!(ins[1].implied(), Some('\n'));
    }
}
