use crate::model::{Operand, Operation};
use crate::tokenizer::{Lexer, Token};

/// Splits decoded content-stream bytes into `(operands, operator)` records.
pub fn parse_operations(data: &[u8]) -> Vec<Operation> {
    let mut tokenizer = ContentTokenizer::new(data);
    let mut out = Vec::new();
    while let Some(op) = tokenizer.next_operation() {
        out.push(op);
    }
    out
}

struct ContentTokenizer<'a> {
    lexer: Lexer<'a>,
}

impl<'a> ContentTokenizer<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            lexer: Lexer::new(data),
        }
    }

    fn next_operation(&mut self) -> Option<Operation> {
        let mut operands = Vec::new();
        while let Some(tok) = self.lexer.next_token() {
            match tok {
                Token::Keyword(op) => {
                    if op == "BI" {
                        let raw = self.lexer.take_inline_image();
                        operands.push(Operand::InlineImage(raw));
                    }
                    return Some(Operation::new(operands, op));
                }
                _ => {
                    if let Some(obj) = self.parse_operand(tok) {
                        operands.push(obj);
                    }
                }
            }
        }
        // Trailing operands without an operator are dropped.
        None
    }

    fn parse_operand(&mut self, tok: Token) -> Option<Operand> {
        match tok {
            Token::Null => Some(Operand::Null),
            Token::Boolean(v) => Some(Operand::Boolean(v)),
            Token::Integer(v) => Some(Operand::Integer(v)),
            Token::Real(v) => Some(Operand::Real(v)),
            Token::String(v) => Some(Operand::String(v)),
            Token::HexString(v) => Some(Operand::HexString(v)),
            Token::Name(v) => Some(Operand::Name(v)),
            Token::ArrayStart => Some(Operand::Array(self.parse_array())),
            Token::DictStart => Some(Operand::Dictionary(self.parse_dictionary())),
            Token::ArrayEnd | Token::DictEnd | Token::Keyword(_) => None,
        }
    }

    fn parse_array(&mut self) -> Vec<Operand> {
        let mut items = Vec::new();
        while let Some(tok) = self.lexer.next_token() {
            if tok == Token::ArrayEnd {
                break;
            }
            if let Some(obj) = self.parse_operand(tok) {
                items.push(obj);
            }
        }
        items
    }

    fn parse_dictionary(&mut self) -> Vec<(String, Operand)> {
        let mut entries = Vec::new();
        while let Some(tok) = self.lexer.next_token() {
            match tok {
                Token::DictEnd => break,
                Token::Name(key) => {
                    let Some(value_tok) = self.lexer.next_token() else {
                        break;
                    };
                    if value_tok == Token::DictEnd {
                        break;
                    }
                    if let Some(value) = self.parse_operand(value_tok) {
                        entries.push((key, value));
                    }
                }
                _ => {}
            }
        }
        entries
    }
}
