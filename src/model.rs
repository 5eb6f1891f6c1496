use std::fmt;

/// One operand of a content-stream operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// Literal string, written back as `( ... )`.
    String(Vec<u8>),
    /// Hex string, written back as `< ... >`.
    HexString(Vec<u8>),
    Name(String),
    Array(Vec<Operand>),
    Dictionary(Vec<(String, Operand)>),
    /// Raw inline image body (`dict ID data EI`), only ever produced for `BI`.
    InlineImage(Vec<u8>),
}

impl Operand {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Operand::Real(v) => Some(*v),
            Operand::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Operand::Name(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Operand::String(v) | Operand::HexString(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Operand::String(_) | Operand::HexString(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Operand::Integer(_) | Operand::Real(_))
    }

    /// Builds a string operand with the same representation as `self`.
    pub fn with_bytes(&self, bytes: Vec<u8>) -> Operand {
        match self {
            Operand::HexString(_) => Operand::HexString(bytes),
            _ => Operand::String(bytes),
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Operand::Null => out.extend_from_slice(b"null"),
            Operand::Boolean(true) => out.extend_from_slice(b"true"),
            Operand::Boolean(false) => out.extend_from_slice(b"false"),
            Operand::Integer(v) => out.extend_from_slice(v.to_string().as_bytes()),
            Operand::Real(v) => out.extend_from_slice(format_real(*v).as_bytes()),
            Operand::String(bytes) => write_literal_string(bytes, out),
            Operand::HexString(bytes) => {
                out.push(b'<');
                for b in bytes {
                    out.extend_from_slice(format!("{b:02X}").as_bytes());
                }
                out.push(b'>');
            }
            Operand::Name(name) => {
                out.push(b'/');
                out.extend_from_slice(name.as_bytes());
            }
            Operand::Array(items) => {
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    item.write_to(out);
                }
                out.push(b']');
            }
            Operand::Dictionary(entries) => {
                out.extend_from_slice(b"<<");
                for (key, value) in entries {
                    out.extend_from_slice(b" /");
                    out.extend_from_slice(key.as_bytes());
                    out.push(b' ');
                    value.write_to(out);
                }
                out.extend_from_slice(b" >>");
            }
            Operand::InlineImage(raw) => out.extend_from_slice(raw),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}

/// Reals are written with four decimals and trailing zeros trimmed.
pub fn format_real(v: f64) -> String {
    let mut s = format!("{v:.4}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

fn write_literal_string(bytes: &[u8], out: &mut Vec<u8>) {
    out.push(b'(');
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\r' => out.extend_from_slice(b"\\r"),
            _ => out.push(b),
        }
    }
    out.push(b')');
}

/// One `(operands, operator)` record from a content stream, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operands: Vec<Operand>,
    pub operator: String,
}

impl Operation {
    pub fn new(operands: Vec<Operand>, operator: impl Into<String>) -> Self {
        Self {
            operands,
            operator: operator.into(),
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        if self.operator == "BI" {
            // Inline images keep their operator in front of the raw body.
            out.extend_from_slice(b"BI");
            for operand in &self.operands {
                out.push(b' ');
                operand.write_to(out);
            }
            out.push(b'\n');
            return;
        }
        for operand in &self.operands {
            operand.write_to(out);
            out.push(b' ');
        }
        out.extend_from_slice(self.operator.as_bytes());
        out.push(b'\n');
    }
}

pub fn write_operations(operations: &[Operation]) -> Vec<u8> {
    let mut out = Vec::new();
    for op in operations {
        op.write_to(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reals_use_fixed_precision() {
        assert_eq!(format_real(12.0), "12");
        assert_eq!(format_real(0.5), "0.5");
        assert_eq!(format_real(-3.14159), "-3.1416");
        assert_eq!(format_real(-0.00001), "0");
    }

    #[test]
    fn literal_strings_escape_delimiters() {
        let op = Operand::String(b"a(b)c\\d\re".to_vec());
        assert_eq!(op.to_bytes(), b"(a\\(b\\)c\\\\d\\re)".to_vec());
    }

    #[test]
    fn arrays_and_hex_strings_serialize() {
        let op = Operand::Array(vec![
            Operand::HexString(vec![0x00, 0x2A]),
            Operand::Integer(-120),
            Operand::String(b"x".to_vec()),
        ]);
        assert_eq!(op.to_bytes(), b"[<002A> -120 (x)]".to_vec());
    }

    #[test]
    fn operation_writes_operands_before_operator() {
        let op = Operation::new(
            vec![Operand::Name("F1".to_string()), Operand::Integer(12)],
            "Tf",
        );
        let mut out = Vec::new();
        op.write_to(&mut out);
        assert_eq!(out, b"/F1 12 Tf\n".to_vec());
    }

    #[test]
    fn with_bytes_preserves_representation() {
        let hex = Operand::HexString(vec![1]);
        assert_eq!(hex.with_bytes(vec![2]), Operand::HexString(vec![2]));
        let lit = Operand::String(vec![1]);
        assert_eq!(lit.with_bytes(vec![2]), Operand::String(vec![2]));
    }
}
