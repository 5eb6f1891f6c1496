use memchr::memmem;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(Vec<u8>),
    HexString(Vec<u8>),
    Name(String),
    Keyword(String),

    DictStart,
    DictEnd,
    ArrayStart,
    ArrayEnd,
}

/// Lexer over decoded content-stream bytes.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    pub fn next_token(&mut self) -> Option<Token> {
        while self.pos < self.input.len() {
            self.skip_whitespace_and_comments();
            if self.pos >= self.input.len() {
                return None;
            }

            let byte = self.input[self.pos];
            self.pos += 1;
            match byte {
                b'[' => return Some(Token::ArrayStart),
                b']' => return Some(Token::ArrayEnd),
                b'<' if self.peek() == Some(b'<') => {
                    self.pos += 1;
                    return Some(Token::DictStart);
                }
                b'>' if self.peek() == Some(b'>') => {
                    self.pos += 1;
                    return Some(Token::DictEnd);
                }
                b'(' => return Some(Token::String(self.read_literal_string())),
                b'<' => return Some(Token::HexString(self.read_hex_string())),
                b'/' => return Some(Token::Name(self.read_regular_run())),
                b'+' | b'-' | b'.' | b'0'..=b'9' => return Some(self.read_number(byte)),
                _ => {
                    if is_regular(byte) {
                        self.pos -= 1;
                        let word = self.read_regular_run();
                        return Some(word_to_token(word));
                    }
                }
            }
        }
        None
    }

    /// Consumes an inline image body that follows a `BI` keyword and returns it verbatim,
    /// from the first byte of the image dictionary through the closing `EI`.
    pub fn take_inline_image(&mut self) -> Vec<u8> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        let Some(id_offset) = self.find_keyword(b"ID", start) else {
            self.pos = self.input.len();
            return self.input[start..].to_vec();
        };
        let mut cursor = id_offset + 2;
        // ID is followed by exactly one whitespace byte before the data.
        if cursor < self.input.len() && is_whitespace(self.input[cursor]) {
            cursor += 1;
        }
        let end = self.find_image_end(cursor).unwrap_or(self.input.len());
        self.pos = end;
        self.input[start..end].to_vec()
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn find_keyword(&self, keyword: &[u8], from: usize) -> Option<usize> {
        let mut offset = from;
        while let Some(found) = memmem::find(&self.input[offset..], keyword) {
            let at = offset + found;
            let before_ok = at == 0 || !is_regular(self.input[at - 1]);
            let after = at + keyword.len();
            let after_ok = after >= self.input.len() || !is_regular(self.input[after]);
            if before_ok && after_ok {
                return Some(at);
            }
            offset = at + 1;
        }
        None
    }

    /// Returns the offset just past the `EI` that closes image data starting at `from`.
    fn find_image_end(&self, from: usize) -> Option<usize> {
        let mut offset = from;
        while let Some(found) = memmem::find(&self.input[offset..], b"EI") {
            let at = offset + found;
            let prev_ok = at > from && is_whitespace(self.input[at - 1]);
            let after = at + 2;
            let next_ok = after >= self.input.len()
                || is_whitespace(self.input[after])
                || is_delim(self.input[after]);
            if prev_ok && next_ok {
                return Some(after);
            }
            offset = at + 1;
        }
        None
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.input.len() && is_whitespace(self.input[self.pos]) {
                self.pos += 1;
            }
            if self.pos < self.input.len() && self.input[self.pos] == b'%' {
                while self.pos < self.input.len()
                    && self.input[self.pos] != b'\n'
                    && self.input[self.pos] != b'\r'
                {
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
    }

    fn read_literal_string(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut depth = 1;
        while self.pos < self.input.len() {
            let byte = self.input[self.pos];
            self.pos += 1;
            match byte {
                b'\\' => {
                    let Some(next) = self.peek() else {
                        break;
                    };
                    self.pos += 1;
                    match next {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0C),
                        b'\r' => {
                            if self.peek() == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut val = (next - b'0') as u16;
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(b @ b'0'..=b'7') => {
                                        self.pos += 1;
                                        val = (val << 3) | (b - b'0') as u16;
                                    }
                                    _ => break,
                                }
                            }
                            out.push((val & 0xFF) as u8);
                        }
                        other => out.push(other),
                    }
                }
                b'(' => {
                    depth += 1;
                    out.push(byte);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(byte);
                }
                _ => out.push(byte),
            }
        }
        out
    }

    fn read_hex_string(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut pending_nibble: Option<u8> = None;
        while self.pos < self.input.len() {
            let byte = self.input[self.pos];
            self.pos += 1;
            if byte == b'>' {
                break;
            }
            if let Some(nibble) = hex_nibble(byte) {
                if let Some(high) = pending_nibble.take() {
                    out.push((high << 4) | nibble);
                } else {
                    pending_nibble = Some(nibble);
                }
            }
        }
        if let Some(high) = pending_nibble {
            out.push(high << 4);
        }
        out
    }

    fn read_regular_run(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.input.len() && is_regular(self.input[self.pos]) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn read_number(&mut self, first: u8) -> Token {
        self.pos -= 1;
        debug_assert_eq!(self.input[self.pos], first);
        let s = self.read_regular_run();
        if s.contains('.') {
            Token::Real(s.parse().unwrap_or(0.0))
        } else {
            match s.parse() {
                Ok(v) => Token::Integer(v),
                Err(_) => Token::Real(s.parse().unwrap_or(0.0)),
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;
    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

fn word_to_token(word: String) -> Token {
    match word.as_str() {
        "true" => Token::Boolean(true),
        "false" => Token::Boolean(false),
        "null" => Token::Null,
        _ => Token::Keyword(word),
    }
}

pub(crate) fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b'\x00' | b'\x09' | b'\x0a' | b'\x0c' | b'\x0d' | b' ')
}

fn is_delim(byte: u8) -> bool {
    matches!(
        byte,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn is_regular(byte: u8) -> bool {
    !(is_delim(byte) || is_whitespace(byte))
}

fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_of_numbers() {
        let mut lexer = Lexer::new(b"[1 -2.5 .5]");
        assert_eq!(lexer.next(), Some(Token::ArrayStart));
        assert_eq!(lexer.next(), Some(Token::Integer(1)));
        assert_eq!(lexer.next(), Some(Token::Real(-2.5)));
        assert_eq!(lexer.next(), Some(Token::Real(0.5)));
        assert_eq!(lexer.next(), Some(Token::ArrayEnd));
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_operator_keywords() {
        let mut lexer = Lexer::new(b"/F1 12 Tf T* ' \"");
        assert_eq!(lexer.next(), Some(Token::Name("F1".to_string())));
        assert_eq!(lexer.next(), Some(Token::Integer(12)));
        assert_eq!(lexer.next(), Some(Token::Keyword("Tf".to_string())));
        assert_eq!(lexer.next(), Some(Token::Keyword("T*".to_string())));
        assert_eq!(lexer.next(), Some(Token::Keyword("'".to_string())));
        assert_eq!(lexer.next(), Some(Token::Keyword("\"".to_string())));
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_literal_string_escapes() {
        let mut lexer = Lexer::new(b"(a\\(b\\) \\101 (nested))");
        assert_eq!(
            lexer.next(),
            Some(Token::String(b"a(b) A (nested)".to_vec()))
        );
    }

    #[test]
    fn test_hex_string_odd_nibbles_pad_low_nibble() {
        let mut lexer = Lexer::new(b"<4E6F7>");
        assert_eq!(lexer.next(), Some(Token::HexString(vec![0x4E, 0x6F, 0x70])));
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_comments_are_skipped() {
        let mut lexer = Lexer::new(b"% header\nBT % trailing\nET");
        assert_eq!(lexer.next(), Some(Token::Keyword("BT".to_string())));
        assert_eq!(lexer.next(), Some(Token::Keyword("ET".to_string())));
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn take_inline_image_stops_after_terminator() {
        let input = b"BI /W 1 /H 1 ID \xffEI\x00 EI Q";
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next(), Some(Token::Keyword("BI".to_string())));
        let raw = lexer.take_inline_image();
        assert_eq!(raw, b"/W 1 /H 1 ID \xffEI\x00 EI".to_vec());
        assert_eq!(lexer.next(), Some(Token::Keyword("Q".to_string())));
    }
}
