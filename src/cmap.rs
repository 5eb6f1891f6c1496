use std::collections::HashMap;

/// Code-to-text table read from a ToUnicode CMap, plus the widest code length seen in
/// its codespace ranges (1 for single-byte fonts, 2 for CID fonts).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToUnicode {
    pub code_width: usize,
    pub map: HashMap<u32, String>,
}

pub fn parse_to_unicode(data: &[u8]) -> ToUnicode {
    let mut tokens = CMapTokenizer::new(data);
    let mut code_width = 0usize;
    let mut map = HashMap::new();
    while let Some(tok) = tokens.next() {
        match tok.as_str() {
            "begincodespacerange" => {
                while let Some(t) = tokens.next() {
                    if t == "endcodespacerange" {
                        break;
                    }
                    let start = parse_hex_token(&t);
                    let end = parse_hex_token(tokens.next().as_deref().unwrap_or(""));
                    if !start.is_empty() && start.len() == end.len() {
                        code_width = code_width.max(start.len());
                    }
                }
            }
            "beginbfchar" => {
                while let Some(t) = tokens.next() {
                    if t == "endbfchar" {
                        break;
                    }
                    let src = parse_hex_token(&t);
                    let dst = parse_hex_token(tokens.next().as_deref().unwrap_or(""));
                    if let Some(s) = utf16be_to_string(&dst) {
                        map.insert(bytes_to_u32(&src), s);
                    }
                }
            }
            "beginbfrange" => {
                while let Some(t) = tokens.next() {
                    if t == "endbfrange" {
                        break;
                    }
                    let lo = parse_hex_token(&t);
                    let start = bytes_to_u32(&lo);
                    let end = bytes_to_u32(&parse_hex_token(tokens.next().as_deref().unwrap_or("")))
                        .min(range_limit(start, code_width.max(lo.len())));
                    let next = tokens.next().unwrap_or_default();
                    if next.starts_with('[') {
                        read_range_array(&mut tokens, next, start, end, &mut map);
                    } else if let Some(s) = utf16be_to_string(&parse_hex_token(&next)) {
                        read_range_increment(&s, start, end, &mut map);
                    }
                }
            }
            _ => {}
        }
    }

    ToUnicode {
        code_width: code_width.max(1),
        map,
    }
}

fn read_range_array(
    tokens: &mut CMapTokenizer<'_>,
    first: String,
    start: u32,
    end: u32,
    map: &mut HashMap<u32, String>,
) {
    let mut code = Some(start);
    let mut cur = first.trim_start_matches('[').trim().to_string();
    loop {
        let closing = cur.ends_with(']');
        let inner = cur.trim_end_matches(']');
        if !inner.is_empty() {
            if let Some(c) = code.filter(|&c| c <= end)
                && let Some(s) = utf16be_to_string(&parse_hex_token(inner))
            {
                map.insert(c, s);
            }
            code = code.and_then(|c| c.checked_add(1));
        }
        if closing {
            break;
        }
        match tokens.next() {
            Some(t) => cur = t,
            None => break,
        }
    }
}

/// `<lo> <hi> <dst>` ranges increment the last UTF-16 unit of `dst` per code.
fn read_range_increment(dst: &str, start: u32, end: u32, map: &mut HashMap<u32, String>) {
    let mut chars: Vec<char> = dst.chars().collect();
    let Some(last) = chars.pop() else {
        return;
    };
    let prefix: String = chars.into_iter().collect();
    for (code, base) in (start..=end).zip(last as u32..=char::MAX as u32) {
        if let Some(ch) = char::from_u32(base) {
            map.insert(code, format!("{prefix}{ch}"));
        }
    }
}

/// Highest code a range starting at `start` may reach: the top of a `width`-byte
/// codespace, and never more than 65536 codes past `start`.
fn range_limit(start: u32, width: usize) -> u32 {
    let top = match width {
        0 | 1 => 0xFF,
        2 => 0xFFFF,
        3 => 0xFF_FFFF,
        _ => u32::MAX,
    };
    top.min(start.saturating_add(0xFFFF))
}

fn parse_hex_token(token: &str) -> Vec<u8> {
    let t = token.trim();
    let Some(inner) = t.strip_prefix('<').and_then(|t| t.strip_suffix('>')) else {
        return Vec::new();
    };
    let digits: Vec<u8> = inner
        .bytes()
        .filter_map(|b| (b as char).to_digit(16).map(|d| d as u8))
        .collect();
    digits
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

fn bytes_to_u32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |v, &b| (v << 8) | b as u32)
}

fn utf16be_to_string(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() || bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

struct CMapTokenizer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> CMapTokenizer<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn next(&mut self) -> Option<String> {
        while self.pos < self.data.len() && self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= self.data.len() {
            return None;
        }
        let start = self.pos;
        match self.data[self.pos] {
            b'<' => {
                while self.pos < self.data.len() && self.data[self.pos] != b'>' {
                    self.pos += 1;
                }
                self.pos = (self.pos + 1).min(self.data.len());
            }
            b'[' => self.pos += 1,
            b']' => self.pos += 1,
            _ => {
                while self.pos < self.data.len()
                    && !self.data[self.pos].is_ascii_whitespace()
                    && !matches!(self.data[self.pos], b'[' | b']' | b'<')
                {
                    self.pos += 1;
                }
            }
        }
        Some(String::from_utf8_lossy(&self.data[start..self.pos]).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0011> <00660069>
endbfchar
2 beginbfrange
<0024> <0026> <0041>
<0030> <0031> [<0078> <0079>]
endbfrange
endcmap";

    #[test]
    fn reads_chars_and_ranges() {
        let cmap = parse_to_unicode(SAMPLE);
        assert_eq!(cmap.code_width, 2);
        assert_eq!(cmap.map.get(&0x0003).map(String::as_str), Some(" "));
        assert_eq!(cmap.map.get(&0x0011).map(String::as_str), Some("fi"));
        assert_eq!(cmap.map.get(&0x0024).map(String::as_str), Some("A"));
        assert_eq!(cmap.map.get(&0x0026).map(String::as_str), Some("C"));
        assert_eq!(cmap.map.get(&0x0030).map(String::as_str), Some("x"));
        assert_eq!(cmap.map.get(&0x0031).map(String::as_str), Some("y"));
        assert_eq!(cmap.map.len(), 7);
    }

    #[test]
    fn single_byte_codespace_is_default() {
        let cmap = parse_to_unicode(b"1 beginbfchar <41> <0061> endbfchar");
        assert_eq!(cmap.code_width, 1);
        assert_eq!(cmap.map.get(&0x41).map(String::as_str), Some("a"));
    }

    #[test]
    fn ranges_stop_at_the_codespace_edge() {
        let cmap = parse_to_unicode(
            b"1 begincodespacerange <00> <FF> endcodespacerange
2 beginbfrange
<FE> <FFFFFFFF> <0041>
<FF> <FFFFFFFF> [<0061> <0062>]
endbfrange",
        );
        assert_eq!(cmap.map.get(&0xFE).map(String::as_str), Some("A"));
        assert_eq!(cmap.map.get(&0xFF).map(String::as_str), Some("a"));
        assert_eq!(cmap.map.len(), 2);
    }

    #[test]
    fn ranges_at_the_top_of_the_code_space_do_not_overflow() {
        let cmap = parse_to_unicode(
            b"1 beginbfrange
<FFFFFFFE> <FFFFFFFF> [<0061> <0062> <0063>]
<FFFFFFF0> <FFFFFFFF> <DBFFDFFE>
endbfrange",
        );
        assert_eq!(cmap.map.get(&0xFFFF_FFFE).map(String::as_str), Some("a"));
        assert_eq!(cmap.map.get(&0xFFFF_FFFF).map(String::as_str), Some("b"));
        assert_eq!(cmap.map.get(&0xFFFF_FFF0).map(String::as_str), Some("\u{10FFFE}"));
        assert_eq!(cmap.map.get(&0xFFFF_FFF1).map(String::as_str), Some("\u{10FFFF}"));
        assert_eq!(cmap.map.len(), 4);
    }
}
