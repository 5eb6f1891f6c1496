/// Base encoding used to split a string operand into code units before the glyph table
/// is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseEncoding {
    /// One byte per code unit, ASCII range only.
    Ascii,
    WinAnsi,
    MacRoman,
    /// Two bytes per code unit, big-endian (`Identity-H` / `Identity-V`).
    Identity,
}

impl BaseEncoding {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "WinAnsiEncoding" => Some(BaseEncoding::WinAnsi),
            "MacRomanEncoding" => Some(BaseEncoding::MacRoman),
            "Identity-H" | "Identity-V" => Some(BaseEncoding::Identity),
            "ASCII" | "StandardEncoding" => Some(BaseEncoding::Ascii),
            _ => None,
        }
    }

    pub fn code_width(self) -> usize {
        match self {
            BaseEncoding::Identity => 2,
            _ => 1,
        }
    }

    /// Splits raw operand bytes into code units. A leading U+FEFF byte-order mark in
    /// two-byte data is dropped; a dangling odd byte is padded with zero.
    pub fn code_units(self, bytes: &[u8]) -> Vec<u32> {
        match self {
            BaseEncoding::Identity => {
                let mut units: Vec<u32> = bytes
                    .chunks(2)
                    .map(|pair| {
                        let low = pair.get(1).copied().unwrap_or(0);
                        u16::from_be_bytes([pair[0], low]) as u32
                    })
                    .collect();
                if units.first() == Some(&0xFEFF) {
                    units.remove(0);
                }
                units
            }
            _ => bytes.iter().map(|&b| b as u32).collect(),
        }
    }

    pub fn write_code(self, code: u32, out: &mut Vec<u8>) {
        match self {
            BaseEncoding::Identity => out.extend_from_slice(&(code as u16).to_be_bytes()),
            _ => out.push(code as u8),
        }
    }

    /// Character the base encoding itself assigns to `code`, if any.
    pub fn char_for(self, code: u32) -> Option<char> {
        match self {
            BaseEncoding::Ascii => (code < 0x80).then(|| code as u8 as char),
            BaseEncoding::WinAnsi => table_char(&WIN_ANSI, code),
            BaseEncoding::MacRoman => table_char(&MAC_ROMAN, code),
            BaseEncoding::Identity => None,
        }
    }

    pub fn code_for(self, ch: char) -> Option<u32> {
        let table = match self {
            BaseEncoding::Ascii => return ch.is_ascii().then_some(ch as u32),
            BaseEncoding::WinAnsi => &WIN_ANSI,
            BaseEncoding::MacRoman => &MAC_ROMAN,
            BaseEncoding::Identity => return None,
        };
        table
            .iter()
            .position(|&mapped| mapped != 0 && mapped as u32 == ch as u32)
            .map(|code| code as u32)
    }
}

fn table_char(table: &[u16; 256], code: u32) -> Option<char> {
    if code > 0xFF {
        return None;
    }
    let mapped = table[code as usize];
    if mapped == 0 {
        return None;
    }
    char::from_u32(mapped as u32)
}

/// Text-string decoding used when the container already resolved the font mapping:
/// UTF-16BE behind a byte-order mark, otherwise one Latin-1 character per byte.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

pub fn encode_text_string(text: &str) -> Vec<u8> {
    if text.chars().all(|ch| (ch as u32) <= 0xFF) {
        return text.chars().map(|ch| ch as u32 as u8).collect();
    }
    let mut out = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

const WIN_ANSI: [u16; 256] = [
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0020, 0x0021, 0x0022, 0x0023,
    0x0024, 0x0025, 0x0026, 0x0027, 0x0028, 0x0029, 0x002A, 0x002B, 0x002C, 0x002D, 0x002E, 0x002F,
    0x0030, 0x0031, 0x0032, 0x0033, 0x0034, 0x0035, 0x0036, 0x0037, 0x0038, 0x0039, 0x003A, 0x003B,
    0x003C, 0x003D, 0x003E, 0x003F, 0x0040, 0x0041, 0x0042, 0x0043, 0x0044, 0x0045, 0x0046, 0x0047,
    0x0048, 0x0049, 0x004A, 0x004B, 0x004C, 0x004D, 0x004E, 0x004F, 0x0050, 0x0051, 0x0052, 0x0053,
    0x0054, 0x0055, 0x0056, 0x0057, 0x0058, 0x0059, 0x005A, 0x005B, 0x005C, 0x005D, 0x005E, 0x005F,
    0x0060, 0x0061, 0x0062, 0x0063, 0x0064, 0x0065, 0x0066, 0x0067, 0x0068, 0x0069, 0x006A, 0x006B,
    0x006C, 0x006D, 0x006E, 0x006F, 0x0070, 0x0071, 0x0072, 0x0073, 0x0074, 0x0075, 0x0076, 0x0077,
    0x0078, 0x0079, 0x007A, 0x007B, 0x007C, 0x007D, 0x007E, 0x0000, 0x20AC, 0x0000, 0x201A, 0x0192,
    0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0x0000, 0x017D, 0x0000,
    0x0000, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC, 0x2122, 0x0161, 0x203A,
    0x0153, 0x0000, 0x017E, 0x0178, 0x00A0, 0x00A1, 0x00A2, 0x00A3, 0x00A4, 0x00A5, 0x00A6, 0x00A7,
    0x00A8, 0x00A9, 0x00AA, 0x00AB, 0x00AC, 0x00AD, 0x00AE, 0x00AF, 0x00B0, 0x00B1, 0x00B2, 0x00B3,
    0x00B4, 0x00B5, 0x00B6, 0x00B7, 0x00B8, 0x00B9, 0x00BA, 0x00BB, 0x00BC, 0x00BD, 0x00BE, 0x00BF,
    0x00C0, 0x00C1, 0x00C2, 0x00C3, 0x00C4, 0x00C5, 0x00C6, 0x00C7, 0x00C8, 0x00C9, 0x00CA, 0x00CB,
    0x00CC, 0x00CD, 0x00CE, 0x00CF, 0x00D0, 0x00D1, 0x00D2, 0x00D3, 0x00D4, 0x00D5, 0x00D6, 0x00D7,
    0x00D8, 0x00D9, 0x00DA, 0x00DB, 0x00DC, 0x00DD, 0x00DE, 0x00DF, 0x00E0, 0x00E1, 0x00E2, 0x00E3,
    0x00E4, 0x00E5, 0x00E6, 0x00E7, 0x00E8, 0x00E9, 0x00EA, 0x00EB, 0x00EC, 0x00ED, 0x00EE, 0x00EF,
    0x00F0, 0x00F1, 0x00F2, 0x00F3, 0x00F4, 0x00F5, 0x00F6, 0x00F7, 0x00F8, 0x00F9, 0x00FA, 0x00FB,
    0x00FC, 0x00FD, 0x00FE, 0x00FF,
];

const MAC_ROMAN: [u16; 256] = [
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0020, 0x0021, 0x0022, 0x0023,
    0x0024, 0x0025, 0x0026, 0x0027, 0x0028, 0x0029, 0x002A, 0x002B, 0x002C, 0x002D, 0x002E, 0x002F,
    0x0030, 0x0031, 0x0032, 0x0033, 0x0034, 0x0035, 0x0036, 0x0037, 0x0038, 0x0039, 0x003A, 0x003B,
    0x003C, 0x003D, 0x003E, 0x003F, 0x0040, 0x0041, 0x0042, 0x0043, 0x0044, 0x0045, 0x0046, 0x0047,
    0x0048, 0x0049, 0x004A, 0x004B, 0x004C, 0x004D, 0x004E, 0x004F, 0x0050, 0x0051, 0x0052, 0x0053,
    0x0054, 0x0055, 0x0056, 0x0057, 0x0058, 0x0059, 0x005A, 0x005B, 0x005C, 0x005D, 0x005E, 0x005F,
    0x0060, 0x0061, 0x0062, 0x0063, 0x0064, 0x0065, 0x0066, 0x0067, 0x0068, 0x0069, 0x006A, 0x006B,
    0x006C, 0x006D, 0x006E, 0x006F, 0x0070, 0x0071, 0x0072, 0x0073, 0x0074, 0x0075, 0x0076, 0x0077,
    0x0078, 0x0079, 0x007A, 0x007B, 0x007C, 0x007D, 0x007E, 0x0000, 0x00C4, 0x00C5, 0x00C7, 0x00C9,
    0x00D1, 0x00D6, 0x00DC, 0x00E1, 0x00E0, 0x00E2, 0x00E4, 0x00E3, 0x00E5, 0x00E7, 0x00E9, 0x00E8,
    0x00EA, 0x00EB, 0x00ED, 0x00EC, 0x00EE, 0x00EF, 0x00F1, 0x00F3, 0x00F2, 0x00F4, 0x00F6, 0x00F5,
    0x00FA, 0x00F9, 0x00FB, 0x00FC, 0x2020, 0x00B0, 0x00A2, 0x00A3, 0x00A7, 0x2022, 0x00B6, 0x00DF,
    0x00AE, 0x00A9, 0x2122, 0x00B4, 0x00A8, 0x2260, 0x00C6, 0x00D8, 0x221E, 0x00B1, 0x2264, 0x2265,
    0x00A5, 0x00B5, 0x2202, 0x2211, 0x220F, 0x03C0, 0x222B, 0x00AA, 0x00BA, 0x03A9, 0x00E6, 0x00F8,
    0x00BF, 0x00A1, 0x00AC, 0x221A, 0x0192, 0x2248, 0x2206, 0x00AB, 0x00BB, 0x2026, 0x00A0, 0x00C0,
    0x00C3, 0x00D5, 0x0152, 0x0153, 0x2013, 0x2014, 0x201C, 0x201D, 0x2018, 0x2019, 0x00F7, 0x25CA,
    0x00FF, 0x0178, 0x2044, 0x20AC, 0x2039, 0x203A, 0xFB01, 0xFB02, 0x2021, 0x00B7, 0x201A, 0x201E,
    0x2030, 0x00C2, 0x00CA, 0x00C1, 0x00CB, 0x00C8, 0x00CD, 0x00CE, 0x00CF, 0x00CC, 0x00D3, 0x00D4,
    0xF8FF, 0x00D2, 0x00DA, 0x00DB, 0x00D9, 0x0131, 0x02C6, 0x02DC, 0x00AF, 0x02D8, 0x02D9, 0x02DA,
    0x00B8, 0x02DD, 0x02DB, 0x02C7,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_ansi_round_trips_typographic_quotes() {
        let code = BaseEncoding::WinAnsi.code_for('\u{2019}').expect("code for quote");
        assert_eq!(code, 0x92);
        assert_eq!(BaseEncoding::WinAnsi.char_for(code), Some('\u{2019}'));
    }

    #[test]
    fn mac_roman_differs_from_win_ansi() {
        assert_eq!(BaseEncoding::MacRoman.char_for(0xD5), Some('\u{2019}'));
        assert_eq!(BaseEncoding::WinAnsi.char_for(0xD5), Some('\u{00D5}'));
    }

    #[test]
    fn identity_strips_byte_order_mark() {
        let units = BaseEncoding::Identity.code_units(&[0xFE, 0xFF, 0x00, 0x41, 0x01, 0x02]);
        assert_eq!(units, vec![0x0041, 0x0102]);
    }

    #[test]
    fn ascii_rejects_high_bytes() {
        assert_eq!(BaseEncoding::Ascii.char_for(0x41), Some('A'));
        assert_eq!(BaseEncoding::Ascii.char_for(0xC4), None);
        assert_eq!(BaseEncoding::Ascii.code_for('\u{00C4}'), None);
    }

    #[test]
    fn text_strings_switch_to_utf16_when_needed() {
        assert_eq!(encode_text_string("abc"), b"abc".to_vec());
        let wide = encode_text_string("a\u{2014}");
        assert_eq!(wide, vec![0xFE, 0xFF, 0x00, 0x61, 0x20, 0x14]);
        assert_eq!(decode_text_string(&wide), "a\u{2014}");
        assert_eq!(decode_text_string(b"caf\xe9"), "caf\u{e9}");
    }
}
