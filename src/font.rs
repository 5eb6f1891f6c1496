use std::collections::{BTreeMap, HashMap};

use log::warn;

use crate::cmap::ToUnicode;
use crate::encoding::{BaseEncoding, decode_text_string, encode_text_string};
use crate::error::{Error, Result};
use crate::model::Operand;

/// Half of the 250-unit default space width, in thousandths of text space.
pub const DEFAULT_HALFSPACE: f64 = 125.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingMode {
    /// The container already produced Unicode text strings; decoding is the identity.
    Direct,
    /// Single bytes looked up in the glyph table; every code needs an entry.
    ByteTable,
    /// A named base encoding, with the glyph table acting as overrides.
    Named(BaseEncoding),
}

/// Translation between one font's code units and Unicode text.
#[derive(Debug, Clone)]
pub struct FontMap {
    name: String,
    mode: EncodingMode,
    glyphs: HashMap<u32, String>,
    halfspace: f64,
}

impl FontMap {
    pub fn new(name: impl Into<String>, mode: EncodingMode) -> Self {
        Self {
            name: name.into(),
            mode,
            glyphs: HashMap::new(),
            halfspace: DEFAULT_HALFSPACE,
        }
    }

    /// Builds a map from a parsed ToUnicode resource: two-byte CMaps use the identity
    /// base encoding, single-byte ones a byte table.
    pub fn from_to_unicode(name: impl Into<String>, cmap: &ToUnicode) -> Self {
        let mode = if cmap.code_width >= 2 {
            EncodingMode::Named(BaseEncoding::Identity)
        } else {
            EncodingMode::ByteTable
        };
        Self::new(name, mode).with_glyphs(cmap.map.clone())
    }

    pub fn with_glyphs(mut self, glyphs: impl IntoIterator<Item = (u32, String)>) -> Self {
        self.glyphs.extend(glyphs);
        self
    }

    pub fn with_halfspace(mut self, halfspace: f64) -> Self {
        self.halfspace = halfspace;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> EncodingMode {
        self.mode
    }

    pub fn halfspace(&self) -> f64 {
        self.halfspace
    }

    fn base(&self) -> BaseEncoding {
        match self.mode {
            EncodingMode::Named(base) => base,
            EncodingMode::Direct | EncodingMode::ByteTable => BaseEncoding::Ascii,
        }
    }

    fn requires_table(&self) -> bool {
        matches!(
            self.mode,
            EncodingMode::ByteTable | EncodingMode::Named(BaseEncoding::Identity)
        )
    }

    fn has_space_glyph(&self) -> bool {
        self.glyphs.values().any(|text| text == " ")
    }

    pub fn decode(&self, operand: &Operand) -> Result<String> {
        let Some(bytes) = operand.as_bytes() else {
            return Err(Error::UnsupportedRepresentation(format!(
                "operand {operand} is not a string"
            )));
        };
        if self.mode == EncodingMode::Direct {
            return Ok(decode_text_string(bytes));
        }

        let base = self.base();
        let mut out = String::new();
        for code in base.code_units(bytes) {
            if let Some(text) = self.glyphs.get(&code) {
                out.push_str(text);
                continue;
            }
            match base.char_for(code).filter(|_| !self.requires_table()) {
                Some(ch) => out.push(ch),
                None => {
                    return Err(Error::UnmappedGlyph {
                        font: self.name.clone(),
                        code,
                        operand: operand.to_string(),
                    });
                }
            }
        }
        Ok(out)
    }

    /// Encodes `text` into a string operand with the same representation as `reference`.
    pub fn encode(&self, text: &str, reference: &Operand) -> Result<Operand> {
        if self.mode == EncodingMode::Direct {
            return Ok(reference.with_bytes(encode_text_string(text)));
        }

        let base = self.base();
        let mut inverse: BTreeMap<char, u32> = BTreeMap::new();
        let mut codes: Vec<(&u32, &String)> = self.glyphs.iter().collect();
        codes.sort_unstable_by_key(|(code, _)| **code);
        for (code, value) in codes {
            let mut chars = value.chars();
            if let (Some(ch), None) = (chars.next(), chars.next()) {
                inverse.entry(ch).or_insert(*code);
            }
        }

        let mut bytes = Vec::with_capacity(text.len() * base.code_width());
        let mut dropped_spaces = 0usize;
        for ch in text.chars() {
            let code = inverse.get(&ch).copied().or_else(|| {
                if self.requires_table() {
                    return None;
                }
                base.code_for(ch)
                    .filter(|code| !self.glyphs.contains_key(code))
            });
            match code {
                Some(code) => base.write_code(code, &mut bytes),
                None if ch == ' ' && !self.has_space_glyph() => dropped_spaces += 1,
                None => {
                    return Err(Error::UnencodableCharacter {
                        ch,
                        font: self.name.clone(),
                    });
                }
            }
        }
        if dropped_spaces > 0 {
            warn!(
                "font {} has no space glyph, dropped {} space(s) from {:?}",
                self.name, dropped_spaces, text
            );
        }
        Ok(reference.with_bytes(bytes))
    }
}

/// Fonts of one page, in resource order. Shared read-only by every instruction.
#[derive(Debug, Clone, Default)]
pub struct FontSet {
    fonts: Vec<FontMap>,
}

impl FontSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `font`, replacing an earlier entry with the same name.
    pub fn insert(&mut self, font: FontMap) {
        match self.fonts.iter_mut().find(|f| f.name == font.name) {
            Some(existing) => *existing = font,
            None => self.fonts.push(font),
        }
    }

    pub fn get(&self, name: &str) -> Result<&FontMap> {
        self.fonts
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::UnknownFont(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

impl FromIterator<FontMap> for FontSet {
    fn from_iter<I: IntoIterator<Item = FontMap>>(iter: I) -> Self {
        let mut set = FontSet::new();
        for font in iter {
            set.insert(font);
        }
        set
    }
}
