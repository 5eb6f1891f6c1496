#![allow(dead_code)]

use retext::encoding::BaseEncoding;
use retext::engine::{BlockOutcome, Engine, EngineOptions, Replacement};
use retext::font::{EncodingMode, FontMap, FontSet};

/// Subsetted CID font: glyph ids 1.. spell the characters of `SUBSET_CHARS`. No space glyph.
pub const SUBSET_CHARS: &str = "Helowrd";

pub fn direct_font(name: &str) -> FontMap {
    FontMap::new(name, EncodingMode::Direct)
}

pub fn subset_font(name: &str) -> FontMap {
    FontMap::new(name, EncodingMode::Named(BaseEncoding::Identity)).with_glyphs(
        SUBSET_CHARS
            .chars()
            .enumerate()
            .map(|(i, ch)| (i as u32 + 1, ch.to_string())),
    )
}

/// Hex string operand body for `text` under `subset_font`.
pub fn subset_hex(text: &str) -> String {
    text.chars()
        .map(|ch| {
            let id = SUBSET_CHARS.chars().position(|c| c == ch).map_or(0, |i| i + 1);
            format!("{id:04X}")
        })
        .collect()
}

pub fn fonts() -> FontSet {
    [direct_font("F1"), subset_font("F2")].into_iter().collect()
}

pub fn engine(pattern: &str, replacement: &str) -> Engine {
    Engine::new(
        pattern,
        Replacement::Literal(replacement.to_string()),
        EngineOptions::default(),
    )
    .expect("valid pattern")
}

pub fn replace(input: &[u8], pattern: &str, replacement: &str) -> BlockOutcome {
    engine(pattern, replacement)
        .process(&fonts(), input)
        .expect("content processes")
}

pub fn output_text(outcome: &BlockOutcome) -> String {
    String::from_utf8(outcome.output.clone().expect("rewritten output")).expect("utf-8 output")
}

/// Projected text of `data` under the shared fonts.
pub fn projected(data: &[u8]) -> String {
    engine("$^", "")
        .process(&fonts(), data)
        .expect("content processes")
        .text
}
