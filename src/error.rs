use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("font {font} has no glyph entry for code {code:#06x} in operand {operand}")]
    UnmappedGlyph {
        font: String,
        code: u32,
        operand: String,
    },

    #[error("character {ch:?} cannot be encoded with font {font}")]
    UnencodableCharacter { ch: char, font: String },

    #[error("malformed {operator} instruction: {reason}")]
    MalformedInstruction { operator: String, reason: String },

    #[error("unsupported representation: {0}")]
    UnsupportedRepresentation(String),

    #[error("font {0:?} is not present in the page resources")]
    UnknownFont(String),

    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl Error {
    pub(crate) fn malformed(operator: &str, reason: impl Into<String>) -> Self {
        Error::MalformedInstruction {
            operator: operator.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
