pub mod cmap;
pub mod config;
pub mod container;
pub mod content;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod font;
pub mod inspect;
pub mod instruction;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod projection;
pub mod schedule;
pub mod tokenizer;

pub use engine::{BlockOutcome, Engine, EngineOptions, Replacement};
pub use error::{Error, Result};
pub use font::{FontMap, FontSet};
