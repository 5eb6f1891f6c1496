use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cmap::parse_to_unicode;
use crate::encoding::BaseEncoding;
use crate::engine::EngineOptions;
use crate::font::{EncodingMode, FontMap, FontSet};
use crate::instruction::HeuristicSpacing;
use crate::normalize::NormalizeOptions;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("font {font}: glyph code {key:?} is not a decimal or 0x-prefixed hex number")]
    InvalidGlyphCode { font: String, key: String },

    #[error("font {font}: unknown base encoding {name:?}")]
    UnknownEncoding { font: String, name: String },

    #[error("font {0}: named mode needs an `encoding`")]
    MissingEncoding(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontMode {
    Direct,
    ByteTable,
    Named,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Defaults to `direct`, or to what the ToUnicode CMap implies when one is given.
    pub mode: Option<FontMode>,
    pub encoding: Option<String>,
    pub halfspace: Option<f64>,
    pub to_unicode: Option<PathBuf>,
    pub glyphs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub spacing: HeuristicSpacing,
    pub normalize: NormalizeOptions,
    pub fonts: BTreeMap<String, FontConfig>,
}

impl Config {
    pub fn parse(data: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(data)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&data)?;
        debug!("config: loaded {} font(s) from {}", config.fonts.len(), path.display());
        Ok(config)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            spacing: self.spacing,
            normalize: self.normalize,
            report_only: false,
        }
    }

    /// Builds the font set. Relative `to_unicode` paths resolve against `base_dir`.
    pub fn font_set(&self, base_dir: &Path) -> Result<FontSet, ConfigError> {
        self.fonts
            .iter()
            .map(|(name, font)| font.build(name, base_dir))
            .collect()
    }
}

impl FontConfig {
    fn glyph_table(&self, font: &str) -> Result<Vec<(u32, String)>, ConfigError> {
        self.glyphs
            .iter()
            .map(|(key, text)| {
                parse_code(key)
                    .map(|code| (code, text.clone()))
                    .ok_or_else(|| ConfigError::InvalidGlyphCode {
                        font: font.to_string(),
                        key: key.clone(),
                    })
            })
            .collect()
    }

    fn base_encoding(&self, font: &str) -> Result<BaseEncoding, ConfigError> {
        let Some(name) = self.encoding.as_deref() else {
            return Err(ConfigError::MissingEncoding(font.to_string()));
        };
        BaseEncoding::from_name(name).ok_or_else(|| ConfigError::UnknownEncoding {
            font: font.to_string(),
            name: name.to_string(),
        })
    }

    pub fn build(&self, name: &str, base_dir: &Path) -> Result<FontMap, ConfigError> {
        let cmap = match &self.to_unicode {
            Some(path) => {
                let path = base_dir.join(path);
                let data = std::fs::read(&path).map_err(|source| ConfigError::Io { path, source })?;
                Some(parse_to_unicode(&data))
            }
            None => None,
        };

        let mut font = match (self.mode, &cmap) {
            (None, Some(cmap)) => FontMap::from_to_unicode(name, cmap),
            (None | Some(FontMode::Direct), _) => FontMap::new(name, EncodingMode::Direct),
            (Some(FontMode::ByteTable), _) => FontMap::new(name, EncodingMode::ByteTable),
            (Some(FontMode::Named), _) => {
                FontMap::new(name, EncodingMode::Named(self.base_encoding(name)?))
            }
        };
        if self.mode.is_some()
            && let Some(cmap) = cmap
        {
            font = font.with_glyphs(cmap.map);
        }
        font = font.with_glyphs(self.glyph_table(name)?);
        if let Some(halfspace) = self.halfspace {
            font = font.with_halfspace(halfspace);
        }
        Ok(font)
    }
}

fn parse_code(key: &str) -> Option<u32> {
    let key = key.trim();
    match key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => key.parse().ok(),
    }
}
