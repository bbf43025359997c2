use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ConfigError, FecError};

/// Erasure codec variant.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecKind {
    #[default]
    ReedSolomon,
    Xor,
}

impl FromStr for CodecKind {
    type Err = FecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reed-solomon" | "reed_solomon" | "rs" => Ok(CodecKind::ReedSolomon),
            "xor" => Ok(CodecKind::Xor),
            other => Err(FecError::UnsupportedCodec(other.to_string())),
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecKind::ReedSolomon => f.write_str("reed-solomon"),
            CodecKind::Xor => f.write_str("xor"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FecConfigInput {
    pub codec: Option<String>,
    pub data_shards: Option<u32>,
    pub parity_shards: Option<u32>,
    pub block_size: Option<u32>,
}

/// Immutable codec parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FecConfig {
    pub codec: CodecKind,
    /// k, at least 1.
    pub data_shards: u32,
    /// m; k + m must fit in GF(256).
    pub parity_shards: u32,
    /// Chunk size used by `FecEngine::encode_blocks`.
    pub block_size: u32,
}

impl Default for FecConfig {
    fn default() -> Self {
        FecConfig {
            codec: CodecKind::ReedSolomon,
            data_shards: 4,
            parity_shards: 2,
            block_size: 4096,
        }
    }
}

impl FecConfig {
    pub fn validate(&self) -> Result<(), FecError> {
        if self.data_shards == 0 {
            return Err(FecError::NoDataShards);
        }
        let total = self.data_shards.saturating_add(self.parity_shards);
        if total > 255 {
            return Err(FecError::TooManyShards { total });
        }
        if self.block_size == 0 {
            return Err(FecError::ZeroBlockSize);
        }
        Ok(())
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(FecConfig::default());
        }
        let parsed: FecConfigInput = toml::from_str(input)?;
        Ok(parsed.resolve()?)
    }
}

impl FecConfigInput {
    pub fn resolve(self) -> Result<FecConfig, FecError> {
        let defaults = FecConfig::default();
        let codec = match self.codec {
            Some(name) => name.parse()?,
            None => defaults.codec,
        };
        let config = FecConfig {
            codec,
            data_shards: self.data_shards.unwrap_or(defaults.data_shards),
            parity_shards: self.parity_shards.unwrap_or(defaults.parity_shards),
            block_size: self.block_size.unwrap_or(defaults.block_size),
        };
        config.validate()?;
        Ok(config)
    }
}
