use serde::Deserialize;
use thiserror::Error;

/// Which entry the reorderer drops when it overflows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvictionPolicy {
    /// Drop the oldest sequence number; keeps the newest arrivals.
    #[default]
    SmallestSequence,
    /// Drop the newest sequence number; keeps delivery order intact.
    LargestSequence,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{field} must be at least 1")]
    ZeroSize { field: &'static str },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReassemblyConfigInput {
    pub max_buffer_size: Option<usize>,
    pub max_packet_age_ms: Option<u64>,
    pub jitter_buffer_size: Option<usize>,
    pub jitter_release_ms: Option<u64>,
    pub enable_reordering: Option<bool>,
    pub enable_jitter_buffering: Option<bool>,
    pub eviction: Option<EvictionPolicy>,
}

/// Buffer bounds and stage switches for a [`ReassemblyPipeline`].
///
/// [`ReassemblyPipeline`]: crate::pipeline::ReassemblyPipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassemblyConfig {
    /// Reorderer capacity in packets.
    pub max_buffer_size: usize,
    /// Packets older than this on admission are rejected by either stage.
    pub max_packet_age_ms: u64,
    /// Jitter buffer capacity in packets.
    pub jitter_buffer_size: usize,
    /// Minimum dwell before a jitter-buffered packet is released.
    pub jitter_release_ms: u64,
    pub enable_reordering: bool,
    pub enable_jitter_buffering: bool,
    pub eviction: EvictionPolicy,
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        ReassemblyConfig {
            max_buffer_size: 1024,
            max_packet_age_ms: 5000,
            jitter_buffer_size: 1000,
            jitter_release_ms: 10,
            enable_reordering: true,
            enable_jitter_buffering: true,
            eviction: EvictionPolicy::SmallestSequence,
        }
    }
}

impl ReassemblyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_buffer_size == 0 {
            return Err(ConfigError::ZeroSize {
                field: "max_buffer_size",
            });
        }
        if self.jitter_buffer_size == 0 {
            return Err(ConfigError::ZeroSize {
                field: "jitter_buffer_size",
            });
        }
        Ok(())
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(ReassemblyConfig::default());
        }
        let parsed: ReassemblyConfigInput = toml::from_str(input)?;
        parsed.resolve()
    }
}

impl ReassemblyConfigInput {
    pub fn resolve(self) -> Result<ReassemblyConfig, ConfigError> {
        let defaults = ReassemblyConfig::default();
        let config = ReassemblyConfig {
            max_buffer_size: self.max_buffer_size.unwrap_or(defaults.max_buffer_size),
            max_packet_age_ms: self.max_packet_age_ms.unwrap_or(defaults.max_packet_age_ms),
            jitter_buffer_size: self
                .jitter_buffer_size
                .unwrap_or(defaults.jitter_buffer_size),
            jitter_release_ms: self.jitter_release_ms.unwrap_or(defaults.jitter_release_ms),
            enable_reordering: self.enable_reordering.unwrap_or(defaults.enable_reordering),
            enable_jitter_buffering: self
                .enable_jitter_buffering
                .unwrap_or(defaults.enable_jitter_buffering),
            eviction: self.eviction.unwrap_or(defaults.eviction),
        };
        config.validate()?;
        Ok(config)
    }
}
