use thiserror::Error;

/// Errors raised by codec construction and decoding.
///
/// Configuration errors surface from constructors; codec errors surface from
/// `decode`. Nothing here is retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FecError {
    #[error("unsupported codec: {0:?}")]
    UnsupportedCodec(String),
    #[error("data_shards must be at least 1")]
    NoDataShards,
    #[error("data_shards + parity_shards = {total} exceeds the GF(256) limit of 255")]
    TooManyShards { total: u32 },
    #[error("block_size must be at least 1")]
    ZeroBlockSize,
    #[error("insufficient shards: need {needed}, have {available}")]
    InsufficientShards { needed: usize, available: usize },
    #[error("matrix dimension mismatch: {lhs_cols} columns against {rhs_rows} rows")]
    DimensionMismatch { lhs_cols: usize, rhs_rows: usize },
    #[error("decode matrix is singular")]
    SingularMatrix,
    #[error("division by zero in GF(256)")]
    DivisionByZero,
    #[error("shard index {index} out of range for {total} shards")]
    ShardIndexOutOfRange { index: u32, total: u32 },
    #[error("shard length {actual} does not match block shard length {expected}")]
    ShardSizeMismatch { expected: usize, actual: usize },
}

/// Errors raised while loading an FEC configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] FecError),
}
