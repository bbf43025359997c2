//! # sdwan-fec
//!
//! Forward error correction for overlay data paths.
//!
//! A block of bytes is split into `k` equal data shards and `m` parity
//! shards are appended. The receiver rebuilds the block from whichever
//! shards survive, as long as the codec can tolerate the loss pattern.
//!
//! ## Crate structure
//!
//! - [`gf256`] - GF(2^8) arithmetic (log/antilog tables, polynomial 0x11B)
//! - [`matrix`] - Dense matrices over GF(2^8), Cauchy generator, inversion
//! - [`shard`] - Shard and encoded-block value types
//! - [`reed_solomon`] - Systematic Reed-Solomon codec (any k of k + m)
//! - [`xor`] - XOR parity codec (single erasure)
//! - [`engine`] - Codec trait and the [`FecEngine`] facade
//! - [`assembler`] - Receive-side shard collection per block
//! - [`config`] - TOML-loadable codec parameters

pub mod assembler;
pub mod config;
pub mod engine;
pub mod error;
pub mod gf256;
pub mod matrix;
pub mod reed_solomon;
pub mod shard;
pub mod xor;

pub use assembler::{BlockDecoder, BlockDecoderStats};
pub use config::{CodecKind, FecConfig, FecConfigInput};
pub use engine::{Codec, ErasureCodec, FecEngine};
pub use error::{ConfigError, FecError};
pub use reed_solomon::ReedSolomonCodec;
pub use shard::{EncodedBlock, Shard};
pub use xor::XorCodec;
