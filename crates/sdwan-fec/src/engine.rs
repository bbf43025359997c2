//! # FEC Engine
//!
//! Facade over the two codecs. The codec is chosen once from [`FecConfig`]
//! and every call is a single `match` on the closed [`Codec`] enum.

use bytes::Bytes;
use tracing::debug;

use crate::config::{CodecKind, FecConfig};
use crate::error::FecError;
use crate::reed_solomon::ReedSolomonCodec;
use crate::shard::{EncodedBlock, Shard};
use crate::xor::XorCodec;

/// Capability set shared by every erasure codec.
pub trait ErasureCodec {
    /// Number of data shards per block (k).
    fn data_shards(&self) -> usize;

    /// Number of parity shards per block (m).
    fn parity_shards(&self) -> usize;

    /// Split `data` into `k` padded data shards and append `m` parity shards.
    fn encode(&self, data: &[u8]) -> EncodedBlock;

    /// Rebuild the first `original_len` bytes from whichever shards arrived.
    fn decode(&self, shards: &[Shard], original_len: usize) -> Result<Bytes, FecError>;

    /// Whether `decode` succeeds given shards with these indices.
    fn can_recover(&self, received: &[u32]) -> bool;

    fn total_shards(&self) -> usize {
        self.data_shards() + self.parity_shards()
    }

    /// Bandwidth overhead: m / k.
    fn overhead(&self) -> f64 {
        self.parity_shards() as f64 / self.data_shards() as f64
    }
}

/// The closed set of codec variants.
#[derive(Debug, Clone)]
pub enum Codec {
    ReedSolomon(ReedSolomonCodec),
    Xor(XorCodec),
}

impl Codec {
    pub fn kind(&self) -> CodecKind {
        match self {
            Codec::ReedSolomon(_) => CodecKind::ReedSolomon,
            Codec::Xor(_) => CodecKind::Xor,
        }
    }
}

/// Uniform entry point for encoding and decoding.
#[derive(Debug, Clone)]
pub struct FecEngine {
    config: FecConfig,
    codec: Codec,
}

impl FecEngine {
    pub fn new(config: FecConfig) -> Result<Self, FecError> {
        config.validate()?;
        let codec = match config.codec {
            CodecKind::ReedSolomon => Codec::ReedSolomon(ReedSolomonCodec::new(
                config.data_shards,
                config.parity_shards,
            )?),
            CodecKind::Xor => Codec::Xor(XorCodec::new(config.data_shards, config.parity_shards)?),
        };
        debug!(
            codec = ?config.codec,
            k = config.data_shards,
            m = config.parity_shards,
            "fec engine ready"
        );
        Ok(FecEngine { config, codec })
    }

    pub fn config(&self) -> &FecConfig {
        &self.config
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    fn inner(&self) -> &dyn ErasureCodec {
        match &self.codec {
            Codec::ReedSolomon(c) => c as &dyn ErasureCodec,
            Codec::Xor(c) => c,
        }
    }

    pub fn encode(&self, data: &[u8]) -> EncodedBlock {
        self.inner().encode(data)
    }

    /// Encode arbitrary-length input as consecutive `block_size` chunks.
    pub fn encode_blocks(&self, data: &[u8]) -> Vec<EncodedBlock> {
        if data.is_empty() {
            return vec![self.encode(data)];
        }
        data.chunks(self.config.block_size as usize)
            .map(|chunk| self.encode(chunk))
            .collect()
    }

    pub fn decode(&self, shards: &[Shard], original_len: usize) -> Result<Bytes, FecError> {
        self.inner().decode(shards, original_len)
    }

    pub fn can_recover(&self, received: &[u32]) -> bool {
        self.inner().can_recover(received)
    }

    pub fn total_shards(&self) -> usize {
        self.inner().total_shards()
    }

    /// m / k, independent of the codec.
    pub fn overhead(&self) -> f64 {
        self.config.parity_shards as f64 / self.config.data_shards as f64
    }

    /// `1 - 1 / (k + m)`.
    ///
    /// A rough indicator that grows with block size. It is not derived from
    /// any loss model and should not be read as a probability of recovery.
    pub fn recovery_probability(&self) -> f64 {
        1.0 - 1.0 / (self.config.data_shards + self.config.parity_shards) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(codec: CodecKind, k: u32, m: u32) -> FecEngine {
        FecEngine::new(FecConfig {
            codec,
            data_shards: k,
            parity_shards: m,
            ..FecConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn selects_codec_from_config() {
        assert_eq!(engine(CodecKind::ReedSolomon, 4, 2).codec().kind(), CodecKind::ReedSolomon);
        assert_eq!(engine(CodecKind::Xor, 3, 1).codec().kind(), CodecKind::Xor);
    }

    #[test]
    fn overhead_and_recovery_probability() {
        let e = engine(CodecKind::ReedSolomon, 4, 2);
        assert!((e.overhead() - 0.5).abs() < 1e-9);
        assert!((e.recovery_probability() - (1.0 - 1.0 / 6.0)).abs() < 1e-9);

        let x = engine(CodecKind::Xor, 8, 1);
        assert!((x.overhead() - 0.125).abs() < 1e-9);
        assert!((x.recovery_probability() - (1.0 - 1.0 / 9.0)).abs() < 1e-9);
        assert_eq!(x.total_shards(), 9);
    }

    #[test]
    fn forwards_to_selected_codec() {
        let rs = engine(CodecKind::ReedSolomon, 4, 2);
        let block = rs.encode(&(1..=12).collect::<Vec<u8>>());
        assert!(rs.can_recover(&[1, 2, 4, 5]));
        let out = rs.decode(&block.select(&[1, 2, 4, 5]), 12).unwrap();
        assert_eq!(out.len(), 12);

        // Two missing data shards: fine for Reed-Solomon, too many for XOR.
        let xor = engine(CodecKind::Xor, 4, 2);
        let block = xor.encode(&(1..=12).collect::<Vec<u8>>());
        assert!(!xor.can_recover(&[1, 2, 4, 5]));
        assert!(xor.decode(&block.select(&[1, 2, 4, 5]), 12).is_err());
    }

    #[test]
    fn invalid_config_rejected() {
        let err = FecEngine::new(FecConfig {
            data_shards: 0,
            ..FecConfig::default()
        })
        .unwrap_err();
        assert_eq!(err, FecError::NoDataShards);

        let err = FecEngine::new(FecConfig {
            data_shards: 200,
            parity_shards: 100,
            ..FecConfig::default()
        })
        .unwrap_err();
        assert_eq!(err, FecError::TooManyShards { total: 300 });
    }

    #[test]
    fn encode_blocks_splits_by_block_size() {
        let e = FecEngine::new(FecConfig {
            block_size: 10,
            ..FecConfig::default()
        })
        .unwrap();
        let data: Vec<u8> = (0..25).collect();
        let blocks = e.encode_blocks(&data);
        assert_eq!(blocks.len(), 3);
        assert_eq!(
            blocks.iter().map(|b| b.original_len).collect::<Vec<_>>(),
            vec![10, 10, 5]
        );

        let mut out = Vec::new();
        for b in &blocks {
            let keep: Vec<u32> = (2..6).collect();
            out.extend_from_slice(&e.decode(&b.select(&keep), b.original_len).unwrap());
        }
        assert_eq!(out, data);
    }

    #[test]
    fn encode_blocks_empty_input_yields_one_empty_block() {
        let e = engine(CodecKind::Xor, 3, 1);
        let blocks = e.encode_blocks(&[]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].original_len, 0);
    }
}
