//! # Block Decoder
//!
//! Receive-side shard collector. Shards arrive independently and in any
//! order; the decoder groups them by block id and runs `decode` as soon as
//! the codec reports the block recoverable. Each block is decoded at most
//! once. Shards that arrive for a block already decoded are counted and
//! ignored.

use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::FecEngine;
use crate::error::FecError;
use crate::shard::Shard;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockDecoderStats {
    /// Shards accepted into a pending block.
    pub shards_received: u64,
    /// Shards for blocks already decoded, duplicates, or bad indices.
    pub shards_ignored: u64,
    pub blocks_decoded: u64,
    pub blocks_failed: u64,
    /// Incomplete blocks dropped to stay within `max_blocks`.
    pub blocks_evicted: u64,
}

#[derive(Debug)]
struct PendingBlock {
    original_len: usize,
    shards: Vec<Shard>,
    indices: Vec<u32>,
}

pub struct BlockDecoder {
    engine: FecEngine,
    blocks: HashMap<u64, PendingBlock>,
    /// Recently finished block ids, oldest first.
    retired: VecDeque<u64>,
    max_blocks: usize,
    stats: BlockDecoderStats,
}

impl BlockDecoder {
    pub fn new(engine: FecEngine, max_blocks: usize) -> Self {
        let max_blocks = max_blocks.max(1);
        BlockDecoder {
            engine,
            blocks: HashMap::new(),
            retired: VecDeque::with_capacity(max_blocks),
            max_blocks,
            stats: BlockDecoderStats::default(),
        }
    }

    /// Record a shard of `block_id`.
    ///
    /// Returns the decode result the first time the block becomes
    /// recoverable, `None` otherwise.
    pub fn add_shard(
        &mut self,
        block_id: u64,
        original_len: usize,
        shard: Shard,
    ) -> Option<Result<Bytes, FecError>> {
        if self.retired.contains(&block_id) || shard.index as usize >= self.engine.total_shards() {
            self.stats.shards_ignored += 1;
            return None;
        }

        let block = self.blocks.entry(block_id).or_insert_with(|| PendingBlock {
            original_len,
            shards: Vec::new(),
            indices: Vec::new(),
        });
        if block.indices.contains(&shard.index) {
            self.stats.shards_ignored += 1;
            return None;
        }
        block.indices.push(shard.index);
        block.shards.push(shard);
        self.stats.shards_received += 1;

        if !self.engine.can_recover(&block.indices) {
            self.enforce_limit();
            return None;
        }

        let block = self.blocks.remove(&block_id)?;
        self.retire(block_id);
        let result = self.engine.decode(&block.shards, block.original_len);
        match &result {
            Ok(_) => self.stats.blocks_decoded += 1,
            Err(e) => {
                self.stats.blocks_failed += 1;
                warn!(block_id, error = %e, "block decode failed");
            }
        }
        Some(result)
    }

    /// Drop a pending block without decoding it.
    pub fn remove_block(&mut self, block_id: u64) {
        self.blocks.remove(&block_id);
    }

    /// Number of blocks still waiting for shards.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn stats(&self) -> &BlockDecoderStats {
        &self.stats
    }

    pub fn engine(&self) -> &FecEngine {
        &self.engine
    }

    fn retire(&mut self, block_id: u64) {
        if self.retired.len() >= self.max_blocks {
            self.retired.pop_front();
        }
        self.retired.push_back(block_id);
    }

    fn enforce_limit(&mut self) {
        while self.blocks.len() > self.max_blocks {
            if let Some(&oldest) = self.blocks.keys().min() {
                self.blocks.remove(&oldest);
                self.stats.blocks_evicted += 1;
                debug!(block_id = oldest, "evicted incomplete block");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CodecKind, FecConfig};

    fn decoder(codec: CodecKind, max_blocks: usize) -> BlockDecoder {
        let engine = FecEngine::new(FecConfig {
            codec,
            data_shards: 4,
            parity_shards: 2,
            ..FecConfig::default()
        })
        .unwrap();
        BlockDecoder::new(engine, max_blocks)
    }

    #[test]
    fn decodes_once_enough_shards_arrive() {
        let mut dec = decoder(CodecKind::ReedSolomon, 8);
        let data: Vec<u8> = (1..=12).collect();
        let block = dec.engine().encode(&data);

        // Arrive out of order, with data shards 0 and 3 lost.
        for idx in [5usize, 1, 4] {
            assert!(dec.add_shard(7, 12, block.shards[idx].clone()).is_none());
        }
        let out = dec.add_shard(7, 12, block.shards[2].clone()).unwrap().unwrap();
        assert_eq!(&out[..], &data[..]);
        assert_eq!(dec.block_count(), 0);
        assert_eq!(dec.stats().blocks_decoded, 1);
    }

    #[test]
    fn late_shards_for_decoded_block_ignored() {
        let mut dec = decoder(CodecKind::ReedSolomon, 8);
        let block = dec.engine().encode(b"late arrivals");
        let len = block.original_len;
        let mut results = Vec::new();
        for shard in &block.shards {
            if let Some(r) = dec.add_shard(1, len, shard.clone()) {
                results.push(r);
            }
        }
        assert_eq!(results.len(), 1);
        assert_eq!(dec.stats().shards_ignored, 2);
        assert_eq!(dec.block_count(), 0);
    }

    #[test]
    fn duplicate_shard_does_not_complete_block() {
        let mut dec = decoder(CodecKind::Xor, 8);
        let block = dec.engine().encode(&[9; 16]);
        for _ in 0..4 {
            assert!(dec.add_shard(3, 16, block.shards[0].clone()).is_none());
        }
        assert_eq!(dec.stats().shards_received, 1);
        assert_eq!(dec.stats().shards_ignored, 3);
        assert_eq!(dec.block_count(), 1);
    }

    #[test]
    fn out_of_range_index_ignored() {
        let mut dec = decoder(CodecKind::ReedSolomon, 8);
        let shard = Shard::parity(6, Bytes::from_static(&[0; 3]));
        assert!(dec.add_shard(0, 12, shard).is_none());
        assert_eq!(dec.stats().shards_ignored, 1);
        assert_eq!(dec.block_count(), 0);
    }

    #[test]
    fn bad_shard_size_surfaces_as_error() {
        let mut dec = decoder(CodecKind::ReedSolomon, 8);
        let mut result = None;
        for i in 0..4u32 {
            result = dec.add_shard(0, 12, Shard::data(i, Bytes::from_static(&[1, 2])));
        }
        assert!(matches!(
            result,
            Some(Err(FecError::ShardSizeMismatch { expected: 3, actual: 2 }))
        ));
        assert_eq!(dec.stats().blocks_failed, 1);
    }

    #[test]
    fn block_limit_evicts_smallest_id() {
        let mut dec = decoder(CodecKind::ReedSolomon, 3);
        let block = dec.engine().encode(&[0; 8]);
        for id in 0..5u64 {
            dec.add_shard(id, 8, block.shards[0].clone());
        }
        assert_eq!(dec.block_count(), 3);
        assert_eq!(dec.stats().blocks_evicted, 2);

        // Blocks 0 and 1 were evicted; 2..5 remain and can still complete.
        let mut done = None;
        for shard in &block.shards[1..4] {
            done = dec.add_shard(4, 8, shard.clone());
        }
        assert!(matches!(done, Some(Ok(_))));
    }

    #[test]
    fn remove_block_discards_pending() {
        let mut dec = decoder(CodecKind::Xor, 8);
        let block = dec.engine().encode(&[1, 2, 3, 4]);
        dec.add_shard(42, 4, block.shards[0].clone());
        assert_eq!(dec.block_count(), 1);
        dec.remove_block(42);
        assert_eq!(dec.block_count(), 0);
    }
}
