//! # XOR Parity Codec
//!
//! Cheap single-erasure protection. Every parity shard is the byte-wise XOR
//! of all `k` data shards, so the codec repairs at most one missing data
//! shard no matter how many parity shards are configured. Parity shards past
//! the first are identical copies; they only make the single repair survive
//! the loss of a parity shard.

use bytes::{Bytes, BytesMut};

use crate::engine::ErasureCodec;
use crate::error::FecError;
use crate::shard::{
    distinct_indices, join_data, shard_len_for, slot_shards, split_data, EncodedBlock, Shard,
};

#[derive(Debug, Clone)]
pub struct XorCodec {
    data_shards: usize,
    parity_shards: usize,
}

impl XorCodec {
    pub fn new(data_shards: u32, parity_shards: u32) -> Result<Self, FecError> {
        if data_shards == 0 {
            return Err(FecError::NoDataShards);
        }
        let total = data_shards.saturating_add(parity_shards);
        if total > 255 {
            return Err(FecError::TooManyShards { total });
        }
        Ok(XorCodec {
            data_shards: data_shards as usize,
            parity_shards: parity_shards as usize,
        })
    }
}

fn xor_into(dst: &mut [u8], src: &[u8]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

impl ErasureCodec for XorCodec {
    fn data_shards(&self) -> usize {
        self.data_shards
    }

    fn parity_shards(&self) -> usize {
        self.parity_shards
    }

    fn encode(&self, data: &[u8]) -> EncodedBlock {
        let k = self.data_shards;
        let shard_len = shard_len_for(data.len(), k);
        let data_shards = split_data(data, k, shard_len);

        let mut parity = BytesMut::zeroed(shard_len);
        for d in &data_shards {
            xor_into(&mut parity, d);
        }
        let parity = parity.freeze();

        let mut shards: Vec<Shard> = data_shards
            .into_iter()
            .enumerate()
            .map(|(i, d)| Shard::data(i as u32, d))
            .collect();
        // Bytes clones share one buffer.
        shards.extend((0..self.parity_shards).map(|p| Shard::parity((k + p) as u32, parity.clone())));

        EncodedBlock {
            original_len: data.len(),
            shards,
        }
    }

    fn decode(&self, shards: &[Shard], original_len: usize) -> Result<Bytes, FecError> {
        let k = self.data_shards;
        let n = self.total_shards();
        let slots = slot_shards(shards, k, n, original_len)?;

        let missing: Vec<usize> = (0..k).filter(|&i| slots[i].is_none()).collect();
        let parity = slots[k..].iter().flatten().next();

        match (missing.as_slice(), parity) {
            ([], _) => Ok(join_data(slots[..k].iter().flatten().map(|b| &b[..]), original_len)),
            (&[lost], Some(parity)) => {
                let mut rebuilt = BytesMut::from(&parity[..]);
                for d in slots[..k].iter().flatten() {
                    xor_into(&mut rebuilt, d);
                }
                let rebuilt = rebuilt.freeze();
                let data = (0..k).map(|i| match slots[i] {
                    Some(b) => &b[..],
                    None if i == lost => &rebuilt[..],
                    None => &[][..],
                });
                Ok(join_data(data, original_len))
            }
            _ => {
                let available = slots.iter().filter(|s| s.is_some()).count();
                Err(FecError::InsufficientShards {
                    needed: k,
                    available,
                })
            }
        }
    }

    fn can_recover(&self, received: &[u32]) -> bool {
        let k = self.data_shards;
        let seen = distinct_indices(received, self.total_shards());
        let data = seen[..k].iter().filter(|&&s| s).count();
        let parity = seen[k..].iter().filter(|&&s| s).count();
        data == k || (data + 1 == k && parity > 0)
    }
}
