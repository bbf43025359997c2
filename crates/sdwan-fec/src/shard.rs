//! Shard value types shared by both codecs.

use bytes::{Bytes, BytesMut};

use crate::error::FecError;

/// One fixed-size chunk of an erasure-coded block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    /// Position in the block: `0..k` are data shards, `k..n` parity.
    pub index: u32,
    pub data: Bytes,
    pub is_parity: bool,
}

impl Shard {
    pub fn data(index: u32, data: Bytes) -> Self {
        Shard {
            index,
            data,
            is_parity: false,
        }
    }

    pub fn parity(index: u32, data: Bytes) -> Self {
        Shard {
            index,
            data,
            is_parity: true,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The output of one `encode` call.
///
/// Every shard has the same length. `original_len` must travel with the shard
/// set so decode can strip the zero padding of the last data shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBlock {
    pub original_len: usize,
    pub shards: Vec<Shard>,
}

impl EncodedBlock {
    /// Length of each shard in the block.
    pub fn shard_len(&self) -> usize {
        self.shards.first().map(Shard::len).unwrap_or(0)
    }

    /// Shards whose index is in `keep`, in block order.
    pub fn select(&self, keep: &[u32]) -> Vec<Shard> {
        self.shards
            .iter()
            .filter(|s| keep.contains(&s.index))
            .cloned()
            .collect()
    }
}

/// `ceil(len / k)`, the per-shard length for `len` bytes over `k` data shards.
pub(crate) fn shard_len_for(len: usize, k: usize) -> usize {
    len.div_ceil(k)
}

/// Split `data` into `k` zero-padded shards of `shard_len` bytes each.
pub(crate) fn split_data(data: &[u8], k: usize, shard_len: usize) -> Vec<Bytes> {
    (0..k)
        .map(|i| {
            let start = (i * shard_len).min(data.len());
            let end = (start + shard_len).min(data.len());
            let mut buf = BytesMut::zeroed(shard_len);
            buf[..end - start].copy_from_slice(&data[start..end]);
            buf.freeze()
        })
        .collect()
}

/// Concatenate data shards and drop trailing padding past `original_len`.
pub(crate) fn join_data<'a, I>(shards: I, original_len: usize) -> Bytes
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut out = BytesMut::with_capacity(original_len);
    for shard in shards {
        let remaining = original_len - out.len();
        if remaining == 0 {
            break;
        }
        out.extend_from_slice(&shard[..shard.len().min(remaining)]);
    }
    out.freeze()
}

/// Place received shards into their block slots.
///
/// Duplicate indices keep the first copy. Every shard must carry exactly
/// `shard_len_for(original_len, k)` bytes.
pub(crate) fn slot_shards(
    shards: &[Shard],
    k: usize,
    n: usize,
    original_len: usize,
) -> Result<Vec<Option<&Bytes>>, FecError> {
    let expected = shard_len_for(original_len, k);
    let mut slots: Vec<Option<&Bytes>> = vec![None; n];
    for shard in shards {
        let idx = shard.index as usize;
        if idx >= n {
            return Err(FecError::ShardIndexOutOfRange {
                index: shard.index,
                total: n as u32,
            });
        }
        if shard.data.len() != expected {
            return Err(FecError::ShardSizeMismatch {
                expected,
                actual: shard.data.len(),
            });
        }
        if slots[idx].is_none() {
            slots[idx] = Some(&shard.data);
        }
    }
    Ok(slots)
}

/// Distinct in-range indices in `received`.
pub(crate) fn distinct_indices(received: &[u32], n: usize) -> Vec<bool> {
    let mut seen = vec![false; n];
    for &i in received {
        if let Some(slot) = seen.get_mut(i as usize) {
            *slot = true;
        }
    }
    seen
}
