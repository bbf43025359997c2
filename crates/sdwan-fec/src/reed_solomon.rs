//! # Reed-Solomon Codec
//!
//! Systematic Reed-Solomon erasure code over GF(2^8).
//!
//! The generator is `[I_k ; C]` where `C` is an `m x k` Cauchy matrix, so the
//! first `k` shards are the raw data and any `k` of the `n = k + m` shards
//! recover the block. Decoding inverts the `k x k` submatrix of the rows that
//! arrived and multiplies it into the received bytes.

use bytes::{Bytes, BytesMut};
use tracing::warn;

use crate::engine::ErasureCodec;
use crate::error::FecError;
use crate::gf256::mul_add_slice;
use crate::matrix::Matrix;
use crate::shard::{
    distinct_indices, join_data, shard_len_for, slot_shards, split_data, EncodedBlock, Shard,
};

#[derive(Debug, Clone)]
pub struct ReedSolomonCodec {
    data_shards: usize,
    parity_shards: usize,
    generator: Matrix,
}

impl ReedSolomonCodec {
    pub fn new(data_shards: u32, parity_shards: u32) -> Result<Self, FecError> {
        if data_shards == 0 {
            return Err(FecError::NoDataShards);
        }
        let total = data_shards.saturating_add(parity_shards);
        if total > 255 {
            return Err(FecError::TooManyShards { total });
        }
        let generator = Matrix::systematic_cauchy(data_shards as usize, parity_shards as usize)?;
        Ok(ReedSolomonCodec {
            data_shards: data_shards as usize,
            parity_shards: parity_shards as usize,
            generator,
        })
    }

    /// The `n x k` generator matrix.
    pub fn generator(&self) -> &Matrix {
        &self.generator
    }
}

impl ErasureCodec for ReedSolomonCodec {
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

        let mut shards = Vec::with_capacity(k + self.parity_shards);
        for p in 0..self.parity_shards {
            let row = self.generator.row(k + p);
            let mut parity = BytesMut::zeroed(shard_len);
            for (coeff, src) in row.iter().zip(&data_shards) {
                mul_add_slice(&mut parity, src, *coeff);
            }
            shards.push(Shard::parity((k + p) as u32, parity.freeze()));
        }

        let mut out: Vec<Shard> = data_shards
            .into_iter()
            .enumerate()
            .map(|(i, d)| Shard::data(i as u32, d))
            .collect();
        out.append(&mut shards);

        EncodedBlock {
            original_len: data.len(),
            shards: out,
        }
    }

    fn decode(&self, shards: &[Shard], original_len: usize) -> Result<Bytes, FecError> {
        let k = self.data_shards;
        let n = self.total_shards();
        let slots = slot_shards(shards, k, n, original_len)?;

        let available: Vec<usize> = (0..n).filter(|&i| slots[i].is_some()).collect();
        if available.len() < k {
            return Err(FecError::InsufficientShards {
                needed: k,
                available: available.len(),
            });
        }

        // All data shards present: the decode matrix is the identity.
        if slots[..k].iter().all(Option::is_some) {
            return Ok(join_data(slots[..k].iter().flatten().map(|b| &b[..]), original_len));
        }

        // Ascending order picks every surviving data shard before any parity.
        let chosen = &available[..k];
        let inverse = self
            .generator
            .select_rows(chosen)
            .invert()
            .inspect_err(|e| warn!(?chosen, error = %e, "reed-solomon decode matrix not invertible"))?;

        let shard_len = shard_len_for(original_len, k);
        let mut recovered: Vec<Bytes> = Vec::with_capacity(k);
        for (j, slot) in slots[..k].iter().enumerate() {
            if let Some(present) = slot {
                recovered.push((*present).clone());
                continue;
            }
            let mut buf = BytesMut::zeroed(shard_len);
            for (t, &src_idx) in chosen.iter().enumerate() {
                if let Some(src) = slots[src_idx] {
                    mul_add_slice(&mut buf, src, inverse.get(j, t));
                }
            }
            recovered.push(buf.freeze());
        }

        Ok(join_data(recovered.iter().map(|b| &b[..]), original_len))
    }

    fn can_recover(&self, received: &[u32]) -> bool {
        let seen = distinct_indices(received, self.total_shards());
        seen.iter().filter(|&&s| s).count() >= self.data_shards
    }
}
