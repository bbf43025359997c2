//! # Packet Reorderer
//!
//! Bounded buffer keyed by sequence number. `next()` always yields the
//! smallest sequence number held; it never waits for a missing predecessor.
//! Callers that need contiguous delivery can compare against
//! [`PacketReorderer::last_delivered`] and handle gaps themselves.

use std::collections::BTreeMap;

use quanta::Instant;
use tracing::{debug, trace};

use crate::clock::MonotonicClock;
use crate::config::EvictionPolicy;
use crate::packet::Packet;
use crate::stats::{ReorderStats, SmoothedMean};

/// A buffered packet and when it was inserted.
#[derive(Debug, Clone)]
pub struct ReorderEntry {
    pub packet: Packet,
    pub inserted_at: Instant,
}

pub struct PacketReorderer {
    buffer: BTreeMap<u64, ReorderEntry>,
    max_buffer_size: usize,
    max_age_ms: u64,
    eviction: EvictionPolicy,
    clock: MonotonicClock,
    highest_seen: Option<u64>,
    last_delivered: Option<u64>,
    delay: SmoothedMean,
    stats: ReorderStats,
}

impl PacketReorderer {
    pub fn new(max_buffer_size: usize, max_age_ms: u64, clock: MonotonicClock) -> Self {
        PacketReorderer {
            buffer: BTreeMap::new(),
            max_buffer_size: max_buffer_size.max(1),
            max_age_ms,
            eviction: EvictionPolicy::default(),
            clock,
            highest_seen: None,
            last_delivered: None,
            delay: SmoothedMean::with_gain(0.125),
            stats: ReorderStats::default(),
        }
    }

    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    /// Admit `packet`. Returns `false` only when it is already stale.
    ///
    /// A packet with a sequence number already held replaces the old entry.
    /// Overflow evicts one entry per the eviction policy, which may be the
    /// packet just inserted.
    pub fn add(&mut self, packet: Packet) -> bool {
        let now = self.clock.now();
        let now_ms = self.clock.as_ms(now);
        let seq = packet.sequence_number;

        if packet.is_stale(now_ms, self.max_age_ms) {
            self.stats.packets_stale += 1;
            self.stats.packets_dropped += 1;
            trace!(seq, age_ms = packet.age_ms(now_ms), "reorderer rejected stale packet");
            return false;
        }

        match self.highest_seen {
            Some(highest) if seq < highest => {
                self.stats.packets_reordered += 1;
                self.stats.max_reorder_distance = self.stats.max_reorder_distance.max(highest - seq);
            }
            _ => self.highest_seen = Some(seq),
        }

        self.buffer.insert(
            seq,
            ReorderEntry {
                packet,
                inserted_at: now,
            },
        );

        if self.buffer.len() > self.max_buffer_size {
            let evicted = match self.eviction {
                EvictionPolicy::SmallestSequence => self.buffer.pop_first(),
                EvictionPolicy::LargestSequence => self.buffer.pop_last(),
            };
            if let Some((evicted_seq, _)) = evicted {
                self.stats.packets_evicted += 1;
                self.stats.packets_dropped += 1;
                debug!(
                    seq = evicted_seq,
                    policy = ?self.eviction,
                    capacity = self.max_buffer_size,
                    "reorder buffer full, evicted packet"
                );
            }
        }
        true
    }

    /// Remove and return the packet with the smallest sequence number.
    pub fn next(&mut self) -> Option<Packet> {
        let (seq, entry) = self.buffer.pop_first()?;
        let held = self.clock.now().saturating_duration_since(entry.inserted_at);
        self.delay.observe(held.as_secs_f64() * 1000.0);
        self.last_delivered = Some(seq);
        Some(entry.packet)
    }

    /// Pop every buffered packet in ascending sequence order.
    pub fn drain(&mut self) -> Vec<Packet> {
        let mut out = Vec::with_capacity(self.buffer.len());
        while let Some(packet) = self.next() {
            out.push(packet);
        }
        out
    }

    /// Sequence number of the last packet returned by `next()`.
    pub fn last_delivered(&self) -> Option<u64> {
        self.last_delivered
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn stats(&self) -> ReorderStats {
        ReorderStats {
            average_reorder_delay_ms: self.delay.mean(),
            ..self.stats.clone()
        }
    }
}
