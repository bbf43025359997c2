//! # Jitter Buffer
//!
//! FIFO queue that holds each packet for a minimum dwell time before release,
//! smoothing out bursty arrivals. Release order is always arrival order.

use std::collections::VecDeque;
use std::time::Duration;

use quanta::Instant;
use tracing::{debug, trace};

use crate::clock::MonotonicClock;
use crate::packet::Packet;
use crate::stats::{InterarrivalJitter, JitterStats};

/// A queued packet and its arrival instant.
#[derive(Debug, Clone)]
pub struct JitterEntry {
    pub packet: Packet,
    pub arrival_time: Instant,
}

pub struct JitterBuffer {
    queue: VecDeque<JitterEntry>,
    buffer_size: usize,
    max_age_ms: u64,
    release_after: Duration,
    clock: MonotonicClock,
    jitter: InterarrivalJitter,
    stats: JitterStats,
}

impl JitterBuffer {
    pub fn new(
        buffer_size: usize,
        max_age_ms: u64,
        release_after: Duration,
        clock: MonotonicClock,
    ) -> Self {
        let buffer_size = buffer_size.max(1);
        JitterBuffer {
            queue: VecDeque::with_capacity(buffer_size.min(4096)),
            buffer_size,
            max_age_ms,
            release_after,
            clock,
            jitter: InterarrivalJitter::new(),
            stats: JitterStats::default(),
        }
    }

    /// Enqueue `packet`. Returns `false` if it was already stale on arrival.
    ///
    /// When the queue overflows the oldest entry is dropped.
    pub fn add(&mut self, packet: Packet) -> bool {
        let arrival_time = self.clock.now();
        let arrival_ms = self.clock.as_ms(arrival_time);

        if packet.is_stale(arrival_ms, self.max_age_ms) {
            self.stats.packets_stale += 1;
            self.stats.packets_dropped += 1;
            trace!(
                seq = packet.sequence_number,
                age_ms = packet.age_ms(arrival_ms),
                "jitter buffer rejected stale packet"
            );
            return false;
        }

        self.jitter.update(arrival_ms, packet.timestamp);
        self.queue.push_back(JitterEntry {
            packet,
            arrival_time,
        });
        self.stats.packets_buffered += 1;

        if self.queue.len() > self.buffer_size {
            if let Some(dropped) = self.queue.pop_front() {
                self.stats.packets_evicted += 1;
                self.stats.packets_dropped += 1;
                debug!(
                    seq = dropped.packet.sequence_number,
                    capacity = self.buffer_size,
                    "jitter buffer full, dropped oldest packet"
                );
            }
        }
        true
    }

    /// Release every packet at the front whose dwell exceeds the threshold.
    pub fn get_ready_packets(&mut self) -> Vec<Packet> {
        let now = self.clock.now();
        let mut ready = Vec::new();
        while let Some(front) = self.queue.front() {
            if now.saturating_duration_since(front.arrival_time) <= self.release_after {
                break;
            }
            if let Some(entry) = self.queue.pop_front() {
                ready.push(entry.packet);
            }
        }
        self.stats.packets_ready += ready.len() as u64;
        ready
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn stats(&self) -> JitterStats {
        JitterStats {
            average_jitter_ms: self.jitter.value(),
            max_jitter_ms: self.jitter.peak(),
            ..self.stats.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::Arc;

    fn pkt(seq: u64, ts: u64) -> Packet {
        Packet::new(seq, ts, Bytes::new())
    }

    fn buffer(size: usize) -> (JitterBuffer, Arc<quanta::Mock>) {
        let (clock, mock) = MonotonicClock::mock();
        (JitterBuffer::new(size, 5000, Duration::from_millis(10), clock), mock)
    }

    fn seqs(packets: &[Packet]) -> Vec<u64> {
        packets.iter().map(|p| p.sequence_number).collect()
    }

    #[test]
    fn holds_packets_until_dwell_exceeded() {
        let (mut jb, mock) = buffer(16);
        jb.add(pkt(1, 0));
        assert!(jb.get_ready_packets().is_empty());

        mock.increment(Duration::from_millis(10));
        assert!(jb.get_ready_packets().is_empty(), "release is strict");

        mock.increment(Duration::from_millis(1));
        assert_eq!(seqs(&jb.get_ready_packets()), vec![1]);
        assert!(jb.is_empty());
    }

    #[test]
    fn releases_in_arrival_order_and_stops_at_first_unready() {
        let (mut jb, mock) = buffer(16);
        jb.add(pkt(3, 0));
        jb.add(pkt(1, 0));
        mock.increment(Duration::from_millis(6));
        jb.add(pkt(2, 6));

        mock.increment(Duration::from_millis(6));
        assert_eq!(seqs(&jb.get_ready_packets()), vec![3, 1]);
        assert_eq!(jb.len(), 1);

        mock.increment(Duration::from_millis(6));
        assert_eq!(seqs(&jb.get_ready_packets()), vec![2]);
        assert_eq!(jb.stats().packets_ready, 3);
    }

    #[test]
    fn overflow_drops_oldest() {
        let (mut jb, mock) = buffer(2);
        for seq in 1..=3 {
            assert!(jb.add(pkt(seq, 0)));
        }
        assert_eq!(jb.len(), 2);
        let stats = jb.stats();
        assert_eq!(stats.packets_evicted, 1);
        assert_eq!(stats.packets_dropped, 1);
        assert_eq!(stats.packets_buffered, 3);

        mock.increment(Duration::from_millis(11));
        assert_eq!(seqs(&jb.get_ready_packets()), vec![2, 3]);
    }

    #[test]
    fn stale_on_arrival_rejected() {
        let (clock, mock) = MonotonicClock::mock();
        let mut jb = JitterBuffer::new(8, 100, Duration::from_millis(10), clock);
        mock.increment(Duration::from_millis(500));
        assert!(!jb.add(pkt(1, 399)));
        assert!(jb.add(pkt(2, 400)));
        let stats = jb.stats();
        assert_eq!(stats.packets_stale, 1);
        assert_eq!(stats.packets_dropped, 1);
        assert_eq!(jb.len(), 1);
    }

    #[test]
    fn jitter_estimate_tracks_transit_variation() {
        let (mut jb, mock) = buffer(64);
        // Steady 5 ms transit: no jitter.
        for i in 0..4u64 {
            mock.increment(Duration::from_millis(20));
            jb.add(pkt(i, (i + 1) * 20 - 5));
        }
        assert_eq!(jb.stats().average_jitter_ms, 0.0);

        // One packet delayed by an extra 32 ms.
        mock.increment(Duration::from_millis(52));
        jb.add(pkt(4, 95));
        let stats = jb.stats();
        assert!((stats.average_jitter_ms - 2.0).abs() < 1e-9);
        assert!((stats.max_jitter_ms - 2.0).abs() < 1e-9);
    }
}
