//! # Reassembly Statistics
//!
//! Counters for the pipeline and each of its stages, plus the two smoothing
//! estimators they use. All snapshots serialize to JSON.

use serde::Serialize;

// ─── Pipeline Stats ─────────────────────────────────────────────────────────

/// Cumulative pipeline counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    /// Every packet handed to `process_packet`.
    pub packets_received: u64,
    /// Packets drained by `get_reassembled_packets` or `flush_buffer`.
    pub packets_reassembled: u64,
    /// Stale rejections plus buffer evictions in any stage.
    pub packets_dropped: u64,
    /// Packets popped from the reorderer.
    pub reordering_events: u64,
    /// RFC 3550 interarrival jitter over all received packets.
    pub average_jitter_ms: f64,
    /// `packets_dropped / packets_received`.
    pub packet_loss_rate: f64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loss_rate(&self) -> f64 {
        if self.packets_received == 0 {
            0.0
        } else {
            self.packets_dropped as f64 / self.packets_received as f64
        }
    }
}

// ─── Stage Stats ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReorderStats {
    /// Arrivals with a sequence number below the highest seen so far.
    pub packets_reordered: u64,
    /// `packets_stale + packets_evicted`.
    pub packets_dropped: u64,
    pub packets_stale: u64,
    pub packets_evicted: u64,
    /// Largest `highest_seen - seq` over late arrivals.
    pub max_reorder_distance: u64,
    /// Smoothed time between insertion and delivery.
    pub average_reorder_delay_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JitterStats {
    /// Packets admitted into the queue.
    pub packets_buffered: u64,
    /// Packets released by `get_ready_packets`.
    pub packets_ready: u64,
    /// `packets_stale + packets_evicted`.
    pub packets_dropped: u64,
    pub packets_stale: u64,
    pub packets_evicted: u64,
    pub average_jitter_ms: f64,
    /// Peak value of the jitter estimate.
    pub max_jitter_ms: f64,
}

// ─── Smoothed Mean ──────────────────────────────────────────────────────────

/// Running mean where each sample moves the estimate by `gain` of the gap.
#[derive(Debug, Clone, Copy)]
pub struct SmoothedMean {
    gain: f64,
    mean: Option<f64>,
}

impl SmoothedMean {
    /// `gain` is clamped to `[0, 1]`.
    pub fn with_gain(gain: f64) -> Self {
        SmoothedMean {
            gain: gain.clamp(0.0, 1.0),
            mean: None,
        }
    }

    pub fn observe(&mut self, sample: f64) {
        self.mean = Some(match self.mean {
            None => sample,
            Some(mean) => mean + self.gain * (sample - mean),
        });
    }

    /// 0 until the first sample.
    pub fn mean(&self) -> f64 {
        self.mean.unwrap_or(0.0)
    }
}

// ─── Interarrival Jitter ────────────────────────────────────────────────────

/// RFC 3550 §6.4.1 interarrival jitter, in milliseconds.
///
/// Transit time is `arrival_ms - timestamp`; for consecutive packets the
/// difference `D` updates the estimate by `J += (|D| - J) / 16`.
#[derive(Debug, Clone, Default)]
pub struct InterarrivalJitter {
    last_transit: Option<i128>,
    jitter: f64,
    peak: f64,
}

impl InterarrivalJitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, arrival_ms: u64, timestamp: u64) -> f64 {
        // Both operands span the full u64 range; i128 holds any difference.
        let transit = i128::from(arrival_ms) - i128::from(timestamp);
        if let Some(last) = self.last_transit {
            let d = (transit - last).unsigned_abs() as f64;
            self.jitter += (d - self.jitter) / 16.0;
            self.peak = self.peak.max(self.jitter);
        }
        self.last_transit = Some(transit);
        self.jitter
    }

    pub fn value(&self) -> f64 {
        self.jitter
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_rate_zero_when_nothing_received() {
        assert_eq!(Statistics::new().loss_rate(), 0.0);
    }

    #[test]
    fn loss_rate_is_dropped_over_received() {
        let stats = Statistics {
            packets_received: 200,
            packets_dropped: 50,
            ..Statistics::default()
        };
        assert!((stats.loss_rate() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn statistics_serialize_to_json() {
        let stats = Statistics {
            packets_received: 3,
            packets_reassembled: 2,
            packets_dropped: 1,
            reordering_events: 2,
            average_jitter_ms: 0.5,
            packet_loss_rate: 1.0 / 3.0,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["packets_received"], 3);
        assert_eq!(json["reordering_events"], 2);
        assert_eq!(json["average_jitter_ms"], 0.5);
    }

    #[test]
    fn smoothed_mean_seeded_by_first_sample() {
        let mut m = SmoothedMean::with_gain(0.125);
        assert_eq!(m.mean(), 0.0);
        m.observe(40.0);
        assert_eq!(m.mean(), 40.0);
    }

    #[test]
    fn smoothed_mean_closes_gain_fraction_of_gap() {
        let mut m = SmoothedMean::with_gain(0.25);
        m.observe(0.0);
        m.observe(80.0);
        assert!((m.mean() - 20.0).abs() < 1e-9);

        let mut frozen = SmoothedMean::with_gain(-3.0);
        frozen.observe(5.0);
        frozen.observe(500.0);
        assert_eq!(frozen.mean(), 5.0);
    }

    #[test]
    fn jitter_zero_for_constant_transit() {
        let mut j = InterarrivalJitter::new();
        for i in 0..20u64 {
            j.update(i * 20 + 5, i * 20);
        }
        assert_eq!(j.value(), 0.0);
        assert_eq!(j.peak(), 0.0);
    }

    #[test]
    fn jitter_follows_rfc3550_gain() {
        let mut j = InterarrivalJitter::new();
        // First packet only seeds the transit time.
        assert_eq!(j.update(10, 0), 0.0);
        // Transit jumps from 10 to 26: |D| = 16, J = 16 / 16 = 1.
        assert!((j.update(46, 20) - 1.0).abs() < 1e-9);
        // Back to 10: |D| = 16, J = 1 + 15 / 16.
        assert!((j.update(50, 40) - (1.0 + 15.0 / 16.0)).abs() < 1e-9);
        assert!((j.peak() - (1.0 + 15.0 / 16.0)).abs() < 1e-9);
    }

    #[test]
    fn jitter_survives_timestamps_past_i64_max() {
        let mut j = InterarrivalJitter::new();
        j.update(10, 0);
        // Transit swings by roughly 2^63 ms; the estimate must stay finite.
        let v = j.update(20, 1u64 << 63);
        assert!(v.is_finite() && v > 0.0);
        let v = j.update(u64::MAX, 0);
        assert!(v.is_finite());
        assert!(j.peak() >= v);
    }

    #[test]
    fn jitter_handles_future_timestamps() {
        let mut j = InterarrivalJitter::new();
        j.update(0, 100);
        let v = j.update(0, 116);
        assert!((v - 1.0).abs() < 1e-9);
    }
}
