use std::net::IpAddr;

use bytes::Bytes;

/// Addressing and QoS metadata carried with a packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowMeta {
    pub source: Option<IpAddr>,
    pub destination: Option<IpAddr>,
    pub source_port: u16,
    pub destination_port: u16,
    /// IP protocol number.
    pub protocol: u8,
    pub priority: u8,
}

/// A packet moving through the reassembly stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Unique per flow, assigned in send order. Gaps are possible.
    pub sequence_number: u64,
    /// Send time in milliseconds on the receiver's monotonic timebase.
    pub timestamp: u64,
    pub payload: Bytes,
    pub flow: FlowMeta,
}

impl Packet {
    pub fn new(sequence_number: u64, timestamp: u64, payload: impl Into<Bytes>) -> Self {
        Packet {
            sequence_number,
            timestamp,
            payload: payload.into(),
            flow: FlowMeta::default(),
        }
    }

    pub fn with_flow(mut self, flow: FlowMeta) -> Self {
        self.flow = flow;
        self
    }

    /// Age at `now_ms`. Timestamps in the future have age 0.
    #[inline]
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }

    #[inline]
    pub fn is_stale(&self, now_ms: u64, max_age_ms: u64) -> bool {
        self.age_ms(now_ms) > max_age_ms
    }
}
