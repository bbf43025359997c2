//! # Reassembly Pipeline
//!
//! Runs received packets through the enabled stages:
//!
//! ```text
//! process_packet ──► JitterBuffer ──(ready)──► PacketReorderer ──► get_reassembled_packets
//! ```
//!
//! With both stages enabled, packets wait in the jitter buffer first; each
//! call to [`ReassemblyPipeline::get_reassembled_packets`] moves the released
//! packets into the reorderer and drains it. With a single stage enabled that
//! stage is used alone; with neither, packets pass through in arrival order.
//!
//! The pipeline is single-threaded. Callers sharing one across threads must
//! serialize access themselves.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::MonotonicClock;
use crate::config::{ConfigError, ReassemblyConfig};
use crate::device::{DeviceError, PacketDevice};
use crate::jitter::JitterBuffer;
use crate::packet::Packet;
use crate::reorder::PacketReorderer;
use crate::stats::{InterarrivalJitter, JitterStats, ReorderStats, Statistics};

pub struct ReassemblyPipeline {
    config: ReassemblyConfig,
    clock: MonotonicClock,
    jitter: Option<JitterBuffer>,
    reorderer: Option<PacketReorderer>,
    /// Used when both stages are disabled.
    passthrough: VecDeque<Packet>,
    devices: Vec<Box<dyn PacketDevice>>,
    running: bool,
    arrival_jitter: InterarrivalJitter,
    stats: Statistics,
}

impl ReassemblyPipeline {
    pub fn new(config: ReassemblyConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, MonotonicClock::new())
    }

    /// Build a pipeline whose stages all read time from `clock`.
    pub fn with_clock(config: ReassemblyConfig, clock: MonotonicClock) -> Result<Self, ConfigError> {
        config.validate()?;
        let jitter = config.enable_jitter_buffering.then(|| {
            JitterBuffer::new(
                config.jitter_buffer_size,
                config.max_packet_age_ms,
                Duration::from_millis(config.jitter_release_ms),
                clock.clone(),
            )
        });
        let reorderer = config.enable_reordering.then(|| {
            PacketReorderer::new(config.max_buffer_size, config.max_packet_age_ms, clock.clone())
                .with_eviction(config.eviction)
        });
        debug!(
            reordering = config.enable_reordering,
            jitter_buffering = config.enable_jitter_buffering,
            max_buffer_size = config.max_buffer_size,
            jitter_buffer_size = config.jitter_buffer_size,
            "reassembly pipeline created"
        );
        Ok(ReassemblyPipeline {
            config,
            clock,
            jitter,
            reorderer,
            passthrough: VecDeque::new(),
            devices: Vec::new(),
            running: false,
            arrival_jitter: InterarrivalJitter::new(),
            stats: Statistics::new(),
        })
    }

    pub fn config(&self) -> &ReassemblyConfig {
        &self.config
    }

    pub fn clock(&self) -> &MonotonicClock {
        &self.clock
    }

    // ─── Data Path ──────────────────────────────────────────────────────

    /// Admit a received packet into the first enabled stage.
    ///
    /// Returns `false` if the packet was rejected as stale. Rejections and
    /// any eviction the admission causes are counted in `packets_dropped`.
    pub fn process_packet(&mut self, packet: Packet) -> bool {
        self.stats.packets_received += 1;
        self.arrival_jitter
            .update(self.clock.now_ms(), packet.timestamp);

        match (self.jitter.as_mut(), self.reorderer.as_mut()) {
            (Some(jitter), _) => admit_jitter(jitter, packet, &mut self.stats),
            (None, Some(reorderer)) => admit_reorder(reorderer, packet, &mut self.stats),
            (None, None) => {
                self.passthrough.push_back(packet);
                true
            }
        }
    }

    /// Drain every packet that is ready for delivery.
    pub fn get_reassembled_packets(&mut self) -> Vec<Packet> {
        let out = match (self.jitter.as_mut(), self.reorderer.as_mut()) {
            (Some(jitter), Some(reorderer)) => {
                for packet in jitter.get_ready_packets() {
                    admit_reorder(reorderer, packet, &mut self.stats);
                }
                drain_reorder(reorderer, &mut self.stats)
            }
            (Some(jitter), None) => jitter.get_ready_packets(),
            (None, Some(reorderer)) => drain_reorder(reorderer, &mut self.stats),
            (None, None) => self.passthrough.drain(..).collect(),
        };
        self.stats.packets_reassembled += out.len() as u64;
        out
    }

    /// Drain and discard everything that is ready. Returns the count.
    pub fn flush_buffer(&mut self) -> usize {
        let flushed = self.get_reassembled_packets().len();
        if flushed > 0 {
            debug!(flushed, "reassembly buffer flushed");
        }
        flushed
    }

    /// Write every ready packet's payload to `sink`.
    ///
    /// Write failures are logged and skipped. Returns the number of packets
    /// written.
    pub fn deliver_ready(&mut self, sink: &mut dyn PacketDevice) -> usize {
        let mut written = 0;
        for packet in self.get_reassembled_packets() {
            match sink.write_packet(&packet.payload) {
                Ok(_) => written += 1,
                Err(e) => warn!(
                    device = sink.name(),
                    seq = packet.sequence_number,
                    error = %e,
                    "packet write failed"
                ),
            }
        }
        written
    }

    // ─── Statistics ─────────────────────────────────────────────────────

    pub fn statistics(&self) -> Statistics {
        Statistics {
            average_jitter_ms: self.arrival_jitter.value(),
            packet_loss_rate: self.stats.loss_rate(),
            ..self.stats.clone()
        }
    }

    pub fn reorder_stats(&self) -> Option<ReorderStats> {
        self.reorderer.as_ref().map(PacketReorderer::stats)
    }

    pub fn jitter_stats(&self) -> Option<JitterStats> {
        self.jitter.as_ref().map(JitterBuffer::stats)
    }

    /// Packets held across all stages.
    pub fn buffered(&self) -> usize {
        self.jitter.as_ref().map_or(0, JitterBuffer::len)
            + self.reorderer.as_ref().map_or(0, PacketReorderer::len)
            + self.passthrough.len()
    }

    // ─── Devices ────────────────────────────────────────────────────────

    pub fn attach_device(&mut self, device: Box<dyn PacketDevice>) {
        self.devices.push(device);
    }

    pub fn devices(&self) -> impl Iterator<Item = &dyn PacketDevice> + '_ {
        self.devices.iter().map(|d| d.as_ref())
    }

    /// Open every attached device.
    ///
    /// If one fails, the devices opened so far are closed again and the
    /// error is returned; the pipeline stays stopped.
    pub fn start(&mut self) -> Result<(), DeviceError> {
        if self.running {
            return Ok(());
        }
        for i in 0..self.devices.len() {
            if let Err(e) = self.devices[i].open() {
                warn!(device = self.devices[i].name(), error = %e, "device open failed");
                for opened in &mut self.devices[..i] {
                    opened.close();
                }
                return Err(e);
            }
        }
        self.running = true;
        info!(devices = self.devices.len(), "reassembly pipeline started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        for device in &mut self.devices {
            device.close();
        }
        self.running = false;
        info!(
            received = self.stats.packets_received,
            reassembled = self.stats.packets_reassembled,
            dropped = self.stats.packets_dropped,
            "reassembly pipeline stopped"
        );
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

// ─── Stage Helpers ──────────────────────────────────────────────────────────

fn admit_jitter(jitter: &mut JitterBuffer, packet: Packet, stats: &mut Statistics) -> bool {
    let before = jitter.stats().packets_dropped;
    let accepted = jitter.add(packet);
    stats.packets_dropped += jitter.stats().packets_dropped - before;
    accepted
}

fn admit_reorder(reorderer: &mut PacketReorderer, packet: Packet, stats: &mut Statistics) -> bool {
    let before = reorderer.stats().packets_dropped;
    let accepted = reorderer.add(packet);
    stats.packets_dropped += reorderer.stats().packets_dropped - before;
    accepted
}

fn drain_reorder(reorderer: &mut PacketReorderer, stats: &mut Statistics) -> Vec<Packet> {
    let out = reorderer.drain();
    stats.reordering_events += out.len() as u64;
    out
}
