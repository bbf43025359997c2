//! # sdwan-reassembly
//!
//! Receive-side packet reassembly for overlay data paths.
//!
//! ## Crate structure
//!
//! - [`clock`] - Monotonic millisecond timebase (quanta)
//! - [`packet`] - Packet and flow metadata
//! - [`reorder`] - Sequence-ordered bounded buffer
//! - [`jitter`] - FIFO dwell-time buffer
//! - [`stats`] - Pipeline and per-stage statistics
//! - [`device`] - Packet source/sink seam and an in-memory device
//! - [`pipeline`] - Stage orchestration
//! - [`config`] - TOML-loadable buffer bounds and stage switches

pub mod clock;
pub mod config;
pub mod device;
pub mod jitter;
pub mod packet;
pub mod pipeline;
pub mod reorder;
pub mod stats;

pub use clock::MonotonicClock;
pub use config::{ConfigError, EvictionPolicy, ReassemblyConfig, ReassemblyConfigInput};
pub use device::{DeviceError, LoopbackDevice, PacketDevice};
pub use jitter::{JitterBuffer, JitterEntry};
pub use packet::{FlowMeta, Packet};
pub use pipeline::ReassemblyPipeline;
pub use reorder::{PacketReorderer, ReorderEntry};
pub use stats::{JitterStats, ReorderStats, Statistics};
