//! Packet source/sink seam for the host's virtual interfaces.
//!
//! The pipeline only opens, closes and writes to devices through
//! [`PacketDevice`]. [`LoopbackDevice`] is an in-memory implementation used
//! by tests and by hosts that feed packets from elsewhere.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device {0} is not open")]
    NotOpen(String),
    #[error("failed to open device {name}: {reason}")]
    OpenFailed { name: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait PacketDevice {
    fn name(&self) -> &str;

    fn open(&mut self) -> Result<(), DeviceError>;

    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Append one frame to `buf` and return its length; `Ok(0)` means no
    /// frame is pending.
    fn read_packet(&mut self, buf: &mut BytesMut) -> Result<usize, DeviceError>;

    /// Send one frame and return the number of bytes accepted.
    fn write_packet(&mut self, packet: &[u8]) -> Result<usize, DeviceError>;
}

/// In-memory device: frames written to it can be read back in order.
#[derive(Debug)]
pub struct LoopbackDevice {
    name: String,
    open: bool,
    fail_open: Option<String>,
    frames: VecDeque<Bytes>,
}

impl LoopbackDevice {
    pub fn new(name: impl Into<String>) -> Self {
        LoopbackDevice {
            name: name.into(),
            open: false,
            fail_open: None,
            frames: VecDeque::new(),
        }
    }

    /// A device whose `open` always fails with `reason`.
    pub fn failing(name: impl Into<String>, reason: impl Into<String>) -> Self {
        LoopbackDevice {
            fail_open: Some(reason.into()),
            ..Self::new(name)
        }
    }

    /// Queue a frame for the next `read_packet`, open or not.
    pub fn inject(&mut self, frame: impl Into<Bytes>) {
        self.frames.push_back(frame.into());
    }

    /// Frames waiting to be read.
    pub fn pending(&self) -> usize {
        self.frames.len()
    }
}

impl PacketDevice for LoopbackDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        if let Some(reason) = &self.fail_open {
            return Err(DeviceError::OpenFailed {
                name: self.name.clone(),
                reason: reason.clone(),
            });
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read_packet(&mut self, buf: &mut BytesMut) -> Result<usize, DeviceError> {
        if !self.open {
            return Err(DeviceError::NotOpen(self.name.clone()));
        }
        match self.frames.pop_front() {
            Some(frame) => {
                buf.extend_from_slice(&frame);
                Ok(frame.len())
            }
            None => Ok(0),
        }
    }

    fn write_packet(&mut self, packet: &[u8]) -> Result<usize, DeviceError> {
        if !self.open {
            return Err(DeviceError::NotOpen(self.name.clone()));
        }
        self.frames.push_back(Bytes::copy_from_slice(packet));
        Ok(packet.len())
    }
}
