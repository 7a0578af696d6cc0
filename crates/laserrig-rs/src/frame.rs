// crates/laserrig-rs/src/frame.rs
use crate::hal::RigError;
use crate::types::{CAN_EFF_MASK, CAN_MAX_DLC, CAN_SFF_MASK};
use core::fmt;

/// A classic CAN frame.
///
/// Only the first `len` bytes of `data` are meaningful; the rest are kept at zero.
/// Frames are plain values: a received frame has no identity beyond its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    id: u32,
    len: u8,
    data: [u8; CAN_MAX_DLC],
    extended: bool,
    remote: bool,
}

impl CanFrame {
    /// Creates a standard (11-bit) data frame.
    pub fn new(id: u16, payload: &[u8]) -> Result<Self, RigError> {
        Self::build(id as u32 & CAN_SFF_MASK, payload, false)
    }

    /// Creates an extended (29-bit) data frame.
    pub fn new_extended(id: u32, payload: &[u8]) -> Result<Self, RigError> {
        Self::build(id & CAN_EFF_MASK, payload, true)
    }

    /// Creates a remote-transmission-request frame asking for `len` bytes.
    pub fn new_remote(id: u32, len: usize, extended: bool) -> Result<Self, RigError> {
        if len > CAN_MAX_DLC {
            return Err(RigError::ProtocolError("CAN payload longer than 8 bytes"));
        }
        let mask = if extended { CAN_EFF_MASK } else { CAN_SFF_MASK };
        Ok(Self {
            id: id & mask,
            len: len as u8,
            data: [0; CAN_MAX_DLC],
            extended,
            remote: true,
        })
    }

    fn build(id: u32, payload: &[u8], extended: bool) -> Result<Self, RigError> {
        if payload.len() > CAN_MAX_DLC {
            return Err(RigError::ProtocolError("CAN payload longer than 8 bytes"));
        }
        let mut data = [0u8; CAN_MAX_DLC];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            id,
            len: payload.len() as u8,
            data,
            extended,
            remote: false,
        })
    }

    /// The frame identifier (11 or 29 significant bits).
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The data length code.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The meaningful payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// The full 8-byte buffer, zero padded past `len`.
    pub fn raw_data(&self) -> &[u8; CAN_MAX_DLC] {
        &self.data
    }

    pub fn is_extended(&self) -> bool {
        self.extended
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }
}

impl fmt::Display for CanFrame {
    /// Formats the frame as `583 # 4b 41 60 0 37 0 0 0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x} #", self.id)?;
        if self.remote {
            return write!(f, " R{}", self.len);
        }
        for byte in self.data() {
            write!(f, " {:x}", byte)?;
        }
        Ok(())
    }
}
