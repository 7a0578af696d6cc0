// crates/laserrig-rs/src/sdo/command.rs
//! Expedited SDO frame layout.
//! (Reference: CiA 301, Section 7.2.4.3)
//!
//! Byte 0 is the command specifier, bytes 1-2 the object index (little endian),
//! byte 3 the sub-index and bytes 4-7 the expedited data.

use crate::frame::CanFrame;
use crate::hal::RigError;
use crate::types::{CAN_MAX_DLC, NodeId};

/// Command specifier of an "initiate upload" (read) request.
pub const CCS_UPLOAD_REQUEST: u8 = 0x40;

/// Command specifier of an expedited "initiate download" (write) carrying 4 bytes.
/// Bits 2-3 hold the number of unused data bytes.
pub const CCS_EXPEDITED_DOWNLOAD: u8 = 0x23;

/// Command specifier of an SDO abort transfer.
pub const CS_ABORT: u8 = 0x80;

/// Largest value an expedited transfer can carry.
pub const MAX_EXPEDITED_SIZE: usize = 4;

/// Up to 4 raw bytes read from, or written to, a register.
///
/// The bytes are kept exactly as they travel on the wire (little endian);
/// the caller decides how to interpret them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterValue {
    bytes: [u8; MAX_EXPEDITED_SIZE],
    len: u8,
}

impl RegisterValue {
    /// Creates a value from 1 to 4 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RigError> {
        if bytes.is_empty() || bytes.len() > MAX_EXPEDITED_SIZE {
            return Err(RigError::InvalidRegisterSize(bytes.len()));
        }
        let mut buf = [0u8; MAX_EXPEDITED_SIZE];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            bytes: buf,
            len: bytes.len() as u8,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_u8(&self) -> u8 {
        self.bytes[0]
    }

    pub fn as_i8(&self) -> i8 {
        self.bytes[0] as i8
    }

    pub fn as_u16(&self) -> u16 {
        u16::from_le_bytes([self.bytes[0], self.bytes[1]])
    }

    pub fn as_u32(&self) -> u32 {
        u32::from_le_bytes(self.bytes)
    }

    pub fn as_i32(&self) -> i32 {
        i32::from_le_bytes(self.bytes)
    }
}

/// Returns the download command specifier for an expedited write of `size` bytes.
///
/// `0x23` for 4 bytes, `0x27` for 3, `0x2B` for 2 and `0x2F` for 1.
pub fn expedited_download_specifier(size: usize) -> Result<u8, RigError> {
    if size == 0 || size > MAX_EXPEDITED_SIZE {
        return Err(RigError::InvalidRegisterSize(size));
    }
    Ok(CCS_EXPEDITED_DOWNLOAD + (((MAX_EXPEDITED_SIZE - size) as u8) << 2))
}

/// Builds the read request for `index`/`sub_index` on `node`.
pub fn encode_read_request(node: NodeId, index: u16, sub_index: u8) -> Result<CanFrame, RigError> {
    let [lo, hi] = index.to_le_bytes();
    CanFrame::new(
        node.sdo_request_cob_id(),
        &[CCS_UPLOAD_REQUEST, lo, hi, sub_index, 0x00, 0x00, 0x00, 0x00],
    )
}

/// Builds the expedited write request storing `value` at `index`/`sub_index` on `node`.
pub fn encode_write_request(
    node: NodeId,
    index: u16,
    sub_index: u8,
    value: &RegisterValue,
) -> Result<CanFrame, RigError> {
    let specifier = expedited_download_specifier(value.len())?;
    let [lo, hi] = index.to_le_bytes();
    let mut payload = [specifier, lo, hi, sub_index, 0x00, 0x00, 0x00, 0x00];
    payload[4..4 + value.len()].copy_from_slice(value.as_bytes());
    CanFrame::new(node.sdo_request_cob_id(), &payload)
}

/// A decoded SDO response from a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdoResponse {
    pub command: u8,
    pub index: u16,
    pub sub_index: u8,
    pub data: [u8; MAX_EXPEDITED_SIZE],
}

impl SdoResponse {
    /// Decodes `frame` as the response of `node`.
    ///
    /// Any frame whose identifier is not `0x580 + node` is rejected with `UnexpectedNode`.
    /// Expedited responses always carry 8 bytes; a shorter frame is a `ProtocolError`.
    pub fn decode(frame: &CanFrame, node: NodeId) -> Result<Self, RigError> {
        if frame.is_extended() || frame.id() != node.sdo_response_cob_id() as u32 {
            return Err(RigError::UnexpectedNode {
                expected: Some(node),
                cob_id: frame.id(),
            });
        }
        if frame.len() < CAN_MAX_DLC {
            return Err(RigError::ProtocolError("Truncated SDO response"));
        }
        let raw = frame.raw_data();
        Ok(Self {
            command: raw[0],
            index: u16::from_le_bytes([raw[1], raw[2]]),
            sub_index: raw[3],
            data: [raw[4], raw[5], raw[6], raw[7]],
        })
    }

    pub fn is_abort(&self) -> bool {
        self.command == CS_ABORT
    }

    /// The abort code, meaningful only when `is_abort()` holds.
    pub fn abort_code(&self) -> u32 {
        u32::from_le_bytes(self.data)
    }

    /// The first `size` data bytes as a register value.
    pub fn value(&self, size: usize) -> Result<RegisterValue, RigError> {
        if size == 0 || size > MAX_EXPEDITED_SIZE {
            return Err(RigError::InvalidRegisterSize(size));
        }
        RegisterValue::from_bytes(&self.data[..size])
    }
}
