// crates/laserrig-rs/src/nmt/mod.rs
//! Network management: node-control commands and boot-up discovery.

use crate::frame::CanFrame;
use crate::hal::RigError;
use crate::types::{COB_NMT, NodeId};

pub mod discovery;

pub use discovery::discover_nodes;

/// NMT node-control command specifiers.
/// (Reference: CiA 301, Section 7.2.8.3.1)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NmtCommand {
    StartRemoteNode = 0x01,
    StopRemoteNode = 0x02,
    EnterPreOperational = 0x80,
    ResetNode = 0x81,
    ResetCommunication = 0x82,
}

impl TryFrom<u8> for NmtCommand {
    type Error = RigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::StartRemoteNode),
            0x02 => Ok(Self::StopRemoteNode),
            0x80 => Ok(Self::EnterPreOperational),
            0x81 => Ok(Self::ResetNode),
            0x82 => Ok(Self::ResetCommunication),
            _ => Err(RigError::ProtocolError("Unknown NMT command specifier")),
        }
    }
}

/// Addressee of an NMT command: one node, or every node when `None` (node byte 0).
pub fn encode_nmt_command(command: NmtCommand, target: Option<NodeId>) -> Result<CanFrame, RigError> {
    let node = target.map_or(0, u8::from);
    CanFrame::new(COB_NMT, &[command as u8, node])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_broadcast_layout() {
        let frame = encode_nmt_command(NmtCommand::ResetNode, None).unwrap();
        assert_eq!(frame.id(), 0x000);
        assert_eq!(frame.data(), &[0x81, 0x00]);
    }

    #[test]
    fn test_addressed_command() {
        let frame = encode_nmt_command(NmtCommand::StartRemoteNode, Some(NodeId(4))).unwrap();
        assert_eq!(frame.data(), &[0x01, 0x04]);
        assert_eq!(NmtCommand::try_from(0x82), Ok(NmtCommand::ResetCommunication));
        assert!(NmtCommand::try_from(0x03).is_err());
    }
}
