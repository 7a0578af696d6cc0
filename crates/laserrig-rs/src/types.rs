use core::convert::TryFrom;
use core::fmt;

// --- Primitive Types (Based on CiA 301 Section 7.1) ---
// These aliases keep register definitions close to the object dictionary vocabulary.

/// Alias for UNSIGNED8 (8-bit unsigned integer)
pub type UNSIGNED8 = u8;
/// Alias for UNSIGNED16 (16-bit unsigned integer)
pub type UNSIGNED16 = u16;
/// Alias for INTEGER32 (32-bit signed integer)
pub type INTEGER32 = i32;

/// Represents a CANopen Node ID, wrapping a `u8` to ensure type safety.
///
/// Valid Node IDs are in the range 1-127. Node ID 0 is reserved for NMT broadcast
/// and is never a valid target for SDO access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct NodeId(pub u8);

// --- Protocol Constants (CiA 301, predefined connection set) ---

/// Lowest valid CANopen node id.
pub const C_MIN_NODE_ID: u8 = 1;

/// Highest valid CANopen node id.
pub const C_MAX_NODE_ID: u8 = 127;

/// COB-ID of NMT node-control frames (broadcast).
pub const COB_NMT: u16 = 0x000;

/// Base COB-ID of SDO responses (server -> client): 0x580 + node.
pub const COB_SDO_TX_BASE: u16 = 0x580;

/// Base COB-ID of SDO requests (client -> server): 0x600 + node.
pub const COB_SDO_RX_BASE: u16 = 0x600;

/// Base COB-ID of NMT error control (boot-up / heartbeat): 0x700 + node.
pub const COB_NMT_ERROR_CONTROL_BASE: u16 = 0x700;

/// Maximum payload of a classic CAN data frame.
pub const CAN_MAX_DLC: usize = 8;

/// Mask of an 11-bit standard identifier.
pub const CAN_SFF_MASK: u32 = 0x0000_07FF;

/// Mask of a 29-bit extended identifier.
pub const CAN_EFF_MASK: u32 = 0x1FFF_FFFF;

/// Error type for invalid Node ID creation.
#[derive(Debug, PartialEq, Eq)]
pub enum NodeIdError {
    /// Node ID is outside the valid range (1-127).
    InvalidRange(u8),
}

impl fmt::Display for NodeIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeIdError::InvalidRange(value) => write!(f, "Invalid NodeId value: {}. Valid range is 1-127.", value),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NodeIdError {}

impl TryFrom<u8> for NodeId {
    type Error = NodeIdError;

    /// Creates a `NodeId` from a `u8`, returning an error if the value is not a valid
    /// CANopen node identifier.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            C_MIN_NODE_ID..=C_MAX_NODE_ID => Ok(NodeId(value)),
            _ => Err(NodeIdError::InvalidRange(value)),
        }
    }
}

impl From<NodeId> for u8 {
    /// Converts a `NodeId` back into its underlying `u8` representation.
    /// This conversion is infallible.
    fn from(node_id: NodeId) -> Self {
        node_id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl NodeId {
    /// COB-ID used to send an SDO request to this node.
    pub const fn sdo_request_cob_id(self) -> u16 {
        COB_SDO_RX_BASE + self.0 as u16
    }

    /// COB-ID on which this node answers SDO requests.
    pub const fn sdo_response_cob_id(self) -> u16 {
        COB_SDO_TX_BASE + self.0 as u16
    }

    /// COB-ID of this node's boot-up / heartbeat frame.
    pub const fn error_control_cob_id(self) -> u16 {
        COB_NMT_ERROR_CONTROL_BASE + self.0 as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_range() {
        assert!(NodeId::try_from(0).is_err());
        assert_eq!(NodeId::try_from(1), Ok(NodeId(1)));
        assert_eq!(NodeId::try_from(127), Ok(NodeId(127)));
        assert_eq!(NodeId::try_from(128), Err(NodeIdError::InvalidRange(128)));
    }

    #[test]
    fn test_cob_ids() {
        let node = NodeId(3);
        assert_eq!(node.sdo_request_cob_id(), 0x603);
        assert_eq!(node.sdo_response_cob_id(), 0x583);
        assert_eq!(node.error_control_cob_id(), 0x703);
    }
}
