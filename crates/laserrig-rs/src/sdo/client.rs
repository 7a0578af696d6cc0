// crates/laserrig-rs/src/sdo/client.rs
use super::command::{self, RegisterValue, SdoResponse};
use crate::bus::CanBus;
use crate::config::AbortPolicy;
use crate::hal::{CanInterface, Clock, RigError};
use crate::types::NodeId;
use log::{error, warn};

/// Expedited SDO client correlating each request with the next response of the target node.
///
/// There is no transaction id in an expedited exchange. Correlation relies on the
/// queue being drained before the request is sent and on a single outstanding
/// request per bus, so the client takes `&mut self` for every access.
pub struct SdoClient<I: CanInterface, C: Clock> {
    bus: CanBus<I, C>,
    abort_policy: AbortPolicy,
}

impl<I: CanInterface, C: Clock> SdoClient<I, C> {
    pub fn new(bus: CanBus<I, C>, abort_policy: AbortPolicy) -> Self {
        Self { bus, abort_policy }
    }

    pub fn bus(&self) -> &CanBus<I, C> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut CanBus<I, C> {
        &mut self.bus
    }

    pub fn abort_policy(&self) -> AbortPolicy {
        self.abort_policy
    }

    pub fn into_bus(self) -> CanBus<I, C> {
        self.bus
    }

    /// Reads `size` bytes (1-4) of `index`/`sub_index` from `node`.
    pub fn read_register(
        &mut self,
        node: NodeId,
        index: u16,
        sub_index: u8,
        size: usize,
    ) -> Result<RegisterValue, RigError> {
        if size == 0 || size > command::MAX_EXPEDITED_SIZE {
            return Err(RigError::InvalidRegisterSize(size));
        }
        self.bus.flush_stale("register read")?;

        let request = command::encode_read_request(node, index, sub_index)?;
        self.bus.transmit(&request, "register read")?;

        let frame = self.bus.receive_within_watchdog().inspect_err(|e| {
            if *e == RigError::Timeout {
                error!("[SDO] Watchdog expired reading {:#06x}/{} on node {}", index, sub_index, node);
            }
        })?;
        let response = SdoResponse::decode(&frame, node).inspect_err(|e| {
            error!("[SDO] Bad answer to a read on node {} ({}): {}", node, frame, e);
        })?;

        if response.is_abort() {
            match self.abort_policy {
                AbortPolicy::Strict => {
                    error!(
                        "[SDO] Node {} aborted the read of {:#06x}/{} (code {:#010x})",
                        node,
                        index,
                        sub_index,
                        response.abort_code()
                    );
                    return Err(RigError::DeviceRejected {
                        abort_code: response.abort_code(),
                    });
                }
                AbortPolicy::WriteOnly => {
                    warn!(
                        "[SDO] Node {} answered the read of {:#06x}/{} with an abort frame; accepting it as data",
                        node, index, sub_index
                    );
                }
            }
        }

        response.value(size)
    }

    /// Writes 1 to 4 raw bytes to `index`/`sub_index` on `node`.
    pub fn write_register(
        &mut self,
        node: NodeId,
        index: u16,
        sub_index: u8,
        value: &[u8],
    ) -> Result<(), RigError> {
        let value = RegisterValue::from_bytes(value)?;
        self.bus.flush_stale("register write")?;

        let request = command::encode_write_request(node, index, sub_index, &value)?;
        self.bus.transmit(&request, "register write")?;

        let frame = self.bus.receive_within_watchdog().inspect_err(|e| {
            if *e == RigError::Timeout {
                error!("[SDO] Watchdog expired writing {:#06x}/{} on node {}", index, sub_index, node);
            }
        })?;
        let response = SdoResponse::decode(&frame, node).inspect_err(|e| {
            error!("[SDO] Bad answer to a write on node {} ({}): {}", node, frame, e);
        })?;

        if response.is_abort() {
            error!(
                "[SDO] Node {} rejected the write of {:#06x}/{} (code {:#010x})",
                node,
                index,
                sub_index,
                response.abort_code()
            );
            return Err(RigError::DeviceRejected {
                abort_code: response.abort_code(),
            });
        }
        Ok(())
    }

    // --- Typed helpers (sub-index 0, little endian) ---

    pub fn read_u8(&mut self, node: NodeId, index: u16) -> Result<u8, RigError> {
        Ok(self.read_register(node, index, 0, 1)?.as_u8())
    }

    pub fn read_i8(&mut self, node: NodeId, index: u16) -> Result<i8, RigError> {
        Ok(self.read_register(node, index, 0, 1)?.as_i8())
    }

    pub fn read_u16(&mut self, node: NodeId, index: u16) -> Result<u16, RigError> {
        Ok(self.read_register(node, index, 0, 2)?.as_u16())
    }

    pub fn read_i32(&mut self, node: NodeId, index: u16) -> Result<i32, RigError> {
        Ok(self.read_register(node, index, 0, 4)?.as_i32())
    }

    pub fn write_u8(&mut self, node: NodeId, index: u16, value: u8) -> Result<(), RigError> {
        self.write_register(node, index, 0, &[value])
    }

    pub fn write_i8(&mut self, node: NodeId, index: u16, value: i8) -> Result<(), RigError> {
        self.write_register(node, index, 0, &value.to_le_bytes())
    }

    pub fn write_u16(&mut self, node: NodeId, index: u16, value: u16) -> Result<(), RigError> {
        self.write_register(node, index, 0, &value.to_le_bytes())
    }

    pub fn write_i32(&mut self, node: NodeId, index: u16, value: i32) -> Result<(), RigError> {
        self.write_register(node, index, 0, &value.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::test_support::{ScriptedInterface, SteppingClock};
    use crate::frame::CanFrame;

    fn client(rx: &[Option<CanFrame>], policy: AbortPolicy) -> SdoClient<ScriptedInterface, SteppingClock> {
        let mut iface = ScriptedInterface::default();
        iface.rx.extend(rx.iter().copied());
        SdoClient::new(CanBus::new(iface, SteppingClock::new(1_000), 100_000), policy)
    }

    fn frame(id: u16, data: &[u8]) -> Option<CanFrame> {
        Some(CanFrame::new(id, data).unwrap())
    }

    #[test]
    fn test_read_status_word() {
        // One stale frame queued before the request, then nothing for a poll, then the answer.
        let stale = frame(0x583, &[0x4B, 0x41, 0x60, 0, 0x40, 0x02, 0, 0]);
        let answer = frame(0x583, &[0x4B, 0x41, 0x60, 0, 0x37, 0x00, 0, 0]);
        let mut sdo = client(&[stale, None, None, answer], AbortPolicy::Strict);

        // The flush consumes the stale frame and stops at the first empty poll.
        let value = sdo.read_register(NodeId(3), 0x6041, 0, 2).unwrap();
        assert_eq!(value.as_bytes(), &[0x37, 0x00]);

        let sent = &sdo.bus().interface().sent;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id(), 0x603);
        assert_eq!(sent[0].data(), &[0x40, 0x41, 0x60, 0x00, 0, 0, 0, 0]);
    }

    #[test]
    fn test_read_timeout() {
        let mut sdo = client(&[], AbortPolicy::Strict);
        assert_eq!(sdo.read_u16(NodeId(3), 0x6041), Err(RigError::Timeout));
    }

    #[test]
    fn test_read_from_wrong_node() {
        let mut sdo = client(&[None, frame(0x584, &[0x4B, 0x41, 0x60, 0, 0x37, 0, 0, 0])], AbortPolicy::Strict);
        assert_eq!(
            sdo.read_u16(NodeId(3), 0x6041),
            Err(RigError::UnexpectedNode {
                expected: Some(NodeId(3)),
                cob_id: 0x584
            })
        );
    }

    #[test]
    fn test_read_rejects_truncated_answer() {
        let short = frame(0x583, &[0x4B, 0x41, 0x60, 0x00]);
        let mut sdo = client(&[None, short], AbortPolicy::Strict);
        assert_eq!(
            sdo.read_register(NodeId(3), 0x6041, 0, 2),
            Err(RigError::ProtocolError("Truncated SDO response"))
        );
    }

    #[test]
    fn test_read_abort_depends_on_policy() {
        let abort = frame(0x583, &[0x80, 0x41, 0x60, 0x00, 0x00, 0x00, 0x02, 0x06]);

        let mut strict = client(&[None, abort], AbortPolicy::Strict);
        assert_eq!(
            strict.read_u16(NodeId(3), 0x6041),
            Err(RigError::DeviceRejected { abort_code: 0x0602_0000 })
        );

        let mut lenient = client(&[None, abort], AbortPolicy::WriteOnly);
        assert_eq!(lenient.read_u16(NodeId(3), 0x6041), Ok(0x0000));
    }

    #[test]
    fn test_write_encodes_size() {
        let ack = frame(0x584, &[0x60, 0x40, 0x60, 0, 0, 0, 0, 0]);
        let mut sdo = client(&[None, ack, None, ack], AbortPolicy::Strict);

        sdo.write_u16(NodeId(4), 0x6040, 0x0106).unwrap();
        sdo.write_i32(NodeId(4), 0x607A, 441_000).unwrap();

        let sent = &sdo.bus().interface().sent;
        assert_eq!(sent[0].data(), &[0x2B, 0x40, 0x60, 0x00, 0x06, 0x01, 0x00, 0x00]);
        assert_eq!(sent[1].data()[0], 0x23);
        assert_eq!(&sent[1].data()[4..], &441_000i32.to_le_bytes());
    }

    #[test]
    fn test_write_rejected() {
        let abort = frame(0x583, &[0x80, 0x60, 0x60, 0x00, 0x30, 0x00, 0x09, 0x06]);
        let mut sdo = client(&[None, abort], AbortPolicy::WriteOnly);
        assert_eq!(
            sdo.write_i8(NodeId(3), 0x6060, 1),
            Err(RigError::DeviceRejected { abort_code: 0x0609_0030 })
        );
    }

    #[test]
    fn test_write_rejects_bad_size_without_sending() {
        let mut sdo = client(&[], AbortPolicy::Strict);
        assert_eq!(
            sdo.write_register(NodeId(3), 0x6040, 0, &[0; 5]),
            Err(RigError::InvalidRegisterSize(5))
        );
        assert!(sdo.bus().interface().sent.is_empty());
    }
}
