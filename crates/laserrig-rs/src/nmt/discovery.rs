// crates/laserrig-rs/src/nmt/discovery.rs
use super::{NmtCommand, encode_nmt_command};
use crate::bus::CanBus;
use crate::hal::{CanInterface, Clock, RigError};
use crate::types::{COB_NMT_ERROR_CONTROL_BASE, NodeId};
use alloc::vec;
use log::{error, info};

/// Resets every node on the bus and waits for the boot-up message of each `expected` node.
///
/// The listening window is one watchdog long and restarts after every received
/// frame; discovery ends when a full window passes in silence, or when
/// `discovery_timeout_us` has elapsed since the broadcast.
///
/// A frame from any node outside `expected` fails with `UnexpectedNode`; an expected
/// node that never announced itself fails with `NodeNotFound`.
pub fn discover_nodes<I: CanInterface, C: Clock>(
    bus: &mut CanBus<I, C>,
    expected: &[NodeId],
    discovery_timeout_us: u64,
) -> Result<(), RigError> {
    let scan = encode_nmt_command(NmtCommand::ResetNode, None)?;
    bus.transmit(&scan, "node discovery")?;

    let started = bus.now_us();
    let overall_deadline = started.saturating_add(discovery_timeout_us);
    let mut found = vec![false; expected.len()];

    loop {
        let window_end = bus.now_us().saturating_add(bus.watchdog_us());
        let frame = match bus.receive_until(window_end.min(overall_deadline)) {
            Ok(frame) => frame,
            Err(RigError::Timeout) => break,
            Err(e) => return Err(e),
        };

        let announced = frame
            .id()
            .checked_sub(COB_NMT_ERROR_CONTROL_BASE as u32)
            .and_then(|n| expected.iter().position(|node| node.0 as u32 == n));
        match announced {
            Some(slot) if !frame.is_extended() => found[slot] = true,
            _ => {
                error!("[NMT] Unexpected CAN node: {}", frame);
                return Err(RigError::UnexpectedNode {
                    expected: None,
                    cob_id: frame.id(),
                });
            }
        }

        if bus.now_us() >= overall_deadline {
            break;
        }
    }

    for (node, present) in expected.iter().zip(&found) {
        if !present {
            error!("[NMT] Node {} has not been found", node);
            return Err(RigError::NodeNotFound(*node));
        }
    }
    info!("[NMT] Connection OK: {} node(s) found", expected.len());
    Ok(())
}
