// crates/laserrig-rs/src/motion.rs
//! Profile-position moves: commit an absolute target, then poll "target reached".

use crate::config::RegisterMap;
use crate::ds402::ControlWord;
use crate::ds402::drive::{read_status_word, write_control_word};
use crate::hal::{CanInterface, Cancellation, Clock, RigError};
use crate::log::{NodeContext, node_debug, node_error, node_warn};
use crate::sdo::SdoClient;
use crate::types::NodeId;

/// Issues one absolute move of `node` to `target_position`.
///
/// `current` is the node's control word as last read; it is not re-read here.
/// Returns the control word left on the device (set-point bit high).
pub fn move_to<I: CanInterface, C: Clock>(
    sdo: &mut SdoClient<I, C>,
    registers: &RegisterMap,
    node: NodeId,
    target_position: i32,
    current: ControlWord,
) -> Result<ControlWord, RigError> {
    let ctx = NodeContext::new("MOTION", node);

    sdo.write_i32(node, registers.target_position, target_position)
        .inspect_err(|e| node_error!(ctx, "Fail to set the target position: {}", e))?;

    let prepared = current.prepare_absolute_move();
    write_control_word(sdo, registers, node, prepared)
        .inspect_err(|e| node_error!(ctx, "Fail to set the control word: {}", e))?;

    // Rising edge on bit 4 commits the set-point.
    let committed = prepared.with_new_set_point();
    write_control_word(sdo, registers, node, committed)
        .inspect_err(|e| node_error!(ctx, "Fail to set the control word: {}", e))?;

    node_debug!(ctx, "Target position {} committed", target_position);
    Ok(committed)
}

/// Whether `node` reports "target reached" (status word bit 10).
pub fn is_arrived<I: CanInterface, C: Clock>(
    sdo: &mut SdoClient<I, C>,
    registers: &RegisterMap,
    node: NodeId,
) -> Result<bool, RigError> {
    Ok(read_status_word(sdo, registers, node)?.target_reached())
}

/// Polls every node in `nodes` until all of them report "target reached".
///
/// Nodes are checked in order and a poll stops at the first one still moving.
/// Fails with `Timeout` once `timeout_us` has elapsed and with `Cancelled` as soon
/// as `cancel` is raised; both are checked before every poll.
pub fn wait_until_arrived<I: CanInterface, C: Clock>(
    sdo: &mut SdoClient<I, C>,
    registers: &RegisterMap,
    nodes: &[NodeId],
    timeout_us: u64,
    poll_interval_us: u64,
    cancel: &impl Cancellation,
) -> Result<(), RigError> {
    let deadline = sdo.bus().now_us().saturating_add(timeout_us);
    let mut pending = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RigError::Cancelled);
        }

        while pending < nodes.len() && is_arrived(sdo, registers, nodes[pending])? {
            pending += 1;
        }
        if pending == nodes.len() {
            return Ok(());
        }

        if sdo.bus().now_us() >= deadline {
            node_warn!(
                NodeContext::new("MOTION", nodes[pending]),
                "Target not reached after {} us",
                timeout_us
            );
            return Err(RigError::Timeout);
        }
        sdo.bus_mut().delay_us(poll_interval_us);
    }
}
