// crates/laserrig-rs/src/ds402/drive.rs
use super::{ControlWord, DriveState, OperationMode, StatusWord};
use crate::config::RegisterMap;
use crate::hal::{CanInterface, Cancellation, Clock, RigError};
use crate::log::{NodeContext, node_debug, node_error, node_info};
use crate::sdo::SdoClient;
use crate::types::NodeId;

/// One-shot report of a drive's state and active mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStatus {
    pub node: NodeId,
    pub status_word: StatusWord,
    pub state: DriveState,
    pub mode: OperationMode,
}

pub fn read_status_word<I: CanInterface, C: Clock>(
    sdo: &mut SdoClient<I, C>,
    registers: &RegisterMap,
    node: NodeId,
) -> Result<StatusWord, RigError> {
    sdo.read_u16(node, registers.status_word).map(StatusWord)
}

pub fn read_control_word<I: CanInterface, C: Clock>(
    sdo: &mut SdoClient<I, C>,
    registers: &RegisterMap,
    node: NodeId,
) -> Result<ControlWord, RigError> {
    sdo.read_u16(node, registers.control_word).map(ControlWord)
}

pub fn write_control_word<I: CanInterface, C: Clock>(
    sdo: &mut SdoClient<I, C>,
    registers: &RegisterMap,
    node: NodeId,
    control_word: ControlWord,
) -> Result<(), RigError> {
    sdo.write_u16(node, registers.control_word, control_word.0)
}

pub fn set_operation_mode<I: CanInterface, C: Clock>(
    sdo: &mut SdoClient<I, C>,
    registers: &RegisterMap,
    node: NodeId,
    mode: OperationMode,
) -> Result<(), RigError> {
    sdo.write_i8(node, registers.operation_mode, mode.raw())
}

/// Reads the status word and the operation-mode display of `node`.
pub fn read_node_status<I: CanInterface, C: Clock>(
    sdo: &mut SdoClient<I, C>,
    registers: &RegisterMap,
    node: NodeId,
) -> Result<NodeStatus, RigError> {
    let status_word = read_status_word(sdo, registers, node)?;
    let mode = OperationMode::from_raw(sdo.read_i8(node, registers.operation_mode_display)?);
    let status = NodeStatus {
        node,
        status_word,
        state: status_word.state(),
        mode,
    };
    node_info!(
        NodeContext::new("DS402", node),
        "State: {}, mode: {}",
        status.state,
        status.mode
    );
    Ok(status)
}

/// Drives `node` to OPERATION_ENABLED, one control-word write per observed state.
///
/// The control word is rebuilt from zero and the halt bit is set on every write,
/// so the drive holds still once enabled. The state is re-read before each
/// decision. Fails with `UnexpectedState` on any state outside the enable path,
/// with `TransitionLimit` after `max_transitions` writes, and with `Cancelled`
/// as soon as `cancel` is raised.
pub fn enable_operation<I: CanInterface, C: Clock>(
    sdo: &mut SdoClient<I, C>,
    registers: &RegisterMap,
    node: NodeId,
    max_transitions: u32,
    cancel: &impl Cancellation,
) -> Result<(), RigError> {
    let ctx = NodeContext::new("DS402", node);
    let mut control_word = ControlWord::default();
    let mut transitions = 0;

    loop {
        if cancel.is_cancelled() {
            node_info!(ctx, "Enable sequence cancelled");
            return Err(RigError::Cancelled);
        }

        let state = read_status_word(sdo, registers, node)
            .inspect_err(|e| node_error!(ctx, "Fail to read the status word: {}", e))?
            .state();
        if state == DriveState::OperationEnabled {
            node_debug!(ctx, "Operation enabled after {} transition(s)", transitions);
            return Ok(());
        }

        let Some(next) = control_word.step_toward_enabled(state) else {
            node_error!(ctx, "Error regarding the state: {}", state);
            return Err(RigError::UnexpectedState(state));
        };
        if transitions >= max_transitions {
            node_error!(ctx, "Still in '{}' after {} transition(s)", state, transitions);
            return Err(RigError::TransitionLimit);
        }

        control_word = next.with_halt();
        node_debug!(ctx, "{} -> control word {:#06x}", state, control_word.0);
        write_control_word(sdo, registers, node, control_word)
            .inspect_err(|e| node_error!(ctx, "Fail to set the control word: {}", e))?;
        transitions += 1;
    }
}

/// Enables `node` and selects Profile Position mode.
pub fn configure_node<I: CanInterface, C: Clock>(
    sdo: &mut SdoClient<I, C>,
    registers: &RegisterMap,
    node: NodeId,
    max_transitions: u32,
    cancel: &impl Cancellation,
) -> Result<(), RigError> {
    enable_operation(sdo, registers, node, max_transitions, cancel)?;
    set_operation_mode(sdo, registers, node, OperationMode::ProfilePosition).inspect_err(|e| {
        node_error!(
            NodeContext::new("DS402", node),
            "Fail to set the operation mode register: {}",
            e
        )
    })?;
    node_info!(NodeContext::new("DS402", node), "Mirror configured");
    Ok(())
}
