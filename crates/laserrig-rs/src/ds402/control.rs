// crates/laserrig-rs/src/ds402/control.rs
use super::states::DriveState;

/// Snapshot of the 16-bit control word (object 0x6040).
///
/// Every edit is a pure function returning a new snapshot; nothing is written to
/// the device until the caller does so explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlWord(pub u16);

impl ControlWord {
    pub const SWITCH_ON: u16 = 1 << 0;
    pub const ENABLE_VOLTAGE: u16 = 1 << 1;
    pub const QUICK_STOP: u16 = 1 << 2;
    pub const ENABLE_OPERATION: u16 = 1 << 3;
    /// Profile position: a rising edge commits the target position.
    pub const NEW_SET_POINT: u16 = 1 << 4;
    pub const CHANGE_SET_IMMEDIATELY: u16 = 1 << 5;
    pub const RELATIVE: u16 = 1 << 6;
    pub const FAULT_RESET: u16 = 1 << 7;
    pub const HALT: u16 = 1 << 8;

    /// "Shutdown": leaves SWITCH_ON_DISABLED for READY_TO_SWITCH_ON.
    pub fn shutdown(self) -> Self {
        Self((self.0 & 0xFF7E) | 0x0006)
    }

    /// "Switch on": leaves READY_TO_SWITCH_ON for SWITCHED_ON.
    pub fn switch_on(self) -> Self {
        Self((self.0 & 0xFF7F) | 0x0007)
    }

    /// "Enable operation": leaves SWITCHED_ON for OPERATION_ENABLED.
    pub fn enable_operation(self) -> Self {
        Self((self.0 & 0xFF7F) | 0x000F)
    }

    pub fn with_halt(self) -> Self {
        Self(self.0 | Self::HALT)
    }

    /// Clears the set-point, change-immediately, relative and halt bits:
    /// an absolute move that lets the current one finish, with the drive running.
    pub fn prepare_absolute_move(self) -> Self {
        Self(self.0 & !(Self::NEW_SET_POINT | Self::CHANGE_SET_IMMEDIATELY | Self::RELATIVE | Self::HALT))
    }

    pub fn with_new_set_point(self) -> Self {
        Self(self.0 | Self::NEW_SET_POINT)
    }

    /// The edit that moves a drive one step from `state` toward OPERATION_ENABLED.
    ///
    /// Returns `None` for OPERATION_ENABLED (nothing to do) and for every state
    /// from which no transition is modelled.
    pub fn step_toward_enabled(self, state: DriveState) -> Option<Self> {
        match state {
            DriveState::SwitchOnDisabled => Some(self.shutdown()),
            DriveState::ReadyToSwitchOn => Some(self.switch_on()),
            DriveState::SwitchedOn => Some(self.enable_operation()),
            _ => None,
        }
    }
}
