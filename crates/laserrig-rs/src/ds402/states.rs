// crates/laserrig-rs/src/ds402/states.rs
use core::fmt;

/// CiA 402 power drive system states, as reported by the status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveState {
    NotReadyToSwitchOn,
    SwitchOnDisabled,
    ReadyToSwitchOn,
    SwitchedOn,
    OperationEnabled,
    QuickStopActive,
    FaultReactionActive,
    Fault,
    /// The status word matched no known pattern.
    Unknown,
}

/// (mask, expected) pairs, matched in order; the first hit wins.
const STATE_PATTERNS: [(u16, u16, DriveState); 8] = [
    (0x004F, 0x0000, DriveState::NotReadyToSwitchOn),
    (0x005F, 0x0050, DriveState::SwitchOnDisabled),
    (0x007F, 0x0031, DriveState::ReadyToSwitchOn),
    (0x007F, 0x0033, DriveState::SwitchedOn),
    (0x007F, 0x0037, DriveState::OperationEnabled),
    (0x007F, 0x0017, DriveState::QuickStopActive),
    (0x004F, 0x000F, DriveState::FaultReactionActive),
    (0x004F, 0x0008, DriveState::Fault),
];

impl fmt::Display for DriveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotReadyToSwitchOn => "Not ready to switch on",
            Self::SwitchOnDisabled => "Switch on disabled",
            Self::ReadyToSwitchOn => "Ready to switch on",
            Self::SwitchedOn => "Switched on",
            Self::OperationEnabled => "Operation enabled",
            Self::QuickStopActive => "Quick stop active",
            Self::FaultReactionActive => "Fault reaction active",
            Self::Fault => "Fault",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Snapshot of the 16-bit status word (object 0x6041).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWord(pub u16);

impl StatusWord {
    /// Bit 10: the last set-point has been reached.
    pub const TARGET_REACHED: u16 = 1 << 10;

    pub fn state(self) -> DriveState {
        STATE_PATTERNS
            .iter()
            .find(|(mask, expected, _)| self.0 & mask == *expected)
            .map_or(DriveState::Unknown, |(_, _, state)| *state)
    }

    pub fn target_reached(self) -> bool {
        self.0 & Self::TARGET_REACHED != 0
    }
}

impl From<u16> for StatusWord {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}
