// crates/laserrig-rs/src/config.rs
//! Rig configuration: node ids, register addresses and timing budgets.
//!
//! Every constant the drivers rely on lives here and is passed in explicitly.
//! `Default` reproduces the reference rig (mirrors on nodes 3 and 4, 100 ms watchdog,
//! lens at 115 200 baud).

use crate::types::NodeId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Complete configuration of the rig control plane.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RigConfig {
    pub timing: TimingConfig,
    pub registers: RegisterMap,
    /// The two mirror axes, in (phi1, phi2) order.
    pub mirrors: [MirrorConfig; 2],
    pub lens: LensConfig,
    pub abort_policy: AbortPolicy,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            registers: RegisterMap::default(),
            mirrors: [
                MirrorConfig {
                    node_id: NodeId(3),
                    offset: 265_750,
                },
                MirrorConfig {
                    node_id: NodeId(4),
                    offset: 441_000,
                },
            ],
            lens: LensConfig::default(),
            abort_policy: AbortPolicy::default(),
        }
    }
}

impl RigConfig {
    /// Node ids of both mirrors, in axis order.
    pub fn mirror_nodes(&self) -> [NodeId; 2] {
        [self.mirrors[0].node_id, self.mirrors[1].node_id]
    }
}

/// Watchdogs and loop bounds, all in microseconds unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimingConfig {
    /// Budget for a single request/response exchange, and the quiet window of discovery.
    pub watchdog_us: u64,
    /// Overall bound on node discovery.
    pub discovery_timeout_us: u64,
    /// Overall bound on waiting for "target reached".
    pub arrival_timeout_us: u64,
    /// Pause between two arrival polls.
    pub arrival_poll_interval_us: u64,
    /// Maximum number of control-word writes while driving a node to "Operation enabled".
    pub max_state_transitions: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            watchdog_us: 100_000,
            discovery_timeout_us: 2_000_000,
            arrival_timeout_us: 5_000_000,
            arrival_poll_interval_us: 1_000,
            max_state_transitions: 8,
        }
    }
}

/// Object dictionary addresses of the CiA 402 registers used by the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegisterMap {
    pub control_word: u16,
    pub status_word: u16,
    pub operation_mode: u16,
    pub operation_mode_display: u16,
    pub target_position: u16,
    pub position_demand: u16,
    pub position_actual: u16,
    pub profile_velocity: u16,
    pub max_profile_velocity: u16,
    pub target_velocity: u16,
    pub profile_acceleration: u16,
    pub profile_deceleration: u16,
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self {
            control_word: 0x6040,
            status_word: 0x6041,
            operation_mode: 0x6060,
            operation_mode_display: 0x6061,
            target_position: 0x607A,
            position_demand: 0x6063,
            position_actual: 0x6064,
            profile_velocity: 0x6081,
            max_profile_velocity: 0x607F,
            target_velocity: 0x60FF,
            profile_acceleration: 0x6083,
            profile_deceleration: 0x6084,
        }
    }
}

/// One mirror axis: the drive's node id and the encoder offset of its zero angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MirrorConfig {
    pub node_id: NodeId,
    /// Added to every commanded angle (millidegrees) to obtain the target position.
    pub offset: i32,
}

/// What the SDO client does with an abort frame received in answer to a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AbortPolicy {
    /// Abort frames are rejected for reads and writes alike.
    #[default]
    Strict,
    /// Only writes check for aborts; a read accepts the abort frame as data.
    WriteOnly,
}

/// Whether `set_focale` waits for the lens to complain about a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FocalPowerCheck {
    /// Fire-and-forget.
    #[default]
    Lenient,
    /// Any reply after the settle delay is treated as a rejection.
    Strict,
}

/// Serial line and command settings of the tunable lens.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LensConfig {
    pub baud_rate: u32,
    /// Read timeout of the serial channel itself.
    pub read_timeout_ms: u64,
    /// How long to keep collecting reply bytes after the settle delay.
    pub reply_timeout_us: u64,
    /// Conversion factor from diopters to device power units.
    pub power_scale: f64,
    pub verify_focal_power: FocalPowerCheck,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            read_timeout_ms: 500,
            reply_timeout_us: 500_000,
            power_scale: 200.0,
            verify_focal_power: FocalPowerCheck::Lenient,
        }
    }
}
