#![cfg_attr(not(feature = "std"), no_std)]

// 'alloc' is used for dynamic allocation (e.g., the discovery node set)
extern crate alloc;

// --- Foundation Modules ---
pub mod types;
pub mod hal;
pub mod config;
pub(crate) mod log;

// --- Link Layer ---
pub mod frame;
pub mod bus;

// --- CANopen Services ---
pub mod nmt;
pub mod sdo;

// --- Device Profiles ---
pub mod ds402;
pub mod motion;
pub mod controller;

// --- Serial Lens ---
pub mod lens;

// --- Top-level Exports ---
pub use types::NodeId;
pub use hal::{CanInterface, Cancellation, Clock, NeverCancel, RigError, SerialChannel};
#[cfg(feature = "std")]
pub use hal::StdClock;
pub use config::{AbortPolicy, FocalPowerCheck, LensConfig, MirrorConfig, RegisterMap, RigConfig, TimingConfig};
pub use frame::CanFrame;
pub use bus::CanBus;
pub use sdo::{RegisterValue, SdoClient};
pub use ds402::{ControlWord, DriveState, NodeStatus, OperationMode, StatusWord};
pub use controller::MirrorController;
pub use lens::{FocalRange, LensSession, LensState};
