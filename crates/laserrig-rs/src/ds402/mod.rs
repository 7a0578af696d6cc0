// crates/laserrig-rs/src/ds402/mod.rs
//! CiA 402 drive profile: status decoding, control-word edits and the enable sequence.

pub mod control;
pub mod drive;
pub mod modes;
pub mod states;

pub use control::ControlWord;
pub use drive::{NodeStatus, configure_node, enable_operation, read_node_status};
pub use modes::OperationMode;
pub use states::{DriveState, StatusWord};
