// crates/laserrig-rs/src/lens/mod.rs
//! Serial protocol of the electrically tunable lens.

pub mod command;
pub mod crc;
pub mod session;

pub use command::{CommandModeReply, FocalRange, decode_focal_power_frame, encode_focal_power_frame};
pub use crc::crc16;
pub use session::{LensSession, LensState};
