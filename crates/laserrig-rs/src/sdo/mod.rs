// crates/laserrig-rs/src/sdo/mod.rs
pub mod client;
pub mod command;

pub use client::SdoClient;
pub use command::{RegisterValue, SdoResponse};
