#![cfg(target_os = "linux")]

mod can;
mod config;
mod serial;

pub use can::SocketCanInterface;
pub use config::load_config;
pub use serial::TtyLensChannel;
