// crates/laserrig-rs-linux/examples/aim.rs
//! Aims and focuses the laser once.
//!
//! Configured through environment variables:
//!   RIG_CAN_INTERFACE  CAN interface (default `can0`)
//!   RIG_LENS_TTY       lens serial device (default `/dev/ttyACM0`)
//!   RIG_PHI1, RIG_PHI2 mirror angles in millidegrees (default 0)
//!   RIG_FOCAL_MM       focal length in millimetres (default 200)
//!   RIG_CONFIG         optional JSON configuration file
//!
//! Set `RUST_LOG=laserrig::wire=trace` to see every frame on the wire.

use laserrig_rs::{LensSession, MirrorController, NeverCancel, RigConfig, RigError, StdClock};
use laserrig_rs_linux::{SocketCanInterface, TtyLensChannel, load_config};
use log::{error, info};
use std::str::FromStr;
use std::{env, process};

struct Settings {
    can_interface: String,
    lens_path: String,
    phi1: i32,
    phi2: i32,
    focal_mm: f64,
    config_path: Option<String>,
}

/// Reads `name`, falling back to `default` when it is unset.
fn env_or<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| format!("{} has an invalid value: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

fn settings_from_env() -> Result<Settings, String> {
    Ok(Settings {
        can_interface: env::var("RIG_CAN_INTERFACE").unwrap_or_else(|_| "can0".to_string()),
        lens_path: env::var("RIG_LENS_TTY").unwrap_or_else(|_| "/dev/ttyACM0".to_string()),
        phi1: env_or("RIG_PHI1", 0)?,
        phi2: env_or("RIG_PHI2", 0)?,
        focal_mm: env_or("RIG_FOCAL_MM", 200.0)?,
        config_path: env::var("RIG_CONFIG").ok(),
    })
}

fn run(settings: &Settings) -> Result<(), RigError> {
    let config = match &settings.config_path {
        Some(path) => load_config(path)?,
        None => RigConfig::default(),
    };

    let mut lens = LensSession::new(
        TtyLensChannel::open(&settings.lens_path, &config.lens)?,
        StdClock::new(),
        config.lens,
    );
    lens.start()?;
    lens.enter_command_mode()?;

    let can = SocketCanInterface::open(&settings.can_interface)?;
    let mut mirrors = MirrorController::new(can, StdClock::new(), config);
    mirrors.connect()?;
    mirrors.configure_mirrors(&NeverCancel)?;

    lens.set_focale(settings.focal_mm)?;
    mirrors.move_to_angles(settings.phi1, settings.phi2, &NeverCancel)?;

    let [(raw1, phi1), (raw2, phi2)] = mirrors.actual_positions()?;
    info!("Mirror positions: {} ({}), {} ({})", raw1, phi1, raw2, phi2);

    let (can, _) = mirrors.into_parts();
    can.close();
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match settings_from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            process::exit(2);
        }
    };

    if let Err(e) = run(&settings) {
        error!("Aiming failed: {}", e);
        process::exit(1);
    }
}
