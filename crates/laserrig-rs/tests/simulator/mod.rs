// crates/laserrig-rs/tests/simulator/mod.rs
#![allow(dead_code)]

pub mod interface;
pub mod lens;

pub use interface::{SimulatedCanInterface, SimulatedDrive};
pub use lens::SimulatedLens;

use laserrig_rs::Clock;
use std::cell::Cell;
use std::fs::File;
use std::rc::Rc;

/// Simulation time shared between the clock handed to the code under test and the test body.
///
/// Every read advances time by `step_us`, so polling loops make progress
/// without any real waiting.
#[derive(Clone)]
pub struct SimClock {
    now_us: Rc<Cell<u64>>,
    step_us: u64,
}

impl SimClock {
    pub fn new(step_us: u64) -> Self {
        Self {
            now_us: Rc::new(Cell::new(0)),
            step_us,
        }
    }

    /// Current simulation time, without advancing it.
    pub fn peek(&self) -> u64 {
        self.now_us.get()
    }
}

impl Clock for SimClock {
    fn now_us(&self) -> u64 {
        let t = self.now_us.get();
        self.now_us.set(t + self.step_us);
        t
    }

    fn delay_us(&mut self, duration_us: u64) {
        self.now_us.set(self.now_us.get() + duration_us);
    }
}

/// Sends every log line, wire trace included, to a file next to the test binary.
pub fn init_logging(name: &str) {
    let path = std::env::temp_dir().join(format!("laserrig_{name}.log"));
    let Ok(log_file) = File::create(path) else {
        return;
    };
    let _ = env_logger::Builder::new()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter_level(log::LevelFilter::Trace)
        .format_timestamp_micros()
        .try_init();
}
