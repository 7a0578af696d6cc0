// crates/laserrig-rs/tests/simulator/lens.rs
use laserrig_rs::lens::decode_focal_power_frame;
use laserrig_rs::{RigError, SerialChannel};
use std::collections::VecDeque;

/// A tunable lens on a serial line.
///
/// Replies are handed out at most `chunk` bytes per read, like a slow UART.
pub struct SimulatedLens {
    pub min_power: i16,
    pub max_power: i16,
    pub status_code: u8,
    pub chunk: usize,
    /// Sends "Ready\r\n", as the documentation claims, instead of "Ready\n\n".
    pub documented_start_reply: bool,
    /// Answers every focal power command with an error byte.
    pub complain: bool,
    /// Every byte written by the code under test.
    pub written: Vec<u8>,
    /// Powers decoded from valid focal power frames, in order.
    pub applied_powers: Vec<i16>,
    rx: VecDeque<u8>,
}

impl SimulatedLens {
    pub fn new(min_power: i16, max_power: i16) -> Self {
        Self {
            min_power,
            max_power,
            status_code: 0,
            chunk: 4,
            documented_start_reply: false,
            complain: false,
            written: Vec::new(),
            applied_powers: Vec::new(),
            rx: VecDeque::new(),
        }
    }

    fn handle(&mut self, command: &[u8]) {
        match command {
            b"Start" => {
                let reply: &[u8] = if self.documented_start_reply { b"Ready\r\n" } else { b"Ready\n\n" };
                self.rx.extend(reply);
            }
            [b'M', b'w', b'C', b'A', 0x56, 0x76] => {
                let [max_hi, max_lo] = self.max_power.to_be_bytes();
                let [min_hi, min_lo] = self.min_power.to_be_bytes();
                self.rx
                    .extend([b'M', b'w', b'C', self.status_code, max_hi, max_lo, min_hi, min_lo, 0, 0, 0, 0]);
            }
            frame if frame.len() == 10 => {
                let mut raw = [0u8; 10];
                raw.copy_from_slice(frame);
                match decode_focal_power_frame(&raw) {
                    Ok(power) => {
                        log::debug!("[SIM] Lens focal power set to {}", power);
                        self.applied_powers.push(power);
                        if self.complain {
                            self.rx.push_back(b'E');
                        }
                    }
                    Err(e) => {
                        log::warn!("[SIM] Lens rejected a frame: {}", e);
                        self.rx.push_back(b'E');
                    }
                }
            }
            other => log::warn!("[SIM] Lens ignored {:02x?}", other),
        }
    }
}

impl SerialChannel for SimulatedLens {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize, RigError> {
        self.written.extend_from_slice(bytes);
        self.handle(bytes);
        Ok(bytes.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, RigError> {
        let n = self.rx.len().min(buffer.len()).min(self.chunk);
        for slot in buffer.iter_mut().take(n) {
            // n never exceeds the queue length.
            *slot = self.rx.pop_front().unwrap_or_default();
        }
        Ok(n)
    }
}
