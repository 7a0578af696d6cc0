use laserrig_rs::{LensConfig, RigError, SerialChannel};
use log::error;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

/// Lens serial line on a tty: 8 data bits, no parity, 1 stop bit, no flow control.
pub struct TtyLensChannel {
    port: Box<dyn SerialPort>,
}

impl TtyLensChannel {
    pub fn open(path: &str, config: &LensConfig) -> Result<Self, RigError> {
        let port = serialport::new(path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .open()
            .map_err(|e| {
                error!("[LENS] Error opening {}: {}", path, e);
                RigError::TransportOpenFailed
            })?;
        Ok(Self { port })
    }
}

impl SerialChannel for TtyLensChannel {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize, RigError> {
        self.port.write(bytes).map_err(|e| {
            error!("[LENS] Error while writing on serial port: {}", e);
            RigError::SendFailed
        })
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, RigError> {
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(0),
            Err(e) => {
                error!("[LENS] Error while reading the serial port: {}", e);
                Err(RigError::IoError)
            }
        }
    }
}
