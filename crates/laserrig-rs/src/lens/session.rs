// crates/laserrig-rs/src/lens/session.rs
use super::command::{
    COMMAND_MODE_COMMAND, COMMAND_MODE_REPLY_LEN, CommandModeReply, FocalRange, START_COMMAND, START_REPLY,
    encode_focal_power_frame, focal_power, settle_delay_us,
};
use crate::config::{FocalPowerCheck, LensConfig};
use crate::hal::{Clock, RigError, SerialChannel};
use crate::log::wire_trace;
use log::{error, info};

/// Size of the buffer a reply is collected into; longer replies are cut here.
const REPLY_BUFFER_LEN: usize = 100;

/// Where the session is in the lens handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LensState {
    Uninitialized,
    /// The lens answered the "Start" handshake.
    Started,
    /// The mode switch was sent; its reply has not been accepted yet.
    CommandMode,
    /// The focal range is known; focal power commands are accepted.
    Ready,
}

/// Command session with an electrically tunable lens on a serial line.
pub struct LensSession<S: SerialChannel, C: Clock> {
    channel: S,
    clock: C,
    config: LensConfig,
    state: LensState,
    mode_reply: Option<CommandModeReply>,
}

impl<S: SerialChannel, C: Clock> LensSession<S, C> {
    pub fn new(channel: S, clock: C, config: LensConfig) -> Self {
        Self {
            channel,
            clock,
            config,
            state: LensState::Uninitialized,
            mode_reply: None,
        }
    }

    pub fn state(&self) -> LensState {
        self.state
    }

    /// The focal power limits learned from the mode switch.
    pub fn range(&self) -> Option<FocalRange> {
        self.mode_reply.map(|r| r.range)
    }

    pub fn command_mode_reply(&self) -> Option<&CommandModeReply> {
        self.mode_reply.as_ref()
    }

    pub fn channel(&self) -> &S {
        &self.channel
    }

    /// Ends the session and returns the serial channel.
    pub fn into_channel(self) -> S {
        self.channel
    }

    /// Performs the "Start" / "Ready" handshake.
    pub fn start(&mut self) -> Result<(), RigError> {
        if self.state != LensState::Uninitialized {
            return Err(RigError::NotReady);
        }
        self.write_command(START_COMMAND)?;

        let mut buf = [0u8; REPLY_BUFFER_LEN];
        let n = self.read_reply(&mut buf, START_REPLY.len(), settle_delay_us(START_COMMAND.len()))?;
        if n != START_REPLY.len() {
            error!("[LENS] Not the expected answer size: {}", n);
            return Err(RigError::ProtocolError("Unexpected start reply size"));
        }
        if buf[..n] != START_REPLY[..] {
            error!("[LENS] Not the expected answer: {:02x?}", &buf[..n]);
            return Err(RigError::ProtocolError("Unexpected start reply"));
        }

        self.state = LensState::Started;
        info!("[LENS] Ready");
        Ok(())
    }

    /// Switches the lens to focal power control and records its range.
    pub fn enter_command_mode(&mut self) -> Result<&CommandModeReply, RigError> {
        if !matches!(self.state, LensState::Started | LensState::CommandMode) {
            return Err(RigError::NotReady);
        }
        self.write_command(&COMMAND_MODE_COMMAND)?;
        self.state = LensState::CommandMode;

        let mut buf = [0u8; REPLY_BUFFER_LEN];
        let n = self.read_reply(
            &mut buf,
            COMMAND_MODE_REPLY_LEN,
            settle_delay_us(COMMAND_MODE_COMMAND.len()),
        )?;
        let reply = CommandModeReply::decode(&buf[..n])
            .inspect_err(|e| error!("[LENS] Command mode reply of {} byte(s) rejected: {}", n, e))?;

        info!(
            "[LENS] Command mode: status {}{}{} code {}, focal power range [{}, {}]",
            reply.status_tag[0] as char,
            reply.status_tag[1] as char,
            reply.status_tag[2] as char,
            reply.status_code,
            reply.range.min,
            reply.range.max
        );
        self.state = LensState::Ready;
        Ok(self.mode_reply.insert(reply))
    }

    /// Sets the focal length in millimetres and returns the power sent to the lens.
    ///
    /// A power outside the lens range is rejected before anything is written.
    pub fn set_focale(&mut self, focal_mm: f64) -> Result<i32, RigError> {
        let range = match (self.state, self.mode_reply) {
            (LensState::Ready, Some(reply)) => reply.range,
            _ => return Err(RigError::NotReady),
        };

        let power = match focal_power(focal_mm, self.config.power_scale) {
            Some(p) if range.contains(p) => p,
            other => {
                let requested = other.unwrap_or((1000.0 / focal_mm * self.config.power_scale) as i32);
                error!(
                    "[LENS] Focal power {} ({} mm) outside [{}, {}]",
                    requested, focal_mm, range.min, range.max
                );
                return Err(RigError::OutOfRange {
                    requested,
                    min: range.min,
                    max: range.max,
                });
            }
        };

        // In range of two i16 bounds, so the narrowing is lossless.
        let frame = encode_focal_power_frame(power as i16);
        self.write_command(&frame)?;

        if self.config.verify_focal_power == FocalPowerCheck::Strict {
            let mut buf = [0u8; REPLY_BUFFER_LEN];
            let n = self.read_reply(&mut buf, 1, settle_delay_us(frame.len()))?;
            if n != 0 {
                error!("[LENS] Lens answered the focal power command: {:02x?}", &buf[..n]);
                return Err(RigError::ProtocolError("Lens rejected the focal power command"));
            }
        }
        info!("[LENS] Focal length set to {} mm (power {})", focal_mm, power);
        Ok(power)
    }

    fn write_command(&mut self, bytes: &[u8]) -> Result<(), RigError> {
        let written = self.channel.write_bytes(bytes)?;
        if written != bytes.len() {
            error!("[LENS] Error while writing on serial port ({}/{} bytes)", written, bytes.len());
            return Err(RigError::SendFailed);
        }
        wire_trace!("lens tx {:02x?}", bytes);
        Ok(())
    }

    /// Waits `settle_us`, then collects bytes until `expected` have arrived or the
    /// reply timeout elapses. Returns how many bytes were collected.
    fn read_reply(&mut self, buf: &mut [u8], expected: usize, settle_us: u64) -> Result<usize, RigError> {
        self.clock.delay_us(settle_us);
        let deadline = self.clock.now_us().saturating_add(self.config.reply_timeout_us);

        let mut count = 0;
        while count < expected && count < buf.len() {
            count += self.channel.read_bytes(&mut buf[count..])?;
            if self.clock.now_us() >= deadline {
                break;
            }
        }
        if count > 0 {
            wire_trace!("lens rx {:02x?}", &buf[..count]);
        }
        Ok(count)
    }
}
