// crates/laserrig-rs/src/lens/command.rs
//! Byte layout of the lens commands and replies.

use super::crc::crc16;
use crate::hal::RigError;

pub const START_COMMAND: &[u8; 5] = b"Start";
/// The device sends two line feeds, not the CR LF its documentation mentions.
pub const START_REPLY: &[u8; 7] = b"Ready\n\n";

pub const COMMAND_MODE_COMMAND: [u8; 6] = [b'M', b'w', b'C', b'A', 0x56, 0x76];
pub const COMMAND_MODE_REPLY_LEN: usize = 12;

pub const FOCAL_POWER_TAG: [u8; 4] = [b'P', b'w', b'D', b'A'];
pub const FOCAL_POWER_FRAME_LEN: usize = 10;

/// Time to let a command of `command_len` bytes go out and the device answer.
pub const fn settle_delay_us(command_len: usize) -> u64 {
    (command_len as u64 + 30) * 100
}

/// Focal power limits reported by the lens, in device power units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocalRange {
    pub min: i16,
    pub max: i16,
}

impl FocalRange {
    pub fn contains(&self, power: i32) -> bool {
        (self.min as i32..=self.max as i32).contains(&power)
    }
}

/// Decoded reply to the command-mode switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandModeReply {
    pub status_tag: [u8; 3],
    pub status_code: u8,
    pub range: FocalRange,
}

impl CommandModeReply {
    pub fn decode(reply: &[u8]) -> Result<Self, RigError> {
        if reply.len() != COMMAND_MODE_REPLY_LEN {
            return Err(RigError::ProtocolError("Unexpected command mode reply size"));
        }
        let max = i16::from_be_bytes([reply[4], reply[5]]);
        let min = i16::from_be_bytes([reply[6], reply[7]]);
        if min > max {
            return Err(RigError::ProtocolError("Lens reported min focal power above max"));
        }
        Ok(Self {
            status_tag: [reply[0], reply[1], reply[2]],
            status_code: reply[3],
            range: FocalRange { min, max },
        })
    }
}

/// Converts a focal length in millimetres to device power units.
///
/// `round(1000 / mm * scale)`, halves away from zero. Non-finite or out-of-`i32`
/// results are returned as `None`.
pub fn focal_power(focal_mm: f64, scale: f64) -> Option<i32> {
    let power = 1000.0 / focal_mm * scale;
    if !power.is_finite() || power < i32::MIN as f64 || power > i32::MAX as f64 {
        return None;
    }
    // `f64::round` needs std; `as` truncates toward zero.
    let rounded = if power >= 0.0 { power + 0.5 } else { power - 0.5 };
    Some(rounded as i32)
}

/// `P w D A hi lo 0 0 crcLo crcHi`, the CRC covering the first 6 bytes.
pub fn encode_focal_power_frame(power: i16) -> [u8; FOCAL_POWER_FRAME_LEN] {
    let [hi, lo] = power.to_be_bytes();
    let mut frame = [0u8; FOCAL_POWER_FRAME_LEN];
    frame[..4].copy_from_slice(&FOCAL_POWER_TAG);
    frame[4] = hi;
    frame[5] = lo;
    let [crc_lo, crc_hi] = crc16(&frame[..6]).to_le_bytes();
    frame[8] = crc_lo;
    frame[9] = crc_hi;
    frame
}

/// Validates a focal power frame and returns the power it carries.
pub fn decode_focal_power_frame(frame: &[u8; FOCAL_POWER_FRAME_LEN]) -> Result<i16, RigError> {
    if frame[..4] != FOCAL_POWER_TAG {
        return Err(RigError::ProtocolError("Not a focal power frame"));
    }
    let expected = crc16(&frame[..6]);
    let actual = u16::from_le_bytes([frame[8], frame[9]]);
    if expected != actual {
        return Err(RigError::CrcMismatch { expected, actual });
    }
    Ok(i16::from_be_bytes([frame[4], frame[5]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_delay() {
        assert_eq!(settle_delay_us(START_COMMAND.len()), 3_500);
        assert_eq!(settle_delay_us(COMMAND_MODE_COMMAND.len()), 3_600);
    }

    #[test]
    fn test_focal_power_rounds() {
        assert_eq!(focal_power(50.0, 200.0), Some(4000));
        assert_eq!(focal_power(300.0, 200.0), Some(667));
        assert_eq!(focal_power(-100.0, 200.0), Some(-2000));
        assert_eq!(focal_power(0.0, 200.0), None);
        assert_eq!(focal_power(f64::NAN, 200.0), None);
    }

    #[test]
    fn test_frame_layout() {
        let frame = encode_focal_power_frame(4000);
        assert_eq!(frame, [b'P', b'w', b'D', b'A', 0x0F, 0xA0, 0, 0, 0xB9, 0x2C]);
        assert_eq!(decode_focal_power_frame(&frame), Ok(4000));
    }

    #[test]
    fn test_corrupted_frame_is_detected() {
        let mut frame = encode_focal_power_frame(2000);
        frame[5] ^= 0x01;
        assert_eq!(
            decode_focal_power_frame(&frame),
            Err(RigError::CrcMismatch {
                expected: crc16(&frame[..6]),
                actual: 0x08BF
            })
        );
    }

    #[test]
    fn test_command_mode_reply() {
        let reply = [b'O', b'K', b'1', 0x00, 0x0F, 0xA0, 0xFB, 0x50, 0, 0, 0, 0];
        let decoded = CommandModeReply::decode(&reply).unwrap();
        assert_eq!(decoded.status_tag, *b"OK1");
        assert_eq!(decoded.range, FocalRange { min: -1200, max: 4000 });
        assert!(decoded.range.contains(-1200));
        assert!(!decoded.range.contains(4001));

        assert!(CommandModeReply::decode(&reply[..11]).is_err());

        let inverted = [b'O', b'K', b'1', 0x00, 0x00, 0x01, 0x00, 0x02, 0, 0, 0, 0];
        assert!(matches!(
            CommandModeReply::decode(&inverted),
            Err(RigError::ProtocolError(_))
        ));
    }
}
