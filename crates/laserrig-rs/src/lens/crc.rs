// crates/laserrig-rs/src/lens/crc.rs
//! CRC-16/MODBUS: reflected polynomial 0xA001, init 0xFFFF, no final XOR.

const CRC16_INIT: u16 = 0xFFFF;
const CRC16_POLY: u16 = 0xA001;

pub fn crc16(bytes: &[u8]) -> u16 {
    let mut crc = CRC16_INIT;
    for &byte in bytes {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ CRC16_POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}
