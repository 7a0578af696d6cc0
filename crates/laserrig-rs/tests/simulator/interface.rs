// crates/laserrig-rs/tests/simulator/interface.rs
use laserrig_rs::{CanFrame, CanInterface, RigError};
use std::collections::{BTreeMap, VecDeque};

const ABORT_OBJECT_DOES_NOT_EXIST: u32 = 0x0602_0000;
const ABORT_INVALID_STATE: u32 = 0x0800_0022;

const SW_SWITCH_ON_DISABLED: u16 = 0x0250;
const SW_READY_TO_SWITCH_ON: u16 = 0x0231;
const SW_SWITCHED_ON: u16 = 0x0233;
const SW_OPERATION_ENABLED: u16 = 0x0237;
const SW_TARGET_REACHED: u16 = 0x0400;

/// A CiA 402 drive answering expedited SDO requests from its object dictionary.
pub struct SimulatedDrive {
    pub node_id: u8,
    /// (index, sub-index) -> (raw little-endian value, size in bytes)
    pub objects: BTreeMap<(u16, u8), ([u8; 4], u8)>,
    /// Status-word reads needed after a committed set-point before "target reached".
    pub travel_polls: u32,
    /// A stuck drive ignores every control word.
    pub stuck: bool,
    /// Answers boot-up on NMT reset.
    pub present: bool,
    remaining_polls: u32,
    last_control_word: u16,
}

impl SimulatedDrive {
    pub fn new(node_id: u8) -> Self {
        let mut drive = Self {
            node_id,
            objects: BTreeMap::new(),
            travel_polls: 2,
            stuck: false,
            present: true,
            remaining_polls: 0,
            last_control_word: 0,
        };
        drive.set(0x6040, 0x0000u16.to_le_bytes().as_slice());
        drive.set(0x6041, SW_SWITCH_ON_DISABLED.to_le_bytes().as_slice());
        drive.set(0x6060, &[0xFF]);
        drive.set(0x6061, &[0xFF]);
        drive.set(0x607A, 0i32.to_le_bytes().as_slice());
        drive.set(0x6064, 0i32.to_le_bytes().as_slice());
        drive
    }

    pub fn set(&mut self, index: u16, value: &[u8]) {
        let mut raw = [0u8; 4];
        raw[..value.len()].copy_from_slice(value);
        self.objects.insert((index, 0), (raw, value.len() as u8));
    }

    pub fn get_u16(&self, index: u16) -> u16 {
        let (raw, _) = self.objects[&(index, 0)];
        u16::from_le_bytes([raw[0], raw[1]])
    }

    pub fn get_i32(&self, index: u16) -> i32 {
        i32::from_le_bytes(self.objects[&(index, 0)].0)
    }

    pub fn status_word(&self) -> u16 {
        self.get_u16(0x6041)
    }

    fn set_status_word(&mut self, word: u16) {
        self.set(0x6041, &word.to_le_bytes());
    }

    fn reset(&mut self) {
        self.set_status_word(SW_SWITCH_ON_DISABLED);
        self.set(0x6040, &0u16.to_le_bytes());
        self.last_control_word = 0;
        self.remaining_polls = 0;
    }

    /// Handles one request frame and returns the response payload.
    fn handle_sdo(&mut self, request: &[u8]) -> [u8; 8] {
        let index = u16::from_le_bytes([request[1], request[2]]);
        let sub_index = request[3];
        let mut response = [0u8; 8];
        response[1..4].copy_from_slice(&request[1..4]);

        let abort = |mut response: [u8; 8], code: u32| {
            response[0] = 0x80;
            response[4..8].copy_from_slice(&code.to_le_bytes());
            response
        };

        match request[0] {
            0x40 => {
                if index == 0x6041 {
                    self.advance_motion();
                }
                let Some((raw, len)) = self.objects.get(&(index, sub_index)).copied() else {
                    return abort(response, ABORT_OBJECT_DOES_NOT_EXIST);
                };
                response[0] = 0x43 | ((4 - len) << 2);
                response[4..8].copy_from_slice(&raw);
                response
            }
            cs if cs & 0xF3 == 0x23 => {
                let len = 4 - ((cs >> 2) & 0x03) as usize;
                if !self.objects.contains_key(&(index, sub_index)) {
                    return abort(response, ABORT_OBJECT_DOES_NOT_EXIST);
                }
                let value = &request[4..4 + len];
                match index {
                    0x6040 => {
                        let cw = u16::from_le_bytes([value[0], value[1]]);
                        if !self.apply_control_word(cw) {
                            return abort(response, ABORT_INVALID_STATE);
                        }
                    }
                    0x6060 => self.set(0x6061, value),
                    _ => {}
                }
                self.set(index, value);
                response[0] = 0x60;
                response
            }
            _ => abort(response, 0x0504_0001),
        }
    }

    fn apply_control_word(&mut self, cw: u16) -> bool {
        let rising_set_point = cw & 0x0010 != 0 && self.last_control_word & 0x0010 == 0;
        self.last_control_word = cw;
        if self.stuck {
            return true;
        }
        let sw = self.status_word();
        let next = if sw == SW_SWITCH_ON_DISABLED && cw & 0x0087 == 0x0006 {
            SW_READY_TO_SWITCH_ON
        } else if sw == SW_READY_TO_SWITCH_ON && cw & 0x008F == 0x0007 {
            SW_SWITCHED_ON
        } else if sw == SW_SWITCHED_ON && cw & 0x008F == 0x000F {
            SW_OPERATION_ENABLED
        } else {
            sw
        };
        self.set_status_word(next);

        if rising_set_point {
            if next & 0x007F != SW_OPERATION_ENABLED & 0x007F {
                return false;
            }
            self.set_status_word(next & !SW_TARGET_REACHED);
            self.remaining_polls = self.travel_polls.max(1);
        }
        true
    }

    fn advance_motion(&mut self) {
        if self.remaining_polls == 0 {
            return;
        }
        self.remaining_polls -= 1;
        if self.remaining_polls == 0 && self.travel_polls != u32::MAX {
            let target = self.get_i32(0x607A);
            self.set(0x6064, &target.to_le_bytes());
            self.set_status_word(self.status_word() | SW_TARGET_REACHED);
        }
    }
}

/// A CAN bus populated with simulated drives.
///
/// Responses become visible after `latency_polls` empty polls, so the
/// non-blocking receive path is exercised on every exchange.
pub struct SimulatedCanInterface {
    pub drives: Vec<SimulatedDrive>,
    pub latency_polls: u32,
    /// Every frame sent by the code under test.
    pub history: Vec<CanFrame>,
    /// A frame from another device, put on the bus right after the next request.
    pub crosstalk: Option<CanFrame>,
    rx_queue: VecDeque<(u32, CanFrame)>,
}

impl SimulatedCanInterface {
    pub fn new(drives: Vec<SimulatedDrive>) -> Self {
        Self {
            drives,
            latency_polls: 2,
            history: Vec::new(),
            crosstalk: None,
            rx_queue: VecDeque::new(),
        }
    }

    pub fn drive(&self, node_id: u8) -> &SimulatedDrive {
        self.drives
            .iter()
            .find(|d| d.node_id == node_id)
            .expect("no such simulated drive")
    }

    pub fn drive_mut(&mut self, node_id: u8) -> &mut SimulatedDrive {
        self.drives
            .iter_mut()
            .find(|d| d.node_id == node_id)
            .expect("no such simulated drive")
    }

    /// Queues a frame as if some device had sent it before the next request.
    pub fn inject(&mut self, frame: CanFrame) {
        self.rx_queue.push_back((0, frame));
    }

    pub fn pending(&self) -> usize {
        self.rx_queue.len()
    }

    fn respond(&mut self, frame: CanFrame) {
        self.rx_queue.push_back((self.latency_polls, frame));
    }
}

impl CanInterface for SimulatedCanInterface {
    fn send_frame(&mut self, frame: &CanFrame) -> Result<(), RigError> {
        self.history.push(*frame);
        if let Some(stray) = self.crosstalk.take() {
            self.rx_queue.push_back((0, stray));
        }

        if frame.id() == 0x000 && frame.data() == [0x81, 0x00] {
            let mut boot_ups = Vec::new();
            for drive in self.drives.iter_mut().filter(|d| d.present) {
                drive.reset();
                boot_ups.push(CanFrame::new(0x700 + drive.node_id as u16, &[0x00]).unwrap());
            }
            for boot_up in boot_ups {
                self.respond(boot_up);
            }
            return Ok(());
        }

        if (0x601..=0x67F).contains(&frame.id()) {
            let node_id = (frame.id() - 0x600) as u8;
            let latency = self.latency_polls;
            if let Some(drive) = self.drives.iter_mut().find(|d| d.node_id == node_id && d.present) {
                let payload = drive.handle_sdo(frame.raw_data());
                let response = CanFrame::new(0x580 + node_id as u16, &payload).unwrap();
                self.rx_queue.push_back((latency, response));
            }
        }
        Ok(())
    }

    fn receive_frame(&mut self) -> Result<Option<CanFrame>, RigError> {
        match self.rx_queue.front_mut() {
            Some((0, _)) => Ok(self.rx_queue.pop_front().map(|(_, frame)| frame)),
            Some((delay, _)) => {
                *delay -= 1;
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
