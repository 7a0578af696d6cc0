use laserrig_rs::{CanFrame, CanInterface, RigError};
use log::{error, warn};
use socketcan::{CanSocket, EmbeddedFrame, ExtendedId, Id, Socket, StandardId};
use std::io::ErrorKind;

/// Raw SocketCAN socket in non-blocking mode.
pub struct SocketCanInterface {
    socket: CanSocket,
    name: String,
}

impl SocketCanInterface {
    /// Opens `interface_name` (e.g. `can0`).
    pub fn open(interface_name: &str) -> Result<Self, RigError> {
        let socket = CanSocket::open(interface_name).map_err(|e| {
            error!("[CAN] Failed to open '{}': {}", interface_name, e);
            RigError::TransportOpenFailed
        })?;
        socket.set_nonblocking(true).map_err(|e| {
            error!("[CAN] Failed to make '{}' non-blocking: {}", interface_name, e);
            RigError::TransportOpenFailed
        })?;
        Ok(Self {
            socket,
            name: interface_name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Closes the socket.
    pub fn close(self) {
        drop(self.socket);
    }
}

fn to_socketcan(frame: &CanFrame) -> Result<socketcan::CanFrame, RigError> {
    let id = if frame.is_extended() {
        ExtendedId::new(frame.id()).map(Id::Extended)
    } else {
        StandardId::new(frame.id() as u16).map(Id::Standard)
    }
    .ok_or(RigError::ProtocolError("CAN identifier out of range"))?;

    let raw = if frame.is_remote() {
        socketcan::CanFrame::new_remote(id, frame.len())
    } else {
        socketcan::CanFrame::new(id, frame.data())
    };
    raw.ok_or(RigError::ProtocolError("CAN payload longer than 8 bytes"))
}

fn from_socketcan(frame: &socketcan::CanFrame) -> Result<CanFrame, RigError> {
    let (id, extended) = match frame.id() {
        Id::Standard(id) => (id.as_raw() as u32, false),
        Id::Extended(id) => (id.as_raw(), true),
    };
    if frame.is_remote_frame() {
        CanFrame::new_remote(id, frame.dlc(), extended)
    } else if extended {
        CanFrame::new_extended(id, frame.data())
    } else {
        CanFrame::new(id as u16, frame.data())
    }
}

impl CanInterface for SocketCanInterface {
    fn send_frame(&mut self, frame: &CanFrame) -> Result<(), RigError> {
        let raw = to_socketcan(frame)?;
        self.socket.write_frame(&raw).map_err(|e| {
            error!("[CAN] {} write failed: {}", self.name, e);
            RigError::SendFailed
        })
    }

    fn receive_frame(&mut self) -> Result<Option<CanFrame>, RigError> {
        loop {
            match self.socket.read_frame() {
                Ok(socketcan::CanFrame::Error(err)) => {
                    warn!("[CAN] {} error frame skipped: {:?}", self.name, err);
                }
                Ok(raw) => return from_socketcan(&raw).map(Some),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
                Err(e) => {
                    error!("[CAN] {} read failed: {}", self.name, e);
                    return Err(RigError::IoError);
                }
            }
        }
    }
}
