use crate::ds402::DriveState;
use crate::frame::CanFrame;
use crate::types::{NodeId, NodeIdError};
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

/// Defines a portable, descriptive Error type for the rig protocol stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigError {
    /// The CAN interface or serial channel could not be opened.
    TransportOpenFailed,
    /// The transport refused to send a frame.
    SendFailed,
    /// An underlying I/O error occurred while receiving.
    IoError,
    /// No matching response arrived within the watchdog budget.
    Timeout,
    /// The caller's cancellation signal was raised.
    Cancelled,
    /// A frame came from, or was addressed to, a node other than the expected one.
    UnexpectedNode {
        /// The node the exchange was meant for, if there is a single one.
        expected: Option<NodeId>,
        /// The identifier of the offending frame.
        cob_id: u32,
    },
    /// The device refused the request (SDO abort).
    DeviceRejected {
        /// SDO abort code carried in bytes 4-7 of the abort frame.
        abort_code: u32,
    },
    /// The drive reported a state from which no transition is modelled.
    UnexpectedState(DriveState),
    /// The drive did not reach the target state within the configured number of transitions.
    TransitionLimit,
    /// An expected node never announced itself during discovery.
    NodeNotFound(NodeId),
    /// A value is not a valid NodeId.
    InvalidNodeId(u8),
    /// An expedited register access must carry 1 to 4 bytes.
    InvalidRegisterSize(usize),
    /// The requested focal power is outside the range reported by the lens.
    OutOfRange {
        requested: i32,
        min: i16,
        max: i16,
    },
    /// The lens session is not in the state required for this command.
    NotReady,
    /// A reply was malformed or had the wrong length.
    ProtocolError(&'static str),
    /// A frame checksum did not match its content.
    CrcMismatch {
        expected: u16,
        actual: u16,
    },
}

impl fmt::Display for RigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportOpenFailed => write!(f, "Failed to open the transport"),
            Self::SendFailed => write!(f, "The transport failed to send the request"),
            Self::IoError => write!(f, "An underlying I/O error occurred"),
            Self::Timeout => write!(f, "No response received before the watchdog expired"),
            Self::Cancelled => write!(f, "Operation cancelled"),
            Self::UnexpectedNode { expected: Some(node), cob_id } => {
                write!(f, "Unexpected frame {cob_id:#05x} while talking to node {node}")
            }
            Self::UnexpectedNode { expected: None, cob_id } => {
                write!(f, "Unexpected CAN node (frame {cob_id:#05x})")
            }
            Self::DeviceRejected { abort_code } => {
                write!(f, "Device rejected the request (abort code {abort_code:#010x})")
            }
            Self::UnexpectedState(state) => write!(f, "Unexpected drive state: {state}"),
            Self::TransitionLimit => write!(f, "Drive did not reach 'Operation enabled' in time"),
            Self::NodeNotFound(node) => write!(f, "Node {node} has not been found"),
            Self::InvalidNodeId(v) => write!(f, "Invalid NodeId value: {v}"),
            Self::InvalidRegisterSize(v) => write!(f, "Invalid register size: {v} (expected 1-4 bytes)"),
            Self::OutOfRange { requested, min, max } => {
                write!(f, "Focal power {requested} is not in the lens range [{min}, {max}]")
            }
            Self::NotReady => write!(f, "Lens session is not ready for this command"),
            Self::ProtocolError(s) => write!(f, "Protocol error: {s}"),
            Self::CrcMismatch { expected, actual } => {
                write!(f, "CRC mismatch: expected {expected:#06x}, got {actual:#06x}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RigError {}

// --- From Implementations for Error Conversion ---

impl From<NodeIdError> for RigError {
    fn from(err: NodeIdError) -> Self {
        match err {
            NodeIdError::InvalidRange(val) => RigError::InvalidNodeId(val),
        }
    }
}

/// Hardware Abstraction Layer (HAL) for CAN frame transmission.
///
/// This trait abstracts the physical sending and receiving of CAN frames,
/// enabling the protocol logic to remain platform-agnostic (no_std) and
/// to be driven by a simulated bus in tests.
pub trait CanInterface {
    /// Sends a single frame on the bus.
    fn send_frame(&mut self, frame: &CanFrame) -> Result<(), RigError>;

    /// Polls for one received frame without blocking.
    ///
    /// Returns `Ok(None)` when nothing is queued.
    fn receive_frame(&mut self) -> Result<Option<CanFrame>, RigError>;
}

/// HAL for a raw byte-oriented serial line.
pub trait SerialChannel {
    /// Writes `bytes` to the line, returning how many were accepted.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize, RigError>;

    /// Reads whatever is available into `buffer` (bounded by the channel's own
    /// read timeout). Returns 0 when nothing arrived.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, RigError>;
}

/// Monotonic time source used for watchdogs and settle delays.
pub trait Clock {
    /// Microseconds elapsed since an arbitrary, fixed origin.
    fn now_us(&self) -> u64;

    /// Suspends the caller for `duration_us` microseconds.
    fn delay_us(&mut self, duration_us: u64);
}

/// Cancellation signal checked by every unbounded polling loop.
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

/// A cancellation signal that is never raised.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl Cancellation for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: Cancellation + ?Sized> Cancellation for &T {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// `Instant`-based clock for hosted targets.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_us(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }

    fn delay_us(&mut self, duration_us: u64) {
        std::thread::sleep(std::time::Duration::from_micros(duration_us));
    }
}
