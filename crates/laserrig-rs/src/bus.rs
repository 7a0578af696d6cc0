// crates/laserrig-rs/src/bus.rs
//! Watchdog-bounded access to a CAN interface.
//!
//! `CanBus` owns the transport handle and the clock. It provides the three
//! primitives every request/response exchange is built from: flushing stale
//! frames, transmitting, and polling for the next frame until a deadline.

use crate::frame::CanFrame;
use crate::hal::{CanInterface, Clock, RigError};
use crate::log::wire_trace;
use log::{error, warn};

pub struct CanBus<I: CanInterface, C: Clock> {
    interface: I,
    clock: C,
    watchdog_us: u64,
}

impl<I: CanInterface, C: Clock> CanBus<I, C> {
    pub fn new(interface: I, clock: C, watchdog_us: u64) -> Self {
        Self {
            interface,
            clock,
            watchdog_us,
        }
    }

    /// The single-exchange watchdog budget in microseconds.
    pub fn watchdog_us(&self) -> u64 {
        self.watchdog_us
    }

    pub fn set_watchdog_us(&mut self, watchdog_us: u64) {
        self.watchdog_us = watchdog_us;
    }

    pub fn now_us(&self) -> u64 {
        self.clock.now_us()
    }

    pub fn delay_us(&mut self, duration_us: u64) {
        self.clock.delay_us(duration_us);
    }

    pub fn interface(&self) -> &I {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    /// Consumes the bus and hands back the transport, e.g. to close it.
    pub fn into_parts(self) -> (I, C) {
        (self.interface, self.clock)
    }

    /// Drops every frame already queued on the interface.
    ///
    /// Each drained frame is logged as unexpected. Returns the number of frames dropped.
    /// Fails with `Timeout` if the queue is still not empty after one watchdog window.
    pub fn flush_stale(&mut self, context: &str) -> Result<usize, RigError> {
        let deadline = self.clock.now_us().saturating_add(self.watchdog_us);
        let mut dropped = 0;
        while let Some(frame) = self.interface.receive_frame()? {
            warn!("[CAN] Unexpected CAN frame - {}", context);
            wire_trace!("rx {}", frame);
            dropped += 1;
            if self.clock.now_us() >= deadline {
                error!("[CAN] Bus still busy after dropping {} frame(s) - {}", dropped, context);
                return Err(RigError::Timeout);
            }
        }
        Ok(dropped)
    }

    /// Sends a frame and records it in the wire trace.
    pub fn transmit(&mut self, frame: &CanFrame, context: &str) -> Result<(), RigError> {
        if let Err(e) = self.interface.send_frame(frame) {
            error!("[CAN] Failed to send the request - {}: {}", context, e);
            return Err(RigError::SendFailed);
        }
        wire_trace!("tx {}", frame);
        Ok(())
    }

    /// Polls the interface until a frame arrives or `deadline_us` passes.
    pub fn receive_until(&mut self, deadline_us: u64) -> Result<CanFrame, RigError> {
        loop {
            if let Some(frame) = self.interface.receive_frame()? {
                wire_trace!("rx {}", frame);
                return Ok(frame);
            }
            if self.clock.now_us() >= deadline_us {
                return Err(RigError::Timeout);
            }
        }
    }

    /// Polls for the next frame within one watchdog window starting now.
    pub fn receive_within_watchdog(&mut self) -> Result<CanFrame, RigError> {
        let deadline = self.clock.now_us().saturating_add(self.watchdog_us);
        self.receive_until(deadline)
    }
}
