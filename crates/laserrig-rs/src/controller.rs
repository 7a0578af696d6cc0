// crates/laserrig-rs/src/controller.rs
//! Two-axis mirror controller: discovery, drive configuration and coordinated moves.

use crate::bus::CanBus;
use crate::config::RigConfig;
use crate::ds402::drive::{configure_node, read_control_word, read_node_status};
use crate::ds402::NodeStatus;
use crate::hal::{CanInterface, Cancellation, Clock, RigError};
use crate::motion::{move_to, wait_until_arrived};
use crate::nmt::discover_nodes;
use crate::sdo::SdoClient;
use log::{error, info};

/// Owns the CAN bus and drives both mirror axes described by a `RigConfig`.
pub struct MirrorController<I: CanInterface, C: Clock> {
    sdo: SdoClient<I, C>,
    config: RigConfig,
}

impl<I: CanInterface, C: Clock> MirrorController<I, C> {
    pub fn new(interface: I, clock: C, config: RigConfig) -> Self {
        let bus = CanBus::new(interface, clock, config.timing.watchdog_us);
        Self {
            sdo: SdoClient::new(bus, config.abort_policy),
            config,
        }
    }

    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    pub fn sdo(&mut self) -> &mut SdoClient<I, C> {
        &mut self.sdo
    }

    /// Consumes the controller and returns the transport and clock.
    pub fn into_parts(self) -> (I, C) {
        self.sdo.into_bus().into_parts()
    }

    /// Resets the bus, waits for both mirrors to boot, and reports their status.
    pub fn connect(&mut self) -> Result<[NodeStatus; 2], RigError> {
        let nodes = self.config.mirror_nodes();
        discover_nodes(self.sdo.bus_mut(), &nodes, self.config.timing.discovery_timeout_us)?;
        info!("[RIG] Connection OK");
        self.status_report()
    }

    /// Reads the status and mode of both mirrors.
    pub fn status_report(&mut self) -> Result<[NodeStatus; 2], RigError> {
        let [first, second] = self.config.mirror_nodes();
        Ok([
            read_node_status(&mut self.sdo, &self.config.registers, first)?,
            read_node_status(&mut self.sdo, &self.config.registers, second)?,
        ])
    }

    /// Brings both mirrors to "Operation enabled" in Profile Position mode.
    ///
    /// Stops at the first mirror that fails; the second one is left untouched.
    pub fn configure_mirrors(&mut self, cancel: &impl Cancellation) -> Result<[NodeStatus; 2], RigError> {
        for node in self.config.mirror_nodes() {
            configure_node(
                &mut self.sdo,
                &self.config.registers,
                node,
                self.config.timing.max_state_transitions,
                cancel,
            )
            .inspect_err(|e| error!("[RIG] Error configuring the node {}: {}", node, e))?;
        }
        self.status_report()
    }

    /// Moves both mirrors to the given angles (millidegrees) and waits for both to arrive.
    pub fn move_to_angles(&mut self, phi1: i32, phi2: i32, cancel: &impl Cancellation) -> Result<(), RigError> {
        let regs = self.config.registers;
        let [first, second] = self.config.mirrors;

        let cw1 = read_control_word(&mut self.sdo, &regs, first.node_id)?;
        let cw2 = read_control_word(&mut self.sdo, &regs, second.node_id)?;

        let target1 = first
            .offset
            .checked_add(phi1)
            .ok_or(RigError::ProtocolError("Target position overflows"))?;
        let target2 = second
            .offset
            .checked_add(phi2)
            .ok_or(RigError::ProtocolError("Target position overflows"))?;

        move_to(&mut self.sdo, &regs, first.node_id, target1, cw1)?;
        move_to(&mut self.sdo, &regs, second.node_id, target2, cw2)?;

        info!("[RIG] Waiting for the mirrors to arrive");
        wait_until_arrived(
            &mut self.sdo,
            &regs,
            &[first.node_id, second.node_id],
            self.config.timing.arrival_timeout_us,
            self.config.timing.arrival_poll_interval_us,
            cancel,
        )?;
        info!("[RIG] Mirrors arrived at ({}, {})", phi1, phi2);
        Ok(())
    }

    /// Actual encoder positions of both mirrors as `(raw, raw - offset)`.
    pub fn actual_positions(&mut self) -> Result<[(i32, i32); 2], RigError> {
        let regs = self.config.registers;
        let mut out = [(0, 0); 2];
        for (slot, mirror) in out.iter_mut().zip(self.config.mirrors) {
            let raw = self.sdo.read_i32(mirror.node_id, regs.position_actual)?;
            *slot = (raw, raw.wrapping_sub(mirror.offset));
        }
        Ok(out)
    }
}
