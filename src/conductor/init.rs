//! Registry setup, chip initialisation and full-travel wall cycles.

use heapless::Vec;
use log::{info, warn};

use crate::app::events::GateEvent;
use crate::app::ports::{Clock, EventSink, PwmSettings, RegisterBus};
use crate::error::BusError;
use crate::pinmap::PortBytes;
use crate::pins::{MAX_CHAMBERS, PORT_COUNT};
use crate::registers::{DriveMode, INPUT_PORT0, PIN_DIRECTION, SELECT_PWM_OUTPUT};

use super::{ChamberState, Conductor, Direction, RunStatus};

impl Conductor {
    /// Rebuild the registry from discovered addresses, in discovery order.
    /// Extra addresses beyond the chamber limit are dropped.
    pub fn reset_registry(&mut self, addresses: &[u8]) {
        self.chambers.clear();
        for &address in addresses.iter().take(MAX_CHAMBERS) {
            let _ = self.chambers.push(ChamberState::new(address));
        }
        if addresses.len() > MAX_CHAMBERS {
            warn!("Registry holds {} chambers; {} ignored", MAX_CHAMBERS, addresses.len() - MAX_CHAMBERS);
        }
    }

    /// Scan the configured candidate addresses and reset the registry.
    pub fn discover(
        &mut self,
        hw: &mut impl RegisterBus,
        sink: &mut impl EventSink,
    ) -> Vec<u8, MAX_CHAMBERS> {
        let found = hw.scan(&self.config.chamber_addresses);
        info!("Discovered {} chamber(s): {:02X?}", found.len(), found.as_slice());
        self.reset_registry(&found);
        sink.emit(&GateEvent::ChambersDiscovered(found.clone()));
        found
    }

    /// Configure every healthy chamber. Returns the first failure.
    pub fn init_chambers(
        &mut self,
        hw: &mut impl RegisterBus,
        sink: &mut impl EventSink,
    ) -> Result<(), BusError> {
        let mut first_error = None;
        for index in 0..self.chambers.len() {
            if let Some(e) = self.chambers[index].status() {
                warn!("Chamber {} not initialised: flagged with {}", index, e);
                first_error.get_or_insert(e);
                continue;
            }
            let result = self.init_chamber(hw, sink, index);
            self.chambers[index].record(result);
            sink.emit(&GateEvent::ChamberInitialised { chamber: index as u8, result });
            if let Err(e) = result {
                warn!("Chamber {} init failed: {}", index, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn init_chamber(
        &mut self,
        hw: &mut impl RegisterBus,
        sink: &mut impl EventSink,
        index: usize,
    ) -> Result<(), BusError> {
        let address = self.chambers[index].address();
        hw.configure_chip(address)?;
        self.configure_io(hw, address)?;

        // Position is read before PWM setup, which can nudge the motors.
        let mut buf = [0u8; PORT_COUNT];
        hw.read_registers(address, INPUT_PORT0, &mut buf)?;
        let up = self.maps.io_up.walls_asserted(&PortBytes(buf));
        self.chambers[index].set_position(up);
        sink.emit(&GateEvent::WallsDetected { chamber: index as u8, up });

        self.configure_pwm(hw, address)
    }

    fn configure_io(&self, hw: &mut impl RegisterBus, address: u8) -> Result<(), BusError> {
        hw.write_outputs(address, &PortBytes::ALL, false, Some(&PortBytes::ZERO))?;
        let io = self.maps.io_all.union();
        for (port, mask) in io.ports() {
            hw.set_port_register(address, PIN_DIRECTION, port, mask, true)?;
            hw.set_port_register(address, DriveMode::PullDown.register(), port, mask, true)?;
        }
        // Input pins also need their output bit held at 1.
        hw.write_outputs(address, io, true, Some(&PortBytes::ZERO))
    }

    fn configure_pwm(&self, hw: &mut impl RegisterBus, address: u8) -> Result<(), BusError> {
        let settings = PwmSettings {
            clock: self.config.pwm_clock,
            period: self.config.pwm_period,
            duty: self.config.pwm_duty,
        };
        let mut programmed = 0u8;
        for &channel in &self.wiring.pwm_source {
            if programmed & (1 << (channel & 7)) == 0 {
                hw.configure_pwm_source(address, channel, settings)?;
                programmed |= 1 << (channel & 7);
            }
        }
        for (port, mask) in self.maps.pwm_all.union().ports() {
            hw.set_port_register(address, SELECT_PWM_OUTPUT, port, mask, true)?;
            hw.set_port_register(address, DriveMode::Strong.register(), port, mask, true)?;
        }
        Ok(())
    }

    /// Drive every wall of every chamber to one end of travel.
    pub fn init_walls(
        &mut self,
        hw: &mut (impl RegisterBus + Clock),
        sink: &mut impl EventSink,
        direction: Direction,
    ) -> RunStatus {
        info!("Initialising walls {:?}", direction);
        for index in 0..self.chambers.len() as u8 {
            // Only out-of-range can fail and the index comes from the registry.
            let _ = self.set_walls_to_move(index, direction.all_walls());
        }
        self.run_batch(hw, sink)
    }
}
