//! Hardware adapter: bridges the expander driver and the system clock to
//! the domain port traits.
//!
//! The conductor takes one `hw: &mut (impl RegisterBus + Clock)`, so bus and
//! clock travel together without a double mutable borrow.

use embedded_hal::i2c::I2c;
use heapless::Vec;

use crate::app::ports::{Clock, PwmSettings, RegisterBus};
use crate::drivers::Cy8c95xx;
use crate::error::BusError;
use crate::pinmap::PortBytes;
use crate::pins::MAX_CHAMBERS;

/// Concrete adapter combining the I2C expander driver with a clock.
pub struct HardwareAdapter<I2C, C> {
    bus: Cy8c95xx<I2C>,
    clock: C,
}

impl<I2C: I2c, C: Clock> HardwareAdapter<I2C, C> {
    pub fn new(bus: Cy8c95xx<I2C>, clock: C) -> Self {
        Self { bus, clock }
    }
}

// ── RegisterBus implementation ────────────────────────────────

impl<I2C: I2c, C: Clock> RegisterBus for HardwareAdapter<I2C, C> {
    fn scan(&mut self, candidates: &[u8]) -> Vec<u8, MAX_CHAMBERS> {
        self.bus.scan(candidates)
    }

    fn read_registers(&mut self, addr: u8, start: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.bus.read_registers(addr, start, buf)
    }

    fn write_outputs(
        &mut self,
        addr: u8,
        mask: &PortBytes,
        level: bool,
        snapshot: Option<&PortBytes>,
    ) -> Result<(), BusError> {
        self.bus.write_outputs(addr, mask, level, snapshot)
    }

    fn configure_chip(&mut self, addr: u8) -> Result<(), BusError> {
        self.bus.configure_chip(addr)
    }

    fn configure_pwm_source(
        &mut self,
        addr: u8,
        channel: u8,
        settings: PwmSettings,
    ) -> Result<(), BusError> {
        self.bus.configure_pwm_source(addr, channel, settings)
    }

    fn set_port_register(
        &mut self,
        addr: u8,
        reg: u8,
        port: u8,
        mask: u8,
        level: bool,
    ) -> Result<(), BusError> {
        self.bus.set_port_register(addr, reg, port, mask, level)
    }
}

// ── Clock implementation ──────────────────────────────────────

impl<I2C: I2c, C: Clock> Clock for HardwareAdapter<I2C, C> {
    fn now_ms(&self) -> u32 {
        self.clock.now_ms()
    }
}
