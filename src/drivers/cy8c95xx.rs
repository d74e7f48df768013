//! CY8C95xx I/O expander driver over `embedded_hal::i2c::I2c`.
//!
//! One driver instance talks to every chip on the bus; the chip is chosen
//! per call by its 7-bit address. Register writes rely on the chip's
//! address auto-increment.
//!
//! ## Dual-target design
//!
//! On ESP-IDF the bus is `esp_idf_hal::i2c::I2cDriver`. On host/test it is
//! any `I2c` implementation (the simulated bank in the integration tests).

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};
use heapless::Vec;
use log::{debug, trace};

use crate::app::ports::{PwmSettings, RegisterBus};
use crate::error::BusError;
use crate::pinmap::PortBytes;
use crate::pins::{MAX_CHAMBERS, PORT_COUNT};
use crate::registers::{
    CMD_RECONFIGURE, CMD_RESTORE_DEFAULTS, COMMAND, LAST_REGISTER, OUTPUT_PORT0, PORT_SELECT,
    PWM_SELECT,
};

/// Largest burst the driver issues in one transaction (register byte
/// included).
pub const MAX_TRANSFER: usize = 32;

/// Number of PWM source channels on the chip.
pub const PWM_CHANNELS: u8 = 8;

/// Map an embedded-hal error onto the driver status codes.
pub fn bus_error(kind: ErrorKind) -> BusError {
    match kind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => BusError::AddressNack,
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => BusError::DataNack,
        _ => BusError::Other,
    }
}

/// Pulse width for `duty` (0-255) over `period` ticks.
pub const fn pulse_width(duty: u8, period: u8) -> u8 {
    if period == 0 {
        return 0;
    }
    ((duty as u16 * (period as u16 - 1)) / 255) as u8
}

pub struct Cy8c95xx<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Cy8c95xx<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    fn write_block(&mut self, addr: u8, reg: u8, data: &[u8]) -> Result<(), BusError> {
        if data.len() + 1 > MAX_TRANSFER {
            return Err(BusError::PayloadTooLarge);
        }
        if usize::from(reg) + data.len() > usize::from(LAST_REGISTER) + 1 {
            return Err(BusError::InvalidArgument);
        }
        let mut frame: Vec<u8, MAX_TRANSFER> = Vec::new();
        let _ = frame.push(reg);
        let _ = frame.extend_from_slice(data);
        trace!("i2c {:02X} <- {:02X?}", addr, frame.as_slice());
        self.i2c.write(addr, &frame).map_err(|e| bus_error(e.kind()))
    }

    fn read_outputs(&mut self, addr: u8) -> Result<PortBytes, BusError> {
        let mut buf = [0u8; PORT_COUNT];
        self.read_registers(addr, OUTPUT_PORT0, &mut buf)?;
        Ok(PortBytes(buf))
    }
}

impl<I2C: I2c> RegisterBus for Cy8c95xx<I2C> {
    fn scan(&mut self, candidates: &[u8]) -> Vec<u8, MAX_CHAMBERS> {
        let mut found = Vec::new();
        for &addr in candidates {
            match self.i2c.write(addr, &[]) {
                Ok(()) => {
                    if found.push(addr).is_err() {
                        break;
                    }
                }
                Err(e) => debug!("No chip at {:02X}: {:?}", addr, e.kind()),
            }
        }
        found
    }

    fn read_registers(&mut self, addr: u8, start: u8, buf: &mut [u8]) -> Result<(), BusError> {
        if buf.len() > MAX_TRANSFER {
            return Err(BusError::PayloadTooLarge);
        }
        if usize::from(start) + buf.len() > usize::from(LAST_REGISTER) + 1 {
            return Err(BusError::InvalidArgument);
        }
        self.i2c
            .write_read(addr, &[start], buf)
            .map_err(|e| bus_error(e.kind()))
    }

    fn write_outputs(
        &mut self,
        addr: u8,
        mask: &PortBytes,
        level: bool,
        snapshot: Option<&PortBytes>,
    ) -> Result<(), BusError> {
        let current = match snapshot {
            Some(s) => *s,
            None => self.read_outputs(addr)?,
        };
        let next = mask.apply_to(&current, level);
        self.write_block(addr, OUTPUT_PORT0, &next.0)
    }

    fn configure_chip(&mut self, addr: u8) -> Result<(), BusError> {
        self.write_block(addr, COMMAND, &[CMD_RESTORE_DEFAULTS])?;
        self.write_block(addr, COMMAND, &[CMD_RECONFIGURE])
    }

    fn configure_pwm_source(
        &mut self,
        addr: u8,
        channel: u8,
        settings: PwmSettings,
    ) -> Result<(), BusError> {
        if channel >= PWM_CHANNELS || settings.period == 0 {
            return Err(BusError::InvalidArgument);
        }
        let pw = pulse_width(settings.duty, settings.period);
        // select, config (clock), period, pulse width
        self.write_block(addr, PWM_SELECT, &[channel, settings.clock, settings.period, pw])
    }

    fn set_port_register(
        &mut self,
        addr: u8,
        reg: u8,
        port: u8,
        mask: u8,
        level: bool,
    ) -> Result<(), BusError> {
        if usize::from(port) >= PORT_COUNT || reg > LAST_REGISTER {
            return Err(BusError::InvalidArgument);
        }
        self.write_block(addr, PORT_SELECT, &[port])?;
        let mut current = [0u8];
        self.read_registers(addr, reg, &mut current)?;
        let value = if level { current[0] | mask } else { current[0] & !mask };
        self.write_block(addr, reg, &[value])
    }
}
