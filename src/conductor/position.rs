//! Limit-switch position reader.

use crate::app::ports::RegisterBus;
use crate::error::{Error, Result};
use crate::pinmap::{PortBytes, WallSet};
use crate::pins::PORT_COUNT;
use crate::registers::INPUT_PORT0;

use super::{Conductor, Direction};

impl Conductor {
    /// Walls whose `direction` switch is currently closed.
    ///
    /// One input-port read; move state is left untouched.
    pub fn read_position(
        &self,
        hw: &mut impl RegisterBus,
        chamber: u8,
        direction: Direction,
    ) -> Result<WallSet> {
        let inputs = self.read_inputs(hw, chamber)?;
        Ok(self.maps.for_role(direction.switch()).walls_asserted(&inputs))
    }

    pub(super) fn read_inputs(&self, hw: &mut impl RegisterBus, chamber: u8) -> Result<PortBytes> {
        let address = self.chamber(chamber)?.address();
        let mut buf = [0u8; PORT_COUNT];
        hw.read_registers(address, INPUT_PORT0, &mut buf)
            .map_err(Error::Bus)?;
        Ok(PortBytes(buf))
    }
}
