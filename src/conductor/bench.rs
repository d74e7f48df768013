//! Bench diagnostics for wiring checks on a single chamber.

use embedded_hal::delay::DelayNs;
use log::info;

use crate::app::ports::RegisterBus;
use crate::error::{Error, Result};
use crate::pinmap::{PortBytes, WallSet};
use crate::pins::WALL_COUNT;

use super::Conductor;

/// Both switch sets of one chamber from a single input read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchSnapshot {
    pub down: WallSet,
    pub up: WallSet,
}

impl SwitchSnapshot {
    /// Walls with both switches closed at once.
    pub fn conflicts(&self) -> WallSet {
        self.down & self.up
    }
}

impl Conductor {
    pub fn switch_snapshot(&self, hw: &mut impl RegisterBus, chamber: u8) -> Result<SwitchSnapshot> {
        let inputs = self.read_inputs(hw, chamber)?;
        let snap = SwitchSnapshot {
            down: self.maps.io_down.walls_asserted(&inputs),
            up: self.maps.io_up.walls_asserted(&inputs),
        };
        info!(
            "Chamber {} switches down=0b{:08b} up=0b{:08b}",
            chamber,
            snap.down.bits(),
            snap.up.bits()
        );
        Ok(snap)
    }

    /// Drive one wall up for `run_ms`, then down for `run_ms`, then release.
    ///
    /// The down output is asserted before the up output is released so the
    /// motor brakes instead of coasting. Ignores the switches.
    pub fn pulse_wall(
        &self,
        hw: &mut impl RegisterBus,
        delay: &mut impl DelayNs,
        chamber: u8,
        wall: u8,
        run_ms: u32,
    ) -> Result<()> {
        if wall as usize >= WALL_COUNT {
            return Err(Error::WallOutOfRange(wall));
        }
        let address = self.chamber(chamber)?.address();
        let only = WallSet::single(wall);
        let up: PortBytes = self.maps.pwm_up.mask_for(only);
        let down: PortBytes = self.maps.pwm_down.mask_for(only);

        info!("Chamber {} wall {}: pulse {} ms", chamber, wall, run_ms);
        hw.write_outputs(address, &up, true, None)?;
        delay.delay_ms(run_ms);
        hw.write_outputs(address, &down, true, None)?;
        hw.write_outputs(address, &up, false, None)?;
        delay.delay_ms(run_ms);
        hw.write_outputs(address, &down, false, None)?;
        Ok(())
    }
}
