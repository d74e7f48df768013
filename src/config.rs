//! Runtime configuration parameters
//!
//! All tunable parameters for the wall gate controller. Defaults match the
//! production maze rig; the host can override the motor parameters over the
//! serial link (message type 3).

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::pins::MAX_CHAMBERS;

/// When a wall's persistent error bit is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorClearPolicy {
    /// Clear as soon as the wall's target switch is observed during a move.
    #[default]
    OnSwitch,
    /// Keep until the registry is reset or errors are cleared explicitly.
    Latched,
}

/// Frame checksum variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChecksumMode {
    /// Sum of data bytes mod 256.
    DataOnly,
    /// Sum of data bytes plus the message type, mod 256.
    WithType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    pub baud_rate: u32,
    /// Maximum gap between two bytes of one frame before it is discarded.
    pub byte_timeout_ms: u16,
    pub rx_checksum: ChecksumMode,
    pub tx_checksum: ChecksumMode,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            byte_timeout_ms: 1000,
            rx_checksum: ChecksumMode::DataOnly,
            tx_checksum: ChecksumMode::WithType,
        }
    }
}

/// Core gate configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    // --- Motor drive ---
    /// PWM duty (0-255) applied to every wall motor.
    pub pwm_duty: u8,
    /// PWM period in source-clock ticks.
    pub pwm_period: u8,
    /// PWM source clock select (0 = 32 kHz).
    pub pwm_clock: u8,

    // --- Move batches ---
    /// Deadline for one move batch, measured from the end of the start phase.
    pub move_timeout_ms: u16,
    pub error_clear: ErrorClearPolicy,
    /// Allow walls with a persistent error to be requested again.
    pub retry_errored_walls: bool,

    // --- Bus ---
    /// Candidate 7-bit addresses probed during discovery, in registry order.
    pub chamber_addresses: Vec<u8, MAX_CHAMBERS>,

    pub serial: SerialConfig,
}

/// Address list of the 3×3 maze: 0x02, 0x04, ..., 0x12.
fn maze_addresses() -> Vec<u8, MAX_CHAMBERS> {
    (1..=MAX_CHAMBERS as u8).map(|n| n * 2).collect()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            pwm_duty: 255,
            pwm_period: 32,
            pwm_clock: 0,

            move_timeout_ms: 2000,
            error_clear: ErrorClearPolicy::OnSwitch,
            retry_errored_walls: true,

            chamber_addresses: maze_addresses(),

            serial: SerialConfig::default(),
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.move_timeout_ms == 0 {
            return Err(Error::Config("move timeout must be non-zero"));
        }
        if self.pwm_period == 0 {
            return Err(Error::Config("pwm period must be non-zero"));
        }
        if !(1..=5000).contains(&self.serial.byte_timeout_ms) {
            return Err(Error::Config("byte timeout outside 1..=5000 ms"));
        }
        // heapless caps the list when built in code; deserialised input is
        // checked by serde against the same capacity.
        if self.chamber_addresses.len() > MAX_CHAMBERS {
            return Err(Error::Config("too many chamber addresses"));
        }
        if self.chamber_addresses.iter().any(|&a| a > 0x7F) {
            return Err(Error::Config("chamber address is not 7-bit"));
        }
        Ok(())
    }
}
