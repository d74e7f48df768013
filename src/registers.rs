//! CY8C95xx register map (the subset this firmware touches).

/// Input port registers GPort0..5 (read-only). 0x06/0x07 are unused.
pub const INPUT_PORT0: u8 = 0x00;
/// Output port registers GPort0..5.
pub const OUTPUT_PORT0: u8 = 0x08;

/// Bytes in one combined poll: six inputs, two unused, six outputs.
pub const POLL_SPAN: usize = (OUTPUT_PORT0 - INPUT_PORT0) as usize + crate::pins::PORT_COUNT;

pub const PORT_SELECT: u8 = 0x18;
pub const INTERRUPT_MASK: u8 = 0x19;
/// Per-pin select between GPIO output and PWM output.
pub const SELECT_PWM_OUTPUT: u8 = 0x1A;
pub const INVERSION: u8 = 0x1B;
/// Pin direction, `1` = input.
pub const PIN_DIRECTION: u8 = 0x1C;

// Drive mode registers (port-select scoped; writing `1` selects the mode).
pub const DRIVE_PULL_UP: u8 = 0x1D;
pub const DRIVE_PULL_DOWN: u8 = 0x1E;
pub const DRIVE_OPEN_HIGH: u8 = 0x1F;
pub const DRIVE_OPEN_LOW: u8 = 0x20;
pub const DRIVE_STRONG: u8 = 0x21;
pub const DRIVE_SLOW_STRONG: u8 = 0x22;
pub const DRIVE_HIGH_Z: u8 = 0x23;

// PWM source block, auto-increments from `PWM_SELECT`.
pub const PWM_SELECT: u8 = 0x28;
pub const PWM_CONFIG: u8 = 0x29;
pub const PWM_PERIOD: u8 = 0x2A;
pub const PWM_PULSE_WIDTH: u8 = 0x2B;

pub const ENABLE: u8 = 0x2D;
pub const DEVICE_STATUS: u8 = 0x2E;
pub const COMMAND: u8 = 0x30;

pub const CMD_RESTORE_DEFAULTS: u8 = 0x02;
pub const CMD_RECONFIGURE: u8 = 0x07;

/// Highest register address on the chip.
pub const LAST_REGISTER: u8 = COMMAND;

/// Drive-mode register for a pin mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    PullDown,
    Strong,
}

impl DriveMode {
    pub const fn register(self) -> u8 {
        match self {
            Self::PullDown => DRIVE_PULL_DOWN,
            Self::Strong => DRIVE_STRONG,
        }
    }
}
