//! Wiring table for one chamber board, plus host MCU pin assignments.
//!
//! Single source of truth: every map, the conductor and the bench helpers
//! read the expander wiring from [`WALL_MAP`] rather than hard-coding
//! port/pin numbers. Every chamber board is wired identically.

// ---------------------------------------------------------------------------
// Expander geometry
// ---------------------------------------------------------------------------

/// Walls driven by one expander chip.
pub const WALL_COUNT: usize = 8;
/// GPIO ports used on the expander (GPort 0..5).
pub const PORT_COUNT: usize = 6;
/// Pins per port.
pub const PIN_COUNT: usize = 8;
/// Maximum number of chambers on the bus (3×3 maze).
pub const MAX_CHAMBERS: usize = 9;

/// A physical (port, pin) location on the expander.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortPin {
    pub port: u8,
    pub pin: u8,
}

const fn pp(port: u8, pin: u8) -> PortPin {
    PortPin { port, pin }
}

/// What a wired pin does for its wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Limit switch closed when the wall is fully down.
    SwitchDown,
    /// Limit switch closed when the wall is fully up.
    SwitchUp,
    /// Motor drive output lowering the wall.
    PwmDown,
    /// Motor drive output raising the wall.
    PwmUp,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::SwitchDown, Role::SwitchUp, Role::PwmDown, Role::PwmUp];
}

/// Per-wall (port, pin) for one role.
pub type RoleTable = [PortPin; WALL_COUNT];

/// Wall-indexed wiring of a chamber board.
#[derive(Debug, Clone, Copy)]
pub struct WallMap {
    /// PWM source channel feeding each wall's motor outputs.
    pub pwm_source: [u8; WALL_COUNT],
    pub switch_down: RoleTable,
    pub switch_up: RoleTable,
    pub pwm_down: RoleTable,
    pub pwm_up: RoleTable,
}

impl WallMap {
    pub const fn table(&self, role: Role) -> &RoleTable {
        match role {
            Role::SwitchDown => &self.switch_down,
            Role::SwitchUp => &self.switch_up,
            Role::PwmDown => &self.pwm_down,
            Role::PwmUp => &self.pwm_up,
        }
    }

    /// Reverse lookup: which role and wall a physical pin is wired to.
    pub fn function_at(&self, port: u8, pin: u8) -> Option<(Role, u8)> {
        Role::ALL.iter().find_map(|&role| {
            self.table(role)
                .iter()
                .position(|loc| loc.port == port && loc.pin == pin)
                .map(|wall| (role, wall as u8))
        })
    }
}

/// Production wiring of the gate board.
pub const WALL_MAP: WallMap = WallMap {
    pwm_source: [4, 6, 7, 5, 3, 1, 0, 2],
    switch_down: [
        pp(4, 3), pp(1, 3), pp(0, 1), pp(0, 7),
        pp(3, 2), pp(3, 4), pp(5, 0), pp(4, 7),
    ],
    switch_up: [
        pp(4, 0), pp(1, 2), pp(0, 2), pp(3, 0),
        pp(3, 3), pp(3, 5), pp(4, 5), pp(4, 4),
    ],
    pwm_down: [
        pp(1, 1), pp(1, 0), pp(0, 0), pp(3, 1),
        pp(5, 2), pp(5, 3), pp(5, 1), pp(4, 2),
    ],
    pwm_up: [
        pp(4, 1), pp(1, 4), pp(0, 4), pp(0, 5),
        pp(3, 6), pp(3, 7), pp(2, 2), pp(4, 6),
    ],
};

// ---------------------------------------------------------------------------
// Host MCU (ESP32) pins
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// Expander bus clock.
pub const I2C_FREQ_HZ: u32 = 400_000;

/// UART to the host PC.
pub const UART_TX_GPIO: i32 = 17;
pub const UART_RX_GPIO: i32 = 18;
