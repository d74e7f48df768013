//! Static map construction from the wiring table.

use heapless::Vec;

use super::PortPinMap;
use crate::pins::{PORT_COUNT, Role, RoleTable, WallMap};

/// Build a static map from one or two role tables.
///
/// Output is ascending by port then pin regardless of wall order.
pub fn build(primary: &RoleTable, secondary: Option<&RoleTable>) -> PortPinMap {
    let tables = core::iter::once(primary).chain(secondary);

    let mut ports: Vec<u8, PORT_COUNT> = Vec::new();
    for loc in tables.clone().flatten() {
        if !ports.contains(&loc.port) {
            let _ = ports.push(loc.port);
        }
    }
    ports.sort_unstable();

    let mut map = PortPinMap::new();
    for &port in &ports {
        for table in tables.clone() {
            for (wall, loc) in table.iter().enumerate() {
                if loc.port == port {
                    map.insert(port, loc.pin, wall as u8);
                }
            }
        }
    }
    map
}

/// The six static maps used for chip configuration and as move templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticMaps {
    pub io_down: PortPinMap,
    pub io_up: PortPinMap,
    pub pwm_down: PortPinMap,
    pub pwm_up: PortPinMap,
    /// Both limit switches of every wall.
    pub io_all: PortPinMap,
    /// Both motor outputs of every wall.
    pub pwm_all: PortPinMap,
}

impl StaticMaps {
    pub fn from_wall_map(map: &WallMap) -> Self {
        let table = |role| map.table(role);
        Self {
            io_down: build(table(Role::SwitchDown), None),
            io_up: build(table(Role::SwitchUp), None),
            pwm_down: build(table(Role::PwmDown), None),
            pwm_up: build(table(Role::PwmUp), None),
            io_all: build(table(Role::SwitchDown), Some(table(Role::SwitchUp))),
            pwm_all: build(table(Role::PwmDown), Some(table(Role::PwmUp))),
        }
    }

    /// Static map for one role.
    pub const fn for_role(&self, role: Role) -> &PortPinMap {
        match role {
            Role::SwitchDown => &self.io_down,
            Role::SwitchUp => &self.io_up,
            Role::PwmDown => &self.pwm_down,
            Role::PwmUp => &self.pwm_up,
        }
    }
}
