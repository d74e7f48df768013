//! Per-move active maps filtered from the static templates.

use super::{PortPinMap, StaticMaps, WallSet};

/// Copy the entries of `walls` from `source` into `target`.
///
/// Accumulative: callers populate one target from several sources. Walls
/// are not deduplicated across calls.
pub fn apply(source: &PortPinMap, walls: WallSet, target: &mut PortPinMap) {
    if walls.is_empty() {
        return;
    }
    for (port, pin, wall) in source.entries() {
        if walls.contains(wall) {
            target.insert(port, pin, wall);
        }
    }
}

/// The two active maps a chamber carries through one move cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActiveMaps {
    /// Target limit switch of every moving wall.
    pub io: PortPinMap,
    /// Driven motor output of every moving wall.
    pub pwm: PortPinMap,
}

impl ActiveMaps {
    pub fn reset(&mut self) {
        self.io.clear();
        self.pwm.clear();
    }

    /// Rebuild both maps for a move. `up` and `down` must be disjoint.
    pub fn stage(&mut self, maps: &StaticMaps, up: WallSet, down: WallSet) {
        debug_assert!((up & down).is_empty());
        self.reset();
        apply(&maps.io_down, down, &mut self.io);
        apply(&maps.io_up, up, &mut self.io);
        apply(&maps.pwm_down, down, &mut self.pwm);
        apply(&maps.pwm_up, up, &mut self.pwm);
    }

    /// Retire an arrived wall from both maps.
    pub fn retire(&mut self, wall: u8) {
        self.io.remove_wall(wall);
        self.pwm.remove_wall(wall);
    }

    pub fn is_empty(&self) -> bool {
        self.io.is_empty() && self.pwm.is_empty()
    }
}
