//! Per-chip chamber state.

use crate::config::ErrorClearPolicy;
use crate::error::BusError;
use crate::pinmap::{ActiveMaps, StaticMaps, WallSet};
use crate::pins::WALL_COUNT;

use super::Direction;

/// Why a wall did not finish its move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    I2cError,
    Timeout,
}

/// Lifecycle of one wall across move batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WallState {
    #[default]
    Idle,
    Requested,
    Moving,
    Completed,
    Failed(FailureKind),
}

/// State of one expander chip and its 8 walls.
///
/// Position and move bits change only through the conductor; the accessors
/// are read-only.
#[derive(Debug, Clone)]
pub struct ChamberState {
    address: u8,
    status: Option<BusError>,
    position: WallSet,
    move_up: WallSet,
    move_down: WallSet,
    errors: WallSet,
    walls: [WallState; WALL_COUNT],
    active: ActiveMaps,
}

impl ChamberState {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            status: None,
            position: WallSet::EMPTY,
            move_up: WallSet::EMPTY,
            move_down: WallSet::EMPTY,
            errors: WallSet::EMPTY,
            walls: [WallState::Idle; WALL_COUNT],
            active: ActiveMaps::default(),
        }
    }

    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Last recorded transaction failure, `None` when healthy.
    pub const fn status(&self) -> Option<BusError> {
        self.status
    }

    /// Status byte as reported by the driver (`0` = success).
    pub const fn status_code(&self) -> u8 {
        match self.status {
            Some(e) => e.code(),
            None => 0,
        }
    }

    /// Walls currently up.
    pub const fn position(&self) -> WallSet {
        self.position
    }

    pub const fn move_up(&self) -> WallSet {
        self.move_up
    }

    pub const fn move_down(&self) -> WallSet {
        self.move_down
    }

    /// Walls whose last attempted move did not complete.
    pub const fn errors(&self) -> WallSet {
        self.errors
    }

    pub fn wall_state(&self, wall: u8) -> Option<WallState> {
        self.walls.get(wall as usize).copied()
    }

    pub const fn active(&self) -> &ActiveMaps {
        &self.active
    }

    pub fn pending(&self) -> WallSet {
        self.move_up | self.move_down
    }

    pub fn is_pending(&self) -> bool {
        !self.pending().is_empty()
    }

    pub(crate) fn record(&mut self, result: Result<(), BusError>) {
        self.status = result.err();
    }

    pub(crate) fn set_position(&mut self, up: WallSet) {
        self.position = up;
    }

    pub(crate) fn clear_errors(&mut self) {
        self.errors = WallSet::EMPTY;
    }

    /// Derive move bits from the target position. Returns whether any wall
    /// needs to move.
    pub(crate) fn stage(&mut self, target: WallSet, blocked: WallSet) -> bool {
        self.move_up = target.without(self.position).without(blocked);
        self.move_down = self.position.without(target).without(blocked);
        for wall in self.pending().iter() {
            self.walls[wall as usize] = WallState::Requested;
        }
        self.is_pending()
    }

    /// Rebuild the active maps from the staged move bits.
    pub(crate) fn begin_move(&mut self, maps: &StaticMaps) {
        self.active.stage(maps, self.move_up, self.move_down);
        for wall in self.pending().iter() {
            self.walls[wall as usize] = WallState::Moving;
        }
    }

    /// A wall hit its target switch.
    pub(crate) fn arrive(&mut self, wall: u8, direction: Direction, policy: ErrorClearPolicy) {
        self.active.retire(wall);
        match direction {
            Direction::Up => self.position.insert(wall),
            Direction::Down => self.position.remove(wall),
        }
        self.move_up.remove(wall);
        self.move_down.remove(wall);
        if policy == ErrorClearPolicy::OnSwitch {
            self.errors.remove(wall);
        }
        self.walls[wall as usize] = WallState::Completed;
    }

    /// Turn every leftover move bit into an error bit. Returns the failed walls.
    pub(crate) fn fail_pending(&mut self, kind: FailureKind) -> WallSet {
        let failed = self.pending();
        self.errors |= failed;
        for wall in failed.iter() {
            self.walls[wall as usize] = WallState::Failed(kind);
        }
        self.end_move();
        failed
    }

    pub(crate) fn end_move(&mut self) {
        self.move_up = WallSet::EMPTY;
        self.move_down = WallSet::EMPTY;
        self.active.reset();
    }
}
