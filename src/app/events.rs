//! Outbound domain events.
//!
//! The conductor and [`GateService`](super::service::GateService) emit these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters decide
//! where they go (serial log, test recorder).

use heapless::Vec;

use crate::conductor::{Direction, FailureKind, RunStatus};
use crate::error::BusError;
use crate::pinmap::WallSet;
use crate::pins::MAX_CHAMBERS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    /// Bus scan finished; addresses in registry order.
    ChambersDiscovered(Vec<u8, MAX_CHAMBERS>),

    /// Chip setup for one chamber finished (with its status).
    ChamberInitialised {
        chamber: u8,
        result: Result<(), BusError>,
    },

    /// Walls found already resting on a switch during chamber setup.
    WallsDetected { chamber: u8, up: WallSet },

    /// Motors of one chamber switched on.
    MoveStarted { chamber: u8, up: WallSet, down: WallSet },

    /// A wall reached its target switch.
    WallArrived {
        chamber: u8,
        wall: u8,
        direction: Direction,
        elapsed_ms: u32,
    },

    /// Walls of one chamber left unfinished at the end of a batch.
    ChamberFailed {
        chamber: u8,
        walls: WallSet,
        kind: FailureKind,
    },

    /// A move batch finished.
    BatchFinished { status: RunStatus, elapsed_ms: u32 },
}
