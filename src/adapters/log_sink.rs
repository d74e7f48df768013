//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured gate events to the
//! logger (UART console on the ESP32).

use log::{info, warn};

use crate::app::events::GateEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`GateEvent`] to the console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &GateEvent) {
        match event {
            GateEvent::ChambersDiscovered(addrs) => {
                info!("SCAN  | {} chamber(s) at {:02X?}", addrs.len(), addrs.as_slice());
            }
            GateEvent::ChamberInitialised { chamber, result: Ok(()) } => {
                info!("INIT  | chamber {} ready", chamber);
            }
            GateEvent::ChamberInitialised { chamber, result: Err(e) } => {
                warn!("INIT  | chamber {} failed: status={} ({})", chamber, e.code(), e);
            }
            GateEvent::WallsDetected { chamber, up } => {
                info!("INIT  | chamber {} walls up=0b{:08b}", chamber, up.bits());
            }
            GateEvent::MoveStarted { chamber, up, down } => {
                info!(
                    "MOVE  | chamber {} up=0b{:08b} down=0b{:08b}",
                    chamber,
                    up.bits(),
                    down.bits()
                );
            }
            GateEvent::WallArrived { chamber, wall, direction, elapsed_ms } => {
                info!("ARRV  | chamber {} wall {} {:?} in {} ms", chamber, wall, direction, elapsed_ms);
            }
            GateEvent::ChamberFailed { chamber, walls, kind } => {
                warn!("FAIL  | chamber {} walls=0b{:08b} {:?}", chamber, walls.bits(), kind);
            }
            GateEvent::BatchFinished { status, elapsed_ms } => {
                info!("BATCH | {} (code {}) in {} ms", status, status.code(), elapsed_ms);
            }
        }
    }
}
