//! Gate service: the hexagonal core.
//!
//! [`GateService`] owns the [`Conductor`] and turns host commands into
//! conductor operations and response payloads. All I/O flows through port
//! traits injected at call sites.
//!
//! ```text
//!  RegisterBus ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                  │      GateService        │
//!        Clock ──▶ │  Conductor · registry   │
//!                  └────────────────────────┘
//! ```

use heapless::Vec;
use log::{info, warn};

use crate::conductor::{Conductor, Direction, RunStatus};
use crate::config::GateConfig;
use crate::pinmap::WallSet;
use crate::serial::MAX_PAYLOAD;

use super::commands::HostCommand;
use super::ports::{Clock, EventSink, RegisterBus};

/// Response payload for one host command.
pub type Response = Vec<u8, MAX_PAYLOAD>;

pub struct GateService {
    conductor: Conductor,
    /// Work to run once the response has gone out.
    deferred: Option<Direction>,
    last_status: Option<RunStatus>,
}

impl GateService {
    pub fn new(config: GateConfig) -> Self {
        Self {
            conductor: Conductor::new(config),
            deferred: None,
            last_status: None,
        }
    }

    pub fn conductor(&self) -> &Conductor {
        &self.conductor
    }

    pub fn conductor_mut(&mut self) -> &mut Conductor {
        &mut self.conductor
    }

    /// Status of the most recent move batch.
    pub fn last_status(&self) -> Option<RunStatus> {
        self.last_status
    }

    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    // ── Command handling ──────────────────────────────────────

    /// Handle one decoded frame. `None` means no response is sent.
    pub fn handle_frame(
        &mut self,
        msg_type: u8,
        data: &[u8],
        hw: &mut (impl RegisterBus + Clock),
        sink: &mut impl EventSink,
    ) -> Option<Response> {
        let cmd = HostCommand::parse(msg_type, data)?;
        Some(self.handle_command(cmd, hw, sink))
    }

    pub fn handle_command(
        &mut self,
        cmd: HostCommand,
        hw: &mut (impl RegisterBus + Clock),
        sink: &mut impl EventSink,
    ) -> Response {
        // Leftover work from a response that was never flushed.
        self.run_deferred(hw, sink);

        match cmd {
            HostCommand::Discover => {
                let found = self.conductor.discover(hw, sink);
                if let Err(e) = self.conductor.init_chambers(hw, sink) {
                    warn!("Chamber initialisation incomplete: {}", e);
                }
                collect(&found)
            }
            HostCommand::InitWalls => {
                let status = self.conductor.init_walls(hw, sink, Direction::Up);
                self.last_status = Some(status);
                self.deferred = Some(Direction::Down);
                collect(&self.conductor.positions())
            }
            HostCommand::Move(targets) => {
                let chambers = self.conductor.chambers().len();
                if targets.len() > chambers {
                    warn!(
                        "Move request for {} chambers, registry holds {}; extra ignored",
                        targets.len(),
                        chambers
                    );
                }
                for (index, &target) in targets.iter().take(chambers).enumerate() {
                    if let Err(e) = self
                        .conductor
                        .set_walls_to_move(index as u8, WallSet::from_bits(target))
                    {
                        warn!("Move staging failed: {}", e);
                    }
                }
                let status = self.conductor.run_batch(hw, sink);
                self.last_status = Some(status);
                collect(&self.conductor.positions())
            }
            HostCommand::SetParams { pwm_duty, move_timeout_ms } => {
                self.set_params(pwm_duty, move_timeout_ms);
                let cfg = self.conductor.config();
                let [lo, hi] = cfg.move_timeout_ms.to_le_bytes();
                collect(&[cfg.pwm_duty, lo, hi])
            }
        }
    }

    fn set_params(&mut self, pwm_duty: u8, move_timeout_ms: u16) {
        let mut candidate = self.conductor.config().clone();
        candidate.pwm_duty = pwm_duty;
        candidate.move_timeout_ms = move_timeout_ms;
        match candidate.validate() {
            Ok(()) => {
                info!("Parameters updated: duty={} timeout={} ms", pwm_duty, move_timeout_ms);
                *self.conductor.config_mut() = candidate;
            }
            Err(e) => warn!("Parameters rejected: {}", e),
        }
    }

    /// Run work postponed until after the last response (walls returning
    /// down after an init cycle).
    pub fn run_deferred(
        &mut self,
        hw: &mut (impl RegisterBus + Clock),
        sink: &mut impl EventSink,
    ) {
        if let Some(direction) = self.deferred.take() {
            let status = self.conductor.init_walls(hw, sink, direction);
            self.last_status = Some(status);
        }
    }
}

fn collect(bytes: &[u8]) -> Response {
    bytes.iter().copied().take(MAX_PAYLOAD).collect()
}
