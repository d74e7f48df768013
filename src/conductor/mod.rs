//! Wall movement conductor.
//!
//! [`Conductor`] owns the chamber registry and the static pin maps. A move
//! batch drives every chamber with staged walls at once:
//!
//! ```text
//!  select ──▶ start (PWM on) ──▶ poll switches ──▶ drain ──▶ reset
//!                                  │    ▲
//!                                  └────┘ until done or deadline
//! ```
//!
//! A chamber whose bus transaction fails is retired from polling for the
//! rest of the batch; the others carry on. Whatever is left unfinished at
//! the end becomes persistent error bits and gets its motors forced off.

mod bench;
mod chamber;
mod init;
mod position;
mod status;

pub use bench::SwitchSnapshot;
pub use chamber::{ChamberState, FailureKind, WallState};
pub use status::{RunStatus, StatusAccumulator};

use heapless::Vec;
use log::{debug, error, info, warn};

use crate::app::events::GateEvent;
use crate::app::ports::{Clock, EventSink, RegisterBus};
use crate::config::{ErrorClearPolicy, GateConfig};
use crate::error::{BusError, Error, Result};
use crate::pinmap::{PortBytes, StaticMaps, WallSet};
use crate::pins::{MAX_CHAMBERS, PORT_COUNT, Role, WALL_COUNT, WALL_MAP, WallMap};
use crate::registers::{INPUT_PORT0, OUTPUT_PORT0, POLL_SPAN};

/// Direction of travel, named by the switch that ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
}

impl Direction {
    /// Switch role that signals arrival in this direction.
    pub const fn switch(self) -> Role {
        match self {
            Self::Down => Role::SwitchDown,
            Self::Up => Role::SwitchUp,
        }
    }

    /// Target position byte for "every wall".
    pub const fn all_walls(self) -> WallSet {
        match self {
            Self::Down => WallSet::EMPTY,
            Self::Up => WallSet::ALL,
        }
    }
}

/// Owns the chamber registry and runs move batches.
pub struct Conductor {
    wiring: WallMap,
    maps: StaticMaps,
    chambers: Vec<ChamberState, MAX_CHAMBERS>,
    config: GateConfig,
}

impl Conductor {
    pub fn new(config: GateConfig) -> Self {
        Self::with_wiring(config, WALL_MAP)
    }

    pub fn with_wiring(config: GateConfig, wiring: WallMap) -> Self {
        Self {
            maps: StaticMaps::from_wall_map(&wiring),
            wiring,
            chambers: Vec::new(),
            config,
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn chambers(&self) -> &[ChamberState] {
        &self.chambers
    }

    pub fn chamber(&self, index: u8) -> Result<&ChamberState> {
        self.chambers.get(index as usize).ok_or(Error::ChamberOutOfRange(index))
    }

    pub const fn maps(&self) -> &StaticMaps {
        &self.maps
    }

    pub const fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GateConfig {
        &mut self.config
    }

    /// Current position byte of every chamber, in registry order.
    pub fn positions(&self) -> Vec<u8, MAX_CHAMBERS> {
        self.chambers.iter().map(|c| c.position().bits()).collect()
    }

    // ── Staging ───────────────────────────────────────────────

    /// Stage the walls needed to reach `target` (bit set = wall up).
    ///
    /// Returns `Ok(false)` when nothing needs to move or when the chamber is
    /// flagged with a bus error.
    pub fn set_walls_to_move(&mut self, chamber: u8, target: WallSet) -> Result<bool> {
        let retry = self.config.retry_errored_walls;
        let ch = self
            .chambers
            .get_mut(chamber as usize)
            .ok_or(Error::ChamberOutOfRange(chamber))?;
        if let Some(e) = ch.status() {
            warn!("Chamber {} skipped: last bus status {} ({})", chamber, e.code(), e);
            return Ok(false);
        }
        let blocked = if retry { WallSet::EMPTY } else { ch.errors() };
        let staged = ch.stage(target, blocked);
        debug!(
            "Chamber {} staged up=0b{:08b} down=0b{:08b}",
            chamber,
            ch.move_up().bits(),
            ch.move_down().bits()
        );
        Ok(staged)
    }

    /// Forget the persistent error bits of one chamber.
    pub fn clear_errors(&mut self, chamber: u8) -> Result<()> {
        self.chambers
            .get_mut(chamber as usize)
            .ok_or(Error::ChamberOutOfRange(chamber))?
            .clear_errors();
        Ok(())
    }

    // ── Move batch ────────────────────────────────────────────

    /// Run one move batch over every chamber with staged walls.
    ///
    /// Blocks until every chamber finishes or the move timeout expires.
    pub fn run_batch(
        &mut self,
        hw: &mut (impl RegisterBus + Clock),
        sink: &mut impl EventSink,
    ) -> RunStatus {
        // 1. Selection
        let selected: Vec<usize, MAX_CHAMBERS> = self
            .chambers
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_pending())
            .map(|(i, _)| i)
            .collect();
        if selected.is_empty() {
            debug!("Move batch: nothing to move");
            return RunStatus::NoMove;
        }

        let started = hw.now_ms();
        let mut status = StatusAccumulator::new();
        let mut faulted = [false; MAX_CHAMBERS];
        let mut last_outputs: [Option<PortBytes>; MAX_CHAMBERS] = [None; MAX_CHAMBERS];
        info!("Move batch: {} chamber(s)", selected.len());

        // 2. Start
        // Between batches only the switch pins' output bits are high.
        let idle = *self.maps.io_all.union();
        for &i in &selected {
            let ch = &mut self.chambers[i];
            ch.begin_move(&self.maps);
            let pwm = *ch.active().pwm.union();
            let result = hw.write_outputs(ch.address(), &pwm, true, Some(&idle));
            ch.record(result);
            status.record(result);
            match result {
                Ok(()) => {
                    last_outputs[i] = Some(pwm.apply_to(&idle, true));
                    sink.emit(&GateEvent::MoveStarted {
                        chamber: i as u8,
                        up: ch.move_up(),
                        down: ch.move_down(),
                    });
                }
                Err(e) => {
                    warn!("Chamber {} start write failed: {}", i, e);
                    faulted[i] = true;
                }
            }
        }

        // 3. Poll loop
        let poll_start = hw.now_ms();
        let timeout = u32::from(self.config.move_timeout_ms);
        let policy = self.config.error_clear;
        loop {
            for &i in &selected {
                if faulted[i] || !self.chambers[i].is_pending() {
                    continue;
                }
                match self.poll_chamber(i, started, policy, hw, sink) {
                    Ok(outputs) => last_outputs[i] = Some(outputs),
                    Err(e) => {
                        warn!("Chamber {} poll failed: {}", i, e);
                        self.chambers[i].record(Err(e));
                        status.record(Err(e));
                        faulted[i] = true;
                    }
                }
            }

            let waiting = selected
                .iter()
                .any(|&i| !faulted[i] && self.chambers[i].is_pending());
            if !waiting {
                break;
            }
            // 4. Timeout
            if hw.now_ms().wrapping_sub(poll_start) >= timeout {
                warn!("Move batch timed out after {} ms", timeout);
                status.mark_timeout();
                break;
            }
        }

        // 5. Drain, 6. reset
        for &i in &selected {
            let ch = &mut self.chambers[i];
            if !ch.is_pending() && !faulted[i] {
                ch.end_move();
                continue;
            }
            let kind = if faulted[i] { FailureKind::I2cError } else { FailureKind::Timeout };
            let failed = ch.fail_pending(kind);
            if !failed.is_empty() {
                error!(
                    "Chamber {} walls 0b{:08b} failed ({:?})",
                    i,
                    failed.bits(),
                    kind
                );
                sink.emit(&GateEvent::ChamberFailed { chamber: i as u8, walls: failed, kind });
            }
            let snapshot = last_outputs[i].unwrap_or(idle);
            let result =
                hw.write_outputs(ch.address(), self.maps.pwm_all.union(), false, Some(&snapshot));
            if let Err(e) = result {
                error!("Chamber {} failsafe PWM off failed: {}", i, e);
                ch.record(result);
                status.record(result);
            }
        }

        let outcome = status.finish();
        let elapsed_ms = hw.now_ms().wrapping_sub(started);
        info!("Move batch finished: {} in {} ms", outcome, elapsed_ms);
        sink.emit(&GateEvent::BatchFinished { status: outcome, elapsed_ms });
        outcome
    }

    /// One combined input/output read for a moving chamber, retiring every
    /// wall whose target switch is asserted. Returns the output snapshot as
    /// written back.
    fn poll_chamber(
        &mut self,
        index: usize,
        started: u32,
        policy: ErrorClearPolicy,
        hw: &mut (impl RegisterBus + Clock),
        sink: &mut impl EventSink,
    ) -> core::result::Result<PortBytes, BusError> {
        let ch = &mut self.chambers[index];
        let mut buf = [0u8; POLL_SPAN];
        hw.read_registers(ch.address(), INPUT_PORT0, &mut buf)?;
        let inputs = PortBytes::from_slice(&buf[..PORT_COUNT]);
        let outputs = PortBytes::from_slice(&buf[usize::from(OUTPUT_PORT0 - INPUT_PORT0)..]);

        let triggered: Vec<(u8, u8, u8), { 2 * WALL_COUNT }> = ch
            .active()
            .io
            .entries()
            .filter(|&(port, pin, _)| inputs.bit(port, pin))
            .collect();
        if triggered.is_empty() {
            return Ok(outputs);
        }

        let mut off = PortBytes::ZERO;
        for (port, pin, wall) in triggered {
            let direction = match self.wiring.function_at(port, pin) {
                Some((Role::SwitchUp, _)) => Direction::Up,
                Some((Role::SwitchDown, _)) => Direction::Down,
                other => {
                    warn!("Chamber {} pin {}.{} is not a switch: {:?}", index, port, pin, other);
                    continue;
                }
            };
            off |= self.maps.pwm_all.mask_for(WallSet::single(wall));
            ch.arrive(wall, direction, policy);
            let elapsed_ms = hw.now_ms().wrapping_sub(started);
            debug!("Chamber {} wall {} {:?} after {} ms", index, wall, direction, elapsed_ms);
            sink.emit(&GateEvent::WallArrived {
                chamber: index as u8,
                wall,
                direction,
                elapsed_ms,
            });
        }

        hw.write_outputs(ch.address(), &off, false, Some(&outputs))?;
        ch.record(Ok(()));
        Ok(off.apply_to(&outputs, false))
    }
}
