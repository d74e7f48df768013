//! Move batches against the simulated bank.

use wallgate::app::events::GateEvent;
use wallgate::app::ports::{Clock, PwmSettings, RegisterBus};
use wallgate::conductor::{Direction, FailureKind, RunStatus, WallState};
use wallgate::config::{ErrorClearPolicy, GateConfig};
use wallgate::error::BusError;
use wallgate::pinmap::{PortBytes, StaticMaps, WallSet};
use wallgate::pins::{MAX_CHAMBERS, WALL_COUNT, WALL_MAP};
use wallgate::Error;

use crate::sim_bus::{SimBank, SimHardware, TRAVEL_MS, ready_conductor};

fn config_with_timeout(ms: u16) -> GateConfig {
    GateConfig { move_timeout_ms: ms, ..GateConfig::default() }
}

#[test]
fn wall_moves_up_and_reports_success() {
    let bank = SimBank::new(1);
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, GateConfig::default());
    assert_eq!(conductor.chamber(0).unwrap().position(), WallSet::EMPTY);

    assert_eq!(conductor.set_walls_to_move(0, WallSet::from_bits(0b0000_1000)), Ok(true));
    assert_eq!(conductor.chamber(0).unwrap().move_up().bits(), 0b0000_1000);
    assert!(conductor.chamber(0).unwrap().move_down().is_empty());

    let status = conductor.run_batch(&mut hw, &mut sink);

    assert_eq!(status, RunStatus::Success);
    assert_eq!(status.code(), 1);
    let ch = conductor.chamber(0).unwrap();
    assert_eq!(ch.position().bits(), 0b0000_1000);
    assert!(!ch.is_pending());
    assert_eq!(ch.wall_state(3), Some(WallState::Completed));
    assert!(bank.wall_up(0, 3));
    assert!(!bank.chip(0).any_motor_on());
}

#[test]
fn already_achieved_position_issues_no_pwm_write() {
    let bank = SimBank::new(1);
    bank.set_wall_up(0, 5);
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, GateConfig::default());
    assert!(conductor.chamber(0).unwrap().position().contains(5));

    let mark = bank.log_len();
    assert_eq!(conductor.set_walls_to_move(0, WallSet::single(5)), Ok(false));
    assert!(!conductor.chamber(0).unwrap().move_up().contains(5));
    assert_eq!(conductor.run_batch(&mut hw, &mut sink), RunStatus::NoMove);
    assert!(bank.log_since(mark).is_empty());
}

#[test]
fn nothing_staged_means_no_bus_traffic() {
    let bank = SimBank::new(3);
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, GateConfig::default());
    let mark = bank.log_len();
    let before = sink.events.len();

    assert_eq!(conductor.run_batch(&mut hw, &mut sink).code(), 0);
    assert_eq!(bank.log_len(), mark);
    assert_eq!(sink.events.len(), before);
}

#[test]
fn failed_start_write_is_contained_to_its_chamber() {
    let bank = SimBank::new(3);
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, GateConfig::default());
    for chamber in 0..3 {
        assert_eq!(conductor.set_walls_to_move(chamber, WallSet::from_bits(0b0000_0011)), Ok(true));
    }
    bank.nack_writes(2, true);

    let status = conductor.run_batch(&mut hw, &mut sink);

    assert_eq!(status, RunStatus::I2cError);
    for chamber in 0..2 {
        let ch = conductor.chamber(chamber).unwrap();
        assert_eq!(ch.position().bits(), 0b0000_0011, "chamber {chamber}");
        assert!(ch.errors().is_empty());
        assert_eq!(ch.status(), None);
    }
    let failed = conductor.chamber(2).unwrap();
    assert_eq!(failed.errors().bits(), 0b0000_0011);
    assert_eq!(failed.status_code(), 3);
    assert_eq!(failed.wall_state(0), Some(WallState::Failed(FailureKind::I2cError)));
    assert!(!failed.is_pending());
    assert!(!bank.chip(2).any_motor_on());

    // The failsafe write was attempted even though the chip NACKs it.
    let addr = failed.address();
    let last_to_failed = bank
        .state()
        .log
        .iter()
        .rev()
        .find(|t| t.addr == addr)
        .cloned()
        .unwrap();
    assert!(last_to_failed.is_output_write());
    assert!(!last_to_failed.ok);
}

#[test]
fn flagged_chamber_is_skipped_on_next_request() {
    let bank = SimBank::new(2);
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, GateConfig::default());
    conductor.set_walls_to_move(1, WallSet::single(0)).unwrap();
    bank.nack_writes(1, true);
    assert_eq!(conductor.run_batch(&mut hw, &mut sink), RunStatus::I2cError);

    bank.nack_writes(1, false);
    assert_eq!(conductor.set_walls_to_move(1, WallSet::single(0)), Ok(false));
    assert_eq!(conductor.set_walls_to_move(0, WallSet::single(0)), Ok(true));
    assert_eq!(conductor.run_batch(&mut hw, &mut sink), RunStatus::Success);
}

#[test]
fn timeout_wins_and_only_stalled_walls_fail() {
    let bank = SimBank::new(2);
    bank.set_travel(0, 1, 50);
    bank.set_stuck(1, 1, true);
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, config_with_timeout(200));
    conductor.set_walls_to_move(0, WallSet::single(1)).unwrap();
    conductor.set_walls_to_move(1, WallSet::single(1)).unwrap();
    let started = bank.now();

    let status = conductor.run_batch(&mut hw, &mut sink);

    assert_eq!(status.code(), 3);
    assert!(conductor.chamber(0).unwrap().errors().is_empty());
    assert!(conductor.chamber(0).unwrap().position().contains(1));
    assert_eq!(conductor.chamber(1).unwrap().errors(), WallSet::single(1));
    assert_eq!(
        conductor.chamber(1).unwrap().wall_state(1),
        Some(WallState::Failed(FailureKind::Timeout))
    );
    assert!(!bank.chip(1).any_motor_on());
    assert!(bank.now() - started >= 200);

    let arrival = sink.events.iter().find_map(|e| match e {
        GateEvent::WallArrived { chamber: 0, wall: 1, elapsed_ms, .. } => Some(*elapsed_ms),
        _ => None,
    });
    let elapsed = arrival.expect("chamber 0 wall 1 arrived");
    assert!((50..=60).contains(&elapsed), "arrived after {elapsed} ms");
    assert!(sink.events.contains(&GateEvent::ChamberFailed {
        chamber: 1,
        walls: WallSet::single(1),
        kind: FailureKind::Timeout,
    }));
}

#[test]
fn timeout_overrides_earlier_bus_error() {
    let bank = SimBank::new(2);
    bank.set_stuck(0, 0, true);
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, config_with_timeout(100));
    conductor.set_walls_to_move(0, WallSet::single(0)).unwrap();
    conductor.set_walls_to_move(1, WallSet::single(0)).unwrap();
    bank.nack_writes(1, true);

    assert_eq!(conductor.run_batch(&mut hw, &mut sink), RunStatus::Timeout);
    assert_eq!(conductor.chamber(1).unwrap().errors(), WallSet::single(0));
}

/// Passes everything through except writes that switch every motor off.
struct MotorsOffNack<'a> {
    inner: &'a mut SimHardware,
    pwm_all: PortBytes,
}

impl RegisterBus for MotorsOffNack<'_> {
    fn scan(&mut self, candidates: &[u8]) -> heapless::Vec<u8, MAX_CHAMBERS> {
        self.inner.scan(candidates)
    }

    fn read_registers(&mut self, addr: u8, start: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.inner.read_registers(addr, start, buf)
    }

    fn write_outputs(
        &mut self,
        addr: u8,
        mask: &PortBytes,
        level: bool,
        snapshot: Option<&PortBytes>,
    ) -> Result<(), BusError> {
        if !level && *mask == self.pwm_all {
            return Err(BusError::DataNack);
        }
        self.inner.write_outputs(addr, mask, level, snapshot)
    }

    fn configure_chip(&mut self, addr: u8) -> Result<(), BusError> {
        self.inner.configure_chip(addr)
    }

    fn configure_pwm_source(
        &mut self,
        addr: u8,
        channel: u8,
        settings: PwmSettings,
    ) -> Result<(), BusError> {
        self.inner.configure_pwm_source(addr, channel, settings)
    }

    fn set_port_register(
        &mut self,
        addr: u8,
        reg: u8,
        port: u8,
        mask: u8,
        level: bool,
    ) -> Result<(), BusError> {
        self.inner.set_port_register(addr, reg, port, mask, level)
    }
}

impl Clock for MotorsOffNack<'_> {
    fn now_ms(&self) -> u32 {
        self.inner.now_ms()
    }
}

#[test]
fn failed_motors_off_after_timeout_keeps_timeout() {
    let bank = SimBank::new(1);
    bank.set_stuck(0, 3, true);
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, config_with_timeout(60));
    conductor.set_walls_to_move(0, WallSet::single(3)).unwrap();
    let mut flaky = MotorsOffNack {
        inner: &mut hw,
        pwm_all: *StaticMaps::from_wall_map(&WALL_MAP).pwm_all.union(),
    };

    let status = conductor.run_batch(&mut flaky, &mut sink);

    assert_eq!(status, RunStatus::Timeout);
    assert_eq!(status.code(), 3);
    let ch = conductor.chamber(0).unwrap();
    assert_eq!(ch.errors(), WallSet::single(3));
    assert!(!ch.is_pending());
    assert_eq!(ch.wall_state(3), Some(WallState::Failed(FailureKind::Timeout)));
    assert_eq!(ch.status(), Some(BusError::DataNack));
    // The rejected write leaves the simulated motor running.
    assert!(bank.chip(0).any_motor_on());
}

#[test]
fn read_failure_retires_chamber() {
    let bank = SimBank::new(2);
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, GateConfig::default());
    conductor.set_walls_to_move(0, WallSet::ALL).unwrap();
    conductor.set_walls_to_move(1, WallSet::ALL).unwrap();
    bank.nack_reads(1, true);

    // The start write needs no read, so chamber 1 fails at its first poll.
    let status = conductor.run_batch(&mut hw, &mut sink);

    assert_eq!(status, RunStatus::I2cError);
    assert_eq!(conductor.chamber(0).unwrap().position(), WallSet::ALL);
    assert_eq!(conductor.chamber(1).unwrap().errors(), WallSet::ALL);
    assert_eq!(conductor.chamber(1).unwrap().status_code(), 3);
    assert!(!bank.chip(1).any_motor_on());
}

#[test]
fn mixed_directions_in_one_batch() {
    let bank = SimBank::new(1);
    for wall in [0, 2, 4, 6] {
        bank.set_wall_up(0, wall);
    }
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, GateConfig::default());
    assert_eq!(conductor.chamber(0).unwrap().position().bits(), 0b0101_0101);

    conductor.set_walls_to_move(0, WallSet::from_bits(0b1010_1010)).unwrap();
    let ch = conductor.chamber(0).unwrap();
    assert_eq!(ch.move_up().bits(), 0b1010_1010);
    assert_eq!(ch.move_down().bits(), 0b0101_0101);

    assert_eq!(conductor.run_batch(&mut hw, &mut sink), RunStatus::Success);
    assert_eq!(conductor.chamber(0).unwrap().position().bits(), 0b1010_1010);
    assert_eq!(bank.position_byte(0), 0b1010_1010);
    let downs = sink
        .events
        .iter()
        .filter(|e| matches!(e, GateEvent::WallArrived { direction: Direction::Down, .. }))
        .count();
    assert_eq!(downs, 4);
}

#[test]
fn switch_pin_outputs_survive_a_batch() {
    let bank = SimBank::new(1);
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, GateConfig::default());
    let io_bits = *conductor.maps().io_all.union();
    conductor.set_walls_to_move(0, WallSet::ALL).unwrap();
    conductor.run_batch(&mut hw, &mut sink);

    let outputs = bank.chip(0).outputs();
    for (port, mask) in io_bits.ports() {
        assert_eq!(outputs[port as usize] & mask, mask, "port {port}");
    }
}

#[test]
fn error_bit_clears_on_switch_by_default() {
    let bank = SimBank::new(1);
    bank.set_stuck(0, 2, true);
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, config_with_timeout(60));
    conductor.set_walls_to_move(0, WallSet::single(2)).unwrap();
    assert_eq!(conductor.run_batch(&mut hw, &mut sink), RunStatus::Timeout);
    assert_eq!(conductor.chamber(0).unwrap().errors(), WallSet::single(2));

    bank.set_stuck(0, 2, false);
    conductor.set_walls_to_move(0, WallSet::single(2)).unwrap();
    assert_eq!(conductor.run_batch(&mut hw, &mut sink), RunStatus::Success);
    assert!(conductor.chamber(0).unwrap().errors().is_empty());
}

#[test]
fn latched_policy_keeps_error_bits() {
    let bank = SimBank::new(1);
    bank.set_stuck(0, 2, true);
    let config = GateConfig { error_clear: ErrorClearPolicy::Latched, ..config_with_timeout(60) };
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, config);
    conductor.set_walls_to_move(0, WallSet::single(2)).unwrap();
    conductor.run_batch(&mut hw, &mut sink);

    bank.set_stuck(0, 2, false);
    conductor.set_walls_to_move(0, WallSet::single(2)).unwrap();
    assert_eq!(conductor.run_batch(&mut hw, &mut sink), RunStatus::Success);
    assert_eq!(conductor.chamber(0).unwrap().errors(), WallSet::single(2));

    conductor.clear_errors(0).unwrap();
    assert!(conductor.chamber(0).unwrap().errors().is_empty());
}

#[test]
fn errored_walls_masked_when_retry_disabled() {
    let bank = SimBank::new(1);
    bank.set_stuck(0, 4, true);
    let config = GateConfig { retry_errored_walls: false, ..config_with_timeout(60) };
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, config);
    conductor.set_walls_to_move(0, WallSet::single(4)).unwrap();
    conductor.run_batch(&mut hw, &mut sink);

    assert_eq!(conductor.set_walls_to_move(0, WallSet::from_bits(0b0001_0001)), Ok(true));
    assert_eq!(conductor.chamber(0).unwrap().move_up(), WallSet::single(0));
}

#[test]
fn out_of_range_chamber_is_an_argument_error() {
    let bank = SimBank::new(2);
    let (mut conductor, _hw, _sink) = ready_conductor(&bank, GateConfig::default());
    let err = conductor.set_walls_to_move(2, WallSet::ALL).unwrap_err();
    assert_eq!(err, Error::ChamberOutOfRange(2));
    assert_eq!(err.code(), 255);
}

#[test]
fn every_wall_of_every_chamber_arrives_in_time() {
    let bank = SimBank::new(9);
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, GateConfig::default());
    for chamber in 0..9 {
        conductor.set_walls_to_move(chamber, WallSet::ALL).unwrap();
    }
    assert_eq!(conductor.run_batch(&mut hw, &mut sink), RunStatus::Success);
    let arrivals = sink
        .events
        .iter()
        .filter(|e| matches!(e, GateEvent::WallArrived { .. }))
        .count();
    assert_eq!(arrivals, 9 * WALL_COUNT);
    match sink.events.last() {
        Some(GateEvent::BatchFinished { status: RunStatus::Success, elapsed_ms }) => {
            assert!(*elapsed_ms >= TRAVEL_MS);
        }
        other => panic!("unexpected last event {other:?}"),
    }
}
