//! Discovery, chip configuration and bench diagnostics.

use embedded_hal::delay::DelayNs;

use wallgate::app::events::GateEvent;
use wallgate::conductor::{Conductor, Direction, RunStatus, SwitchSnapshot};
use wallgate::config::GateConfig;
use wallgate::error::{BusError, Error};
use wallgate::pinmap::{StaticMaps, WallSet};
use wallgate::pins::WALL_MAP;
use wallgate::registers::{
    DRIVE_PULL_DOWN, DRIVE_STRONG, PIN_DIRECTION, PWM_SELECT, SELECT_PWM_OUTPUT,
};

use crate::sim_bus::{RecordingSink, SimBank, TxnKind, hardware, ready_conductor};

#[test]
fn discovery_keeps_scan_order_and_skips_silent_addresses() {
    let bank = SimBank::with_addresses(&[0x02, 0x06, 0x10]);
    let mut hw = hardware(&bank);
    let mut sink = RecordingSink::default();
    let mut conductor = Conductor::new(GateConfig::default());

    let found = conductor.discover(&mut hw, &mut sink);

    assert_eq!(found.as_slice(), &[0x02, 0x06, 0x10]);
    assert_eq!(conductor.chambers().len(), 3);
    assert_eq!(conductor.chamber(1).unwrap().address(), 0x06);
    assert_eq!(sink.events, vec![GateEvent::ChambersDiscovered(found.clone())]);
    let probes = bank.state().log.iter().filter(|t| t.kind == TxnKind::Probe).count();
    assert_eq!(probes, GateConfig::default().chamber_addresses.len());
}

#[test]
fn rediscovery_replaces_the_registry() {
    let bank = SimBank::new(3);
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, GateConfig::default());
    bank.with_chip(1, |c| c.present = false);

    let found = conductor.discover(&mut hw, &mut sink);

    assert_eq!(found.as_slice(), &[0x02, 0x06]);
    assert_eq!(conductor.chambers().len(), 2);
    assert!(matches!(conductor.chamber(2), Err(Error::ChamberOutOfRange(2))));
}

#[test]
fn registry_is_capped() {
    let mut conductor = Conductor::new(GateConfig::default());
    let addrs: Vec<u8> = (1..=12).collect();
    conductor.reset_registry(&addrs);
    assert_eq!(conductor.chambers().len(), 9);
    assert_eq!(conductor.chambers()[8].address(), 9);
}

#[test]
fn init_programs_switch_and_motor_pins() {
    let bank = SimBank::new(1);
    let (conductor, _hw, _sink) = ready_conductor(&bank, GateConfig::default());
    let maps = StaticMaps::from_wall_map(&WALL_MAP);
    let chip = bank.chip(0);

    for (port, mask) in maps.io_all.union().ports() {
        assert_eq!(chip.port_register(PIN_DIRECTION, port) & mask, mask, "direction port {port}");
        assert_eq!(chip.port_register(DRIVE_PULL_DOWN, port) & mask, mask, "pull-down port {port}");
        assert_eq!(chip.outputs()[port as usize] & mask, mask);
    }
    for (port, mask) in maps.pwm_all.union().ports() {
        assert_eq!(chip.port_register(SELECT_PWM_OUTPUT, port) & mask, mask, "pwm port {port}");
        assert_eq!(chip.port_register(DRIVE_STRONG, port) & mask, mask, "strong port {port}");
        assert_eq!(chip.port_register(PIN_DIRECTION, port) & mask, 0);
    }
    assert!(!chip.any_motor_on());
    assert_eq!(conductor.chamber(0).unwrap().status(), None);
    drop(chip);

    // Each distinct PWM source is programmed once, duty 255 over period 32.
    let pwm_writes: Vec<Vec<u8>> = bank
        .state()
        .log
        .iter()
        .filter_map(|t| match &t.kind {
            TxnKind::Write { reg, data } if *reg == PWM_SELECT => {
                Some(data.clone())
            }
            _ => None,
        })
        .collect();
    let mut channels: Vec<u8> = WALL_MAP.pwm_source.to_vec();
    channels.sort_unstable();
    channels.dedup();
    assert_eq!(pwm_writes.len(), channels.len());
    for data in &pwm_writes {
        assert_eq!(&data[1..], &[0, 32, 31]);
    }
}

#[test]
fn init_reads_starting_position() {
    let bank = SimBank::new(2);
    bank.set_wall_up(1, 0);
    bank.set_wall_up(1, 7);
    let (conductor, _hw, sink) = ready_conductor(&bank, GateConfig::default());

    assert_eq!(conductor.positions().as_slice(), &[0x00, 0x81]);
    assert!(sink.events.contains(&GateEvent::WallsDetected {
        chamber: 1,
        up: WallSet::from_bits(0x81),
    }));
}

#[test]
fn init_failure_flags_only_that_chamber() {
    let bank = SimBank::new(3);
    bank.nack_writes(1, true);
    let mut hw = hardware(&bank);
    let mut sink = RecordingSink::default();
    let mut conductor = Conductor::new(GateConfig::default());
    conductor.discover(&mut hw, &mut sink);

    let result = conductor.init_chambers(&mut hw, &mut sink);

    assert_eq!(result, Err(BusError::DataNack));
    assert_eq!(conductor.chamber(0).unwrap().status(), None);
    assert_eq!(conductor.chamber(1).unwrap().status(), Some(BusError::DataNack));
    assert_eq!(conductor.chamber(2).unwrap().status(), None);
    assert!(sink.events.contains(&GateEvent::ChamberInitialised {
        chamber: 1,
        result: Err(BusError::DataNack),
    }));
    assert_eq!(conductor.set_walls_to_move(1, WallSet::ALL), Ok(false));
}

#[test]
fn init_walls_drives_everything_to_an_end() {
    let bank = SimBank::new(2);
    bank.set_wall_up(0, 2);
    bank.set_wall_up(1, 5);
    let (mut conductor, mut hw, mut sink) = ready_conductor(&bank, GateConfig::default());

    assert_eq!(conductor.init_walls(&mut hw, &mut sink, Direction::Up), RunStatus::Success);
    assert_eq!(conductor.positions().as_slice(), &[0xFF, 0xFF]);
    assert_eq!(bank.position_byte(0), 0xFF);

    assert_eq!(conductor.init_walls(&mut hw, &mut sink, Direction::Down), RunStatus::Success);
    assert_eq!(conductor.positions().as_slice(), &[0x00, 0x00]);
    assert_eq!(bank.position_byte(1), 0x00);
    assert!(!bank.chip(0).any_motor_on());
}

#[test]
fn read_position_follows_switches() {
    let bank = SimBank::new(1);
    let (conductor, mut hw, _sink) = ready_conductor(&bank, GateConfig::default());
    bank.set_wall_up(0, 1);
    bank.set_wall_up(0, 3);

    let up = conductor.read_position(&mut hw, 0, Direction::Up).unwrap();
    let down = conductor.read_position(&mut hw, 0, Direction::Down).unwrap();

    assert_eq!(up.bits(), 0b0000_1010);
    assert_eq!(down.bits(), 0b1111_0101);
    // Move state untouched.
    assert_eq!(conductor.chamber(0).unwrap().position(), WallSet::EMPTY);
}

#[test]
fn read_position_reports_bus_errors() {
    let bank = SimBank::new(1);
    let (conductor, mut hw, _sink) = ready_conductor(&bank, GateConfig::default());
    bank.nack_reads(0, true);
    let err = conductor.read_position(&mut hw, 0, Direction::Up).unwrap_err();
    assert_eq!(err, Error::Bus(BusError::DataNack));
    assert_eq!(err.code(), 3);
    assert_eq!(
        conductor.read_position(&mut hw, 4, Direction::Up),
        Err(Error::ChamberOutOfRange(4))
    );
}

#[test]
fn switch_snapshot_shows_walls_in_transit() {
    let bank = SimBank::new(1);
    let (conductor, mut hw, _sink) = ready_conductor(&bank, GateConfig::default());
    bank.set_wall_up(0, 6);
    bank.with_chip(0, |c| c.walls[2].pos = 10);

    let snap = conductor.switch_snapshot(&mut hw, 0).unwrap();

    assert_eq!(snap.up, WallSet::single(6));
    assert_eq!(snap.down, WallSet::from_bits(0b1011_1011));
    assert!(snap.conflicts().is_empty());

    let stuck = SwitchSnapshot { down: WallSet::from_bits(0b11), up: WallSet::from_bits(0b10) };
    assert_eq!(stuck.conflicts(), WallSet::single(1));
}

/// Records motor outputs at each delay and advances the shared clock.
struct RecordingDelay {
    bank: SimBank,
    seen: Vec<(bool, bool, u32)>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        let chip = self.bank.chip(0);
        self.seen.push((chip.motor_up(4), chip.motor_down(4), ms));
        drop(chip);
        self.bank.clock().advance(ms);
    }
}

#[test]
fn pulse_wall_runs_up_then_down_then_releases() {
    let bank = SimBank::new(1);
    let (conductor, mut hw, _sink) = ready_conductor(&bank, GateConfig::default());
    let mut delay = RecordingDelay { bank: bank.clone(), seen: Vec::new() };

    conductor.pulse_wall(&mut hw, &mut delay, 0, 4, 25).unwrap();

    assert_eq!(delay.seen, vec![(true, false, 25), (false, true, 25)]);
    assert!(!bank.chip(0).any_motor_on());
    assert_eq!(
        conductor.pulse_wall(&mut hw, &mut delay, 0, 8, 25),
        Err(Error::WallOutOfRange(8))
    );
}
