//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Conductor / GateService (domain)
//! ```
//!
//! Driven adapters (expander bus, clock, event sinks) implement these traits.
//! The domain consumes them via generics, so it never touches hardware
//! directly and runs unchanged against the simulated bank in tests.

use heapless::Vec;

use crate::error::BusError;
use crate::pinmap::PortBytes;
use crate::pins::MAX_CHAMBERS;

// ───────────────────────────────────────────────────────────────
// Register bus port (domain ↔ expander chips)
// ───────────────────────────────────────────────────────────────

/// PWM source programming parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmSettings {
    /// Source clock select (0 = 32 kHz).
    pub clock: u8,
    /// Period in clock ticks.
    pub period: u8,
    /// Duty 0-255, scaled onto the period by the driver.
    pub duty: u8,
}

/// Register-level access to the bank of expander chips.
///
/// Every call is one blocking bus transaction (or a short fixed sequence of
/// them) against a single chip. Transactions are strictly sequential.
pub trait RegisterBus {
    /// Probe `candidates` in order and return the addresses that ACK.
    fn scan(&mut self, candidates: &[u8]) -> Vec<u8, MAX_CHAMBERS>;

    /// Burst-read consecutive registers starting at `start` into `buf`.
    fn read_registers(&mut self, addr: u8, start: u8, buf: &mut [u8]) -> Result<(), BusError>;

    /// Force the output bits in `mask` to `level`.
    ///
    /// With `snapshot`, every other bit is written from the snapshot with no
    /// read. Without one, the driver reads the output registers first.
    fn write_outputs(
        &mut self,
        addr: u8,
        mask: &PortBytes,
        level: bool,
        snapshot: Option<&PortBytes>,
    ) -> Result<(), BusError>;

    /// Chip power-on configuration.
    fn configure_chip(&mut self, addr: u8) -> Result<(), BusError>;

    /// Program one PWM source channel.
    fn configure_pwm_source(
        &mut self,
        addr: u8,
        channel: u8,
        settings: PwmSettings,
    ) -> Result<(), BusError>;

    /// Select `port` and set the `mask` bits of the port-scoped register
    /// `reg` to `level`, leaving other bits untouched.
    fn set_port_register(
        &mut self,
        addr: u8,
        reg: u8,
        port: u8,
        mask: u8,
        level: bool,
    ) -> Result<(), BusError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock. Wraps at `u32::MAX`; compare with
/// `wrapping_sub`.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`GateEvent`](super::events::GateEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::GateEvent);
}
