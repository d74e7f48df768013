//! Aggregate batch status.

use core::fmt;

use crate::error::BusError;

/// Result code of one move batch, as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunStatus {
    NoMove = 0,
    Success = 1,
    I2cError = 2,
    Timeout = 3,
}

impl RunStatus {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMove => write!(f, "nothing to move"),
            Self::Success => write!(f, "success"),
            Self::I2cError => write!(f, "i2c error"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Two-stage status merge.
///
/// Stage one is sticky: the first bus failure wins over every later
/// success. Stage two runs at [`finish`](Self::finish): an expired deadline
/// overrides whatever stage one recorded.
#[derive(Debug, Clone, Copy)]
pub struct StatusAccumulator {
    sticky: RunStatus,
    timed_out: bool,
}

impl StatusAccumulator {
    pub const fn new() -> Self {
        Self { sticky: RunStatus::Success, timed_out: false }
    }

    pub fn record(&mut self, result: Result<(), BusError>) {
        if result.is_err() {
            self.sticky = RunStatus::I2cError;
        }
    }

    pub fn mark_timeout(&mut self) {
        self.timed_out = true;
    }

    pub const fn finish(self) -> RunStatus {
        if self.timed_out { RunStatus::Timeout } else { self.sticky }
    }
}

impl Default for StatusAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
