//! Unified error types for the wallgate firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! command handler's error handling uniform. All variants are `Copy` so they
//! can be stored per chamber and carried through events without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An I2C transaction with an expander failed.
    Bus(BusError),
    /// A serial frame was malformed.
    Frame(FrameError),
    /// Chamber index is not in the registry.
    ChamberOutOfRange(u8),
    /// Wall index is outside 0..8.
    WallOutOfRange(u8),
    /// Configuration is invalid.
    Config(&'static str),
}

impl Error {
    /// Legacy status byte reported to the host.
    ///
    /// Argument errors collapse onto the `255` sentinel.
    pub const fn code(self) -> u8 {
        match self {
            Self::Bus(e) => e.code(),
            Self::Frame(_) | Self::Config(_) => BusError::Other.code(),
            Self::ChamberOutOfRange(_) | Self::WallOutOfRange(_) => {
                BusError::InvalidArgument.code()
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Frame(e) => write!(f, "frame: {e}"),
            Self::ChamberOutOfRange(i) => write!(f, "chamber {i} out of range"),
            Self::WallOutOfRange(i) => write!(f, "wall {i} out of range"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

/// Non-success I2C transaction status.
///
/// Discriminants match the status bytes the host GUI already understands;
/// `0` (success) is deliberately not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BusError {
    /// Data too long to fit in the transmit buffer.
    PayloadTooLarge = 1,
    /// NACK on transmit of the address byte.
    AddressNack = 2,
    /// NACK on transmit of a data byte.
    DataNack = 3,
    /// Any other bus failure.
    Other = 4,
    /// The transaction timed out.
    Timeout = 5,
    /// Register/port argument outside the chip's range.
    InvalidArgument = 255,
}

impl BusError {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Map a raw status byte back to an error. `0` yields `None`; unknown
    /// codes fold into [`BusError::Other`].
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => None,
            1 => Some(Self::PayloadTooLarge),
            2 => Some(Self::AddressNack),
            3 => Some(Self::DataNack),
            5 => Some(Self::Timeout),
            255 => Some(Self::InvalidArgument),
            _ => Some(Self::Other),
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLarge => write!(f, "payload too large"),
            Self::AddressNack => write!(f, "address NACK"),
            Self::DataNack => write!(f, "data NACK"),
            Self::Other => write!(f, "bus error"),
            Self::Timeout => write!(f, "bus timeout"),
            Self::InvalidArgument => write!(f, "invalid argument"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Framing errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    BadStartByte,
    BadEndByte,
    ChecksumMismatch,
    PayloadTooLarge,
    ByteTimeout,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadStartByte => write!(f, "missing start byte"),
            Self::BadEndByte => write!(f, "missing end byte"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
            Self::PayloadTooLarge => write!(f, "payload too large"),
            Self::ByteTimeout => write!(f, "inter-byte timeout"),
        }
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
