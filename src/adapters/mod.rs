//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements          | Connects to                  |
//! |------------|---------------------|------------------------------|
//! | `hardware` | RegisterBus + Clock | CY8C95xx driver over I2C     |
//! | `log_sink` | EventSink           | Serial log output            |
//! | `time`     | Clock               | ESP32 system timer / Instant |

pub mod hardware;
pub mod log_sink;
pub mod time;

pub use hardware::HardwareAdapter;
pub use log_sink::LogEventSink;
pub use time::MonotonicClock;
