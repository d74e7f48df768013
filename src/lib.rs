//! Wall gate firmware library.
//!
//! Exposes the pure-logic modules for integration testing. ESP-IDF-specific
//! code is guarded by the `espidf` feature within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod conductor;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pinmap;
pub mod pins;
pub mod registers;
pub mod serial;

pub use error::{BusError, Error, FrameError, Result};
