//! Peripheral drivers.

pub mod cy8c95xx;

pub use cy8c95xx::Cy8c95xx;
