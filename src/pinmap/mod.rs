//! Port/pin groupings derived from the wiring table.
//!
//! A [`PortPinMap`] groups wired pins by expander port so register writes can
//! address ports in canonical ascending order. The same shape serves both the
//! static maps built once at startup ([`StaticMaps`]) and the per-chamber
//! active maps rebuilt for every move ([`ActiveMaps`]).

mod active;
mod builder;

pub use active::{ActiveMaps, apply};
pub use builder::{StaticMaps, build};

use core::ops::{BitAnd, BitOr, BitOrAssign, Not};

use heapless::Vec;

use crate::pins::{PIN_COUNT, PORT_COUNT, WALL_COUNT};

// ---------------------------------------------------------------------------
// WallSet
// ---------------------------------------------------------------------------

/// Bitset over the 8 walls of one chamber (bit `n` = wall `n`).
///
/// Converted to and from raw bytes only at the bus and serial boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WallSet(u8);

impl WallSet {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(0xFF);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Set holding only `wall`; empty when `wall` is out of range.
    pub const fn single(wall: u8) -> Self {
        if wall < WALL_COUNT as u8 { Self(1 << wall) } else { Self::EMPTY }
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, wall: u8) -> bool {
        wall < WALL_COUNT as u8 && self.0 & (1 << wall) != 0
    }

    pub fn insert(&mut self, wall: u8) {
        self.0 |= Self::single(wall).0;
    }

    pub fn remove(&mut self, wall: u8) {
        self.0 &= !Self::single(wall).0;
    }

    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Walls in `self` but not in `other`.
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Wall indices in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (0..WALL_COUNT as u8).filter(move |&w| self.contains(w))
    }
}

impl BitOr for WallSet {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for WallSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for WallSet {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for WallSet {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

// ---------------------------------------------------------------------------
// PortBytes
// ---------------------------------------------------------------------------

/// One byte per expander port, laid out like the chip's port registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortBytes(pub [u8; PORT_COUNT]);

impl PortBytes {
    pub const ZERO: Self = Self([0; PORT_COUNT]);
    pub const ALL: Self = Self([0xFF; PORT_COUNT]);

    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut out = Self::ZERO;
        for (dst, src) in out.0.iter_mut().zip(bytes) {
            *dst = *src;
        }
        out
    }

    pub const fn port(&self, port: u8) -> u8 {
        if (port as usize) < PORT_COUNT { self.0[port as usize] } else { 0 }
    }

    pub const fn bit(&self, port: u8, pin: u8) -> bool {
        pin < PIN_COUNT as u8 && self.port(port) & (1 << pin) != 0
    }

    pub fn set(&mut self, port: u8, pin: u8) {
        if (port as usize) < PORT_COUNT && pin < PIN_COUNT as u8 {
            self.0[port as usize] |= 1 << pin;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// `(port, mask)` for every port with at least one bit set.
    pub fn ports(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|&(_, &m)| m != 0)
            .map(|(p, &m)| (p as u8, m))
    }

    /// `snapshot` with every bit in `self` forced to `level`.
    pub fn apply_to(&self, snapshot: &PortBytes, level: bool) -> PortBytes {
        let mut out = *snapshot;
        for (dst, &mask) in out.0.iter_mut().zip(&self.0) {
            if level {
                *dst |= mask;
            } else {
                *dst &= !mask;
            }
        }
        out
    }
}

impl BitOr for PortBytes {
    type Output = Self;
    fn bitor(mut self, rhs: Self) -> Self {
        self |= rhs;
        self
    }
}

impl BitOrAssign for PortBytes {
    fn bitor_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a |= b;
        }
    }
}

impl BitAnd for PortBytes {
    type Output = Self;
    fn bitand(mut self, rhs: Self) -> Self {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a &= b;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// PortPinMap
// ---------------------------------------------------------------------------

/// A wired pin and the wall it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEntry {
    pub pin: u8,
    pub wall: u8,
}

/// All included pins of one port, ascending by pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortGroup {
    pub port: u8,
    pub pins: Vec<PinEntry, PIN_COUNT>,
    pub mask: u8,
}

/// Wired pins grouped by port, ascending by port then pin.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortPinMap {
    groups: Vec<PortGroup, PORT_COUNT>,
    union: PortBytes,
}

impl PortPinMap {
    pub const fn new() -> Self {
        Self { groups: Vec::new(), union: PortBytes::ZERO }
    }

    pub fn groups(&self) -> &[PortGroup] {
        &self.groups
    }

    /// Distinct ports referenced, ascending.
    pub fn ports(&self) -> impl Iterator<Item = u8> + '_ {
        self.groups.iter().map(|g| g.port)
    }

    /// Full-width union mask across the register space.
    pub const fn union(&self) -> &PortBytes {
        &self.union
    }

    /// Bitmask of included pins on `port` (`0` if the port is absent).
    pub const fn port_mask(&self, port: u8) -> u8 {
        self.union.port(port)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of (port, pin) entries.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.pins.len()).sum()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.union = PortBytes::ZERO;
    }

    /// Every entry as `(port, pin, wall)`, in canonical order.
    pub fn entries(&self) -> impl Iterator<Item = (u8, u8, u8)> + '_ {
        self.groups
            .iter()
            .flat_map(|g| g.pins.iter().map(move |e| (g.port, e.pin, e.wall)))
    }

    /// Walls with at least one entry.
    pub fn walls(&self) -> WallSet {
        self.entries().fold(WallSet::EMPTY, |mut acc, (_, _, w)| {
            acc.insert(w);
            acc
        })
    }

    /// Walls whose pin is asserted in `levels`.
    pub fn walls_asserted(&self, levels: &PortBytes) -> WallSet {
        self.entries()
            .filter(|&(port, pin, _)| levels.bit(port, pin))
            .fold(WallSet::EMPTY, |mut acc, (_, _, w)| {
                acc.insert(w);
                acc
            })
    }

    /// Register mask covering the pins of `walls`.
    pub fn mask_for(&self, walls: WallSet) -> PortBytes {
        let mut out = PortBytes::ZERO;
        for (port, pin, wall) in self.entries() {
            if walls.contains(wall) {
                out.set(port, pin);
            }
        }
        out
    }

    /// Insert one entry at its canonical position.
    ///
    /// A pin already present on the port is overwritten: one physical pin
    /// cannot carry two walls.
    pub fn insert(&mut self, port: u8, pin: u8, wall: u8) {
        if port as usize >= PORT_COUNT || pin as usize >= PIN_COUNT {
            log::warn!("pinmap: ignoring out-of-range pin {port}.{pin}");
            return;
        }
        let gi = match self.groups.iter().position(|g| g.port >= port) {
            Some(i) if self.groups[i].port == port => i,
            Some(i) => {
                // Capacity is PORT_COUNT and ports are distinct, so the
                // insert cannot overflow.
                let _ = self.groups.insert(i, PortGroup { port, pins: Vec::new(), mask: 0 });
                i
            }
            None => {
                let _ = self.groups.push(PortGroup { port, pins: Vec::new(), mask: 0 });
                self.groups.len() - 1
            }
        };
        let group = &mut self.groups[gi];
        match group.pins.iter().position(|e| e.pin >= pin) {
            Some(i) if group.pins[i].pin == pin => group.pins[i].wall = wall,
            Some(i) => {
                let _ = group.pins.insert(i, PinEntry { pin, wall });
            }
            None => {
                let _ = group.pins.push(PinEntry { pin, wall });
            }
        }
        group.mask |= 1 << pin;
        self.union.set(port, pin);
    }

    /// Drop every entry belonging to `wall`; empty ports disappear.
    pub fn remove_wall(&mut self, wall: u8) {
        for group in self.groups.iter_mut() {
            group.pins.retain(|e| e.wall != wall);
            group.mask = group.pins.iter().fold(0, |m, e| m | (1 << e.pin));
            self.union.0[group.port as usize] = group.mask;
        }
        self.groups.retain(|g| !g.pins.is_empty());
    }
}
