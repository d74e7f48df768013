//! Inbound host commands.
//!
//! Each serial message type maps onto one [`HostCommand`], which the
//! [`GateService`](super::service::GateService) interprets.

use heapless::Vec;
use log::warn;

use crate::pins::MAX_CHAMBERS;

pub const MSG_DISCOVER: u8 = 0;
pub const MSG_INIT_WALLS: u8 = 1;
pub const MSG_MOVE: u8 = 2;
pub const MSG_SET_PARAMS: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Scan the bus, rebuild the registry and configure every chip.
    Discover,

    /// Drive all walls up, report positions, then drive them back down.
    InitWalls,

    /// Target position byte per chamber, in registry order.
    Move(Vec<u8, MAX_CHAMBERS>),

    /// Update motor duty and move timeout.
    SetParams { pwm_duty: u8, move_timeout_ms: u16 },
}

impl HostCommand {
    /// Interpret a decoded frame. Unknown or short messages yield `None`.
    pub fn parse(msg_type: u8, data: &[u8]) -> Option<Self> {
        match msg_type {
            MSG_DISCOVER => Some(Self::Discover),
            MSG_INIT_WALLS => Some(Self::InitWalls),
            MSG_MOVE => {
                if data.len() > MAX_CHAMBERS {
                    warn!("Move request for {} chambers; extra bytes ignored", data.len());
                }
                let targets = &data[..data.len().min(MAX_CHAMBERS)];
                Vec::from_slice(targets).ok().map(Self::Move)
            }
            MSG_SET_PARAMS => match *data {
                [pwm_duty, lo, hi, ..] => Some(Self::SetParams {
                    pwm_duty,
                    move_timeout_ms: u16::from_le_bytes([lo, hi]),
                }),
                _ => {
                    warn!("Parameter message too short ({} bytes)", data.len());
                    None
                }
            },
            other => {
                warn!("Unknown message type {}", other);
                None
            }
        }
    }

    pub const fn msg_type(&self) -> u8 {
        match self {
            Self::Discover => MSG_DISCOVER,
            Self::InitWalls => MSG_INIT_WALLS,
            Self::Move(_) => MSG_MOVE,
            Self::SetParams { .. } => MSG_SET_PARAMS,
        }
    }
}
