//! STX/ETX frame codec.
//!
//! Wire format:
//! ```text
//! ┌──────┬──────────┬─────────┬──────────────┬──────────┬──────┐
//! │ 0x02 │ msg_type │ len (1B)│ data (≤200B) │ checksum │ 0x03 │
//! └──────┴──────────┴─────────┴──────────────┴──────────┴──────┘
//! ```
//!
//! The decoder is fed one byte at a time and yields complete frames. A
//! malformed frame is dropped and the decoder resynchronises on the next
//! start byte; nothing is ever sent back for it.

use crate::config::ChecksumMode;
use crate::error::FrameError;

pub const START_BYTE: u8 = 0x02;
pub const END_BYTE: u8 = 0x03;

/// Maximum data bytes in one frame.
pub const MAX_PAYLOAD: usize = 200;

/// Bytes around the payload: start, type, length, checksum, end.
const OVERHEAD: usize = 5;

/// Largest encoded frame.
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD + OVERHEAD;

/// Frame checksum under `mode`.
pub fn checksum(mode: ChecksumMode, msg_type: u8, data: &[u8]) -> u8 {
    let sum = data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    match mode {
        ChecksumMode::DataOnly => sum,
        ChecksumMode::WithType => sum.wrapping_add(msg_type),
    }
}

/// A decoded frame, borrowed from the decoder's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub msg_type: u8,
    pub data: &'a [u8],
}

/// Decoder state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Waiting for a start byte.
    Idle { discarding: bool },
    MsgType,
    Length,
    Data { expected: usize, collected: usize },
    Checksum { len: usize },
    End { len: usize, checksum: u8 },
}

/// Streaming frame decoder with an inter-byte timeout.
pub struct FrameDecoder {
    state: DecoderState,
    mode: ChecksumMode,
    byte_timeout_ms: u32,
    last_byte_ms: u32,
    msg_type: u8,
    payload_buf: [u8; MAX_PAYLOAD],
}

impl FrameDecoder {
    pub fn new(mode: ChecksumMode, byte_timeout_ms: u32) -> Self {
        Self {
            state: DecoderState::Idle { discarding: false },
            mode,
            byte_timeout_ms,
            last_byte_ms: 0,
            msg_type: 0,
            payload_buf: [0; MAX_PAYLOAD],
        }
    }

    /// Whether a frame is partially received.
    pub fn in_frame(&self) -> bool {
        !matches!(self.state, DecoderState::Idle { .. })
    }

    /// Drop a partial frame whose last byte is older than the timeout.
    pub fn check_timeout(&mut self, now_ms: u32) -> Option<FrameError> {
        if self.in_frame() && now_ms.wrapping_sub(self.last_byte_ms) > self.byte_timeout_ms {
            self.reset();
            return Some(FrameError::ByteTimeout);
        }
        None
    }

    /// Feed one byte.
    ///
    /// Returns `Some(Ok(frame))` when a frame completes and `Some(Err(_))`
    /// when a frame is dropped. The frame borrows the decoder until the
    /// next call.
    pub fn push(&mut self, byte: u8, now_ms: u32) -> Option<Result<Frame<'_>, FrameError>> {
        if let Some(e) = self.check_timeout(now_ms) {
            // A late byte starts over; report the drop only if it is not a
            // start byte itself.
            if byte != START_BYTE {
                self.last_byte_ms = now_ms;
                self.state = DecoderState::Idle { discarding: true };
                return Some(Err(e));
            }
        }
        self.last_byte_ms = now_ms;

        match self.state {
            DecoderState::Idle { discarding } => {
                if byte == START_BYTE {
                    self.state = DecoderState::MsgType;
                } else if !discarding {
                    self.state = DecoderState::Idle { discarding: true };
                    return Some(Err(FrameError::BadStartByte));
                }
            }
            DecoderState::MsgType => {
                self.msg_type = byte;
                self.state = DecoderState::Length;
            }
            DecoderState::Length => {
                let len = usize::from(byte);
                if len > MAX_PAYLOAD {
                    return self.fail(FrameError::PayloadTooLarge);
                }
                self.state = if len == 0 {
                    DecoderState::Checksum { len: 0 }
                } else {
                    DecoderState::Data { expected: len, collected: 0 }
                };
            }
            DecoderState::Data { expected, collected } => {
                self.payload_buf[collected] = byte;
                let collected = collected + 1;
                self.state = if collected == expected {
                    DecoderState::Checksum { len: expected }
                } else {
                    DecoderState::Data { expected, collected }
                };
            }
            DecoderState::Checksum { len } => {
                self.state = DecoderState::End { len, checksum: byte };
            }
            DecoderState::End { len, checksum: received } => {
                if byte != END_BYTE {
                    return self.fail(FrameError::BadEndByte);
                }
                let data = &self.payload_buf[..len];
                if checksum(self.mode, self.msg_type, data) != received {
                    return self.fail(FrameError::ChecksumMismatch);
                }
                self.state = DecoderState::Idle { discarding: false };
                return Some(Ok(Frame { msg_type: self.msg_type, data: &self.payload_buf[..len] }));
            }
        }
        None
    }

    fn fail(&mut self, error: FrameError) -> Option<Result<Frame<'_>, FrameError>> {
        self.state = DecoderState::Idle { discarding: true };
        Some(Err(error))
    }

    /// Reset decoder state (e.g. after a transport error).
    pub fn reset(&mut self) {
        self.state = DecoderState::Idle { discarding: false };
    }
}

/// Encode one frame into `out_buf`.
///
/// Returns the number of bytes written, or `None` if the payload is too
/// large or `out_buf` too small.
pub fn encode_frame(
    msg_type: u8,
    payload: &[u8],
    mode: ChecksumMode,
    out_buf: &mut [u8],
) -> Option<usize> {
    let total = payload.len() + OVERHEAD;
    if payload.len() > MAX_PAYLOAD || total > out_buf.len() {
        return None;
    }
    out_buf[0] = START_BYTE;
    out_buf[1] = msg_type;
    out_buf[2] = payload.len() as u8;
    out_buf[3..3 + payload.len()].copy_from_slice(payload);
    out_buf[total - 2] = checksum(mode, msg_type, payload);
    out_buf[total - 1] = END_BYTE;
    Some(total)
}
