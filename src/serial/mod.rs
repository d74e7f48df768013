//! Host serial link.
//!
//! ```text
//!  Transport ──▶ FrameDecoder ──▶ GateService ──▶ encode_frame ──▶ Transport
//! ```

pub mod codec;
pub mod link;
pub mod transport;

pub use codec::{Frame, FrameDecoder, MAX_FRAME_LEN, MAX_PAYLOAD, encode_frame};
pub use link::SerialLink;
pub use transport::Transport;
