//! Serial link: decode host frames, dispatch, answer.

use heapless::Vec;
use log::{debug, warn};

use crate::app::ports::{Clock, EventSink, RegisterBus};
use crate::app::service::GateService;
use crate::config::{ChecksumMode, SerialConfig};

use super::codec::{FrameDecoder, MAX_FRAME_LEN, MAX_PAYLOAD, encode_frame};
use super::transport::{Transport, write_all};

const RX_CHUNK: usize = 64;

/// Glues a [`Transport`] to the [`GateService`].
pub struct SerialLink<T: Transport> {
    transport: T,
    decoder: FrameDecoder,
    tx_mode: ChecksumMode,
    rx_buf: [u8; RX_CHUNK],
    tx_buf: [u8; MAX_FRAME_LEN],
}

impl<T: Transport> SerialLink<T> {
    pub fn new(transport: T, config: &SerialConfig) -> Self {
        Self {
            transport,
            decoder: FrameDecoder::new(config.rx_checksum, u32::from(config.byte_timeout_ms)),
            tx_mode: config.tx_checksum,
            rx_buf: [0; RX_CHUNK],
            tx_buf: [0; MAX_FRAME_LEN],
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Read everything available and handle each complete frame.
    ///
    /// Returns the number of frames dispatched. A failed response write does
    /// not stop the remaining bytes from being handled; the first such
    /// error is returned once the read loop is done.
    pub fn poll(
        &mut self,
        service: &mut GateService,
        hw: &mut (impl RegisterBus + Clock),
        sink: &mut impl EventSink,
    ) -> Result<usize, T::Error> {
        if let Some(e) = self.decoder.check_timeout(hw.now_ms()) {
            debug!("Frame dropped: {}", e);
        }

        let mut handled = 0;
        let mut send_error = None;
        loop {
            let n = self.transport.read(&mut self.rx_buf)?;
            if n == 0 {
                break;
            }
            for i in 0..n {
                let byte = self.rx_buf[i];
                let (msg_type, data) = match self.decoder.push(byte, hw.now_ms()) {
                    Some(Ok(frame)) => {
                        let mut data: Vec<u8, MAX_PAYLOAD> = Vec::new();
                        // Decoded payloads never exceed MAX_PAYLOAD.
                        let _ = data.extend_from_slice(frame.data);
                        (frame.msg_type, data)
                    }
                    Some(Err(e)) => {
                        debug!("Frame dropped: {}", e);
                        continue;
                    }
                    None => continue,
                };

                debug!("Frame type {} ({} bytes)", msg_type, data.len());
                handled += 1;
                if let Some(response) = service.handle_frame(msg_type, &data, hw, sink) {
                    if let Err(e) = self.send(msg_type, &response) {
                        warn!("Response for type {} not sent: {:?}", msg_type, e);
                        send_error.get_or_insert(e);
                    }
                }
                service.run_deferred(hw, sink);
            }
        }
        send_error.map_or(Ok(handled), Err)
    }

    /// Encode and write one response frame.
    pub fn send(&mut self, msg_type: u8, payload: &[u8]) -> Result<(), T::Error> {
        match encode_frame(msg_type, payload, self.tx_mode, &mut self.tx_buf) {
            Some(len) => write_all(&mut self.transport, &self.tx_buf[..len]),
            None => {
                warn!("Response for type {} too large ({} bytes)", msg_type, payload.len());
                Ok(())
            }
        }
    }
}
