//! Transport abstraction: any byte-oriented channel to the host PC.
//!
//! The firmware uses the UART; tests use an in-memory loopback. The link is
//! generic over `Transport`, so neither side knows about the other.

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data`, returning the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Write all of `data`, retrying short writes.
pub fn write_all<T: Transport>(transport: &mut T, mut data: &[u8]) -> Result<(), T::Error> {
    while !data.is_empty() {
        let n = transport.write(data)?;
        if n == 0 {
            break;
        }
        data = &data[n..];
    }
    transport.flush()
}
