//! Stackable byte-pipe abstraction: [`InputPipe`]/[`OutputPipe`] are the
//! capability traits that packetization, run-length encoding, and Hamming
//! ECC wrap to build up a transform stack, one layer borrowing the next.

pub mod hamming;
pub mod packet;
pub mod rle;

use crate::error::Result;

/// A source of bytes. Implementations fill `dst` completely unless the
/// underlying source is exhausted, in which case they return the short
/// count actually read (never an error purely for reaching end-of-stream;
/// callers that need an exact count use [`Error::ShortRead`](crate::error::Error::ShortRead)
/// for that).
pub trait InputPipe {
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<usize>;
}

/// A sink for bytes.
pub trait OutputPipe {
    fn write_bytes(&mut self, src: &[u8]) -> Result<usize>;

    /// Flushes any buffered bytes downstream. Pipes that buffer into
    /// fixed-size blocks (packet framing) emit a final, partially-filled
    /// block here.
    fn flush(&mut self) -> Result<()>;
}

/// Adapts a [`std::io::Read`] into an [`InputPipe`] that requires an exact fill.
pub struct ReadPipe<R> {
    inner: R,
}

impl<R: std::io::Read> ReadPipe<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: std::io::Read> InputPipe for ReadPipe<R> {
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<usize> {
        self.inner.read_exact(dst)?;
        Ok(dst.len())
    }
}

/// Adapts a [`std::io::Write`] into an [`OutputPipe`].
pub struct WritePipe<W> {
    inner: W,
}

impl<W: std::io::Write> WritePipe<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: std::io::Write> OutputPipe for WritePipe<W> {
    fn write_bytes(&mut self, src: &[u8]) -> Result<usize> {
        self.inner.write_all(src)?;
        Ok(src.len())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}
