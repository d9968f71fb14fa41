//! MSB-first bit-level I/O over an in-memory byte buffer.
//!
//! [`BitOutputStream`] packs bit groups of 1..32 bits into a destination
//! buffer, most significant bit first, buffering up to 7 unflushed bits
//! until a whole byte is ready. [`BitInputStream`] is the dual: it fetches
//! whole bytes lazily and dispenses bits from the top of its buffer.
//!
//! Both are thin named wrappers over [`bitstream_io`]'s big-endian bit
//! reader/writer, in the same spirit as this crate's other bit-level types:
//! the heavy lifting is `bitstream_io`'s, we just expose the contract the
//! packet and Hamming pipes are written against.

use crate::error::{Error, Result};
use bitstream_io::read::BitRead as _;
use bitstream_io::write::BitWrite as _;
use bitstream_io::BigEndian;

/// Writes bit groups MSB-first into a growable byte buffer.
pub struct BitOutputStream {
    writer: bitstream_io::write::BitWriter<Vec<u8>, BigEndian>,
}

impl BitOutputStream {
    pub fn new() -> Self {
        Self {
            writer: bitstream_io::write::BitWriter::new(Vec::new()),
        }
    }

    /// Writes the low `n` bits of `bits`, most significant of those bits first.
    ///
    /// `n` must be in `1..=32`.
    pub fn write_bits(&mut self, bits: u32, n: u32) -> Result<()> {
        debug_assert!(n >= 1 && n <= 32);
        let masked = if n == 32 { bits } else { bits & ((1u32 << n) - 1) };
        self.writer
            .write_var(n, masked)
            .map_err(Error::from)
    }

    /// Pads the current partial byte with zero bits and returns the completed
    /// buffer. Any already-whole bytes were flushed as they were produced.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        self.writer.byte_align().map_err(Error::from)?;
        Ok(self.writer.into_writer())
    }

    /// True if the internal buffer currently holds a whole number of bytes,
    /// i.e. there are no pending bits awaiting a full byte.
    pub fn is_byte_aligned(&self) -> bool {
        self.writer.byte_aligned()
    }
}

impl Default for BitOutputStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads bit groups MSB-first from a byte slice.
pub struct BitInputStream<'a> {
    reader: bitstream_io::read::BitReader<&'a [u8], BigEndian>,
}

impl<'a> BitInputStream<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            reader: bitstream_io::read::BitReader::new(bytes),
        }
    }

    /// Returns the next `n` bits as an integer, with the first bit read
    /// occupying position `n - 1`.
    ///
    /// `n` must be in `1..=32`.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        debug_assert!(n >= 1 && n <= 32);
        self.reader.read_var(n).map_err(Error::from)
    }

    /// True if the stream is currently positioned on a byte boundary.
    pub fn is_byte_aligned(&self) -> bool {
        self.reader.byte_aligned()
    }
}
