//! Crate-wide error type.
//!
//! Every fallible operation in this crate returns `Result<T, Error>`. There is
//! no retry or partial-state recovery: once an operation returns `Err`, the
//! pipe, reader, or writer that produced it should be considered unusable.

use std::fmt;

/// Errors produced while reading, writing, or transforming the wire format.
#[derive(Debug)]
pub enum Error {
    /// Fewer bytes were available than the caller asked for.
    ShortRead { expected: usize, actual: usize },

    /// Fewer bytes than requested could be written to the downstream pipe.
    ShortWrite { expected: usize, actual: usize },

    /// The pipe header (or a converter) named a format version this reader/writer
    /// does not support.
    BadVersion(u8),

    /// A value header's primary id nibble did not match any known [`crate::value::PrimaryId`].
    BadPrimaryId(u8),

    /// A value header's secondary id nibble did not match any known [`crate::value::SecondaryId`].
    BadSecondaryId(u8),

    /// A parser/writer was asked to do something illegal in its current state,
    /// e.g. `on_object_end` while not inside an object, or a `UserPod` type id
    /// that does not fit in 20 bits.
    BadState {
        expected: &'static str,
        actual: &'static str,
    },

    /// A Hamming raw pipe was given a byte/bit count that is not a whole multiple
    /// of the codec's block size.
    UnalignedEcc { bit_count: usize, divisor: usize },

    /// A Hamming(15,11) block had more than one bit in error and could not be
    /// corrected.
    UncorrectableEcc,

    /// A packet header failed a structural check (bad version field, header/payload
    /// size inconsistency).
    BadPacketHeader(&'static str),

    /// An underlying byte-stream operation failed.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ShortRead { expected, actual } => {
                write!(f, "short read: expected {expected} bytes, got {actual}")
            }
            Error::ShortWrite { expected, actual } => {
                write!(f, "short write: expected {expected} bytes, wrote {actual}")
            }
            Error::BadVersion(v) => write!(f, "unsupported format version {v}"),
            Error::BadPrimaryId(id) => write!(f, "unknown primary id {id}"),
            Error::BadSecondaryId(id) => write!(f, "unknown secondary id {id}"),
            Error::BadState { expected, actual } => {
                write!(f, "bad state: expected {expected}, was {actual}")
            }
            Error::UnalignedEcc { bit_count, divisor } => write!(
                f,
                "bit count {bit_count} is not a multiple of {divisor}"
            ),
            Error::UncorrectableEcc => write!(f, "uncorrectable double-bit error"),
            Error::BadPacketHeader(msg) => write!(f, "bad packet header: {msg}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
