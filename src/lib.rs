//! A composable binary serialization pipeline: a tagged TLV-style wire
//! format with a streaming [`writer::Writer`] and event-driven
//! [`reader::Reader`], stackable byte [`pipe`]s (packet framing, run-length
//! encoding, Hamming error correction), and a [`json::JsonWriter`] consumer
//! of the same [`parser::Parser`] event stream.

#[cfg(test)]
#[macro_use]
extern crate hex_literal;

pub mod bits;
pub mod error;
pub mod hamming;
pub mod json;
pub mod parser;
pub mod pipe;
pub mod reader;
pub mod value;
pub mod version_convert;
pub mod writer;
