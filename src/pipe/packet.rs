//! Packet framing: fixed-size packets carrying a header that records how
//! many of the packet's payload bytes are "used", so that non-self-delimiting
//! inner codecs (Hamming blocks in particular) can be layered underneath.

use super::{InputPipe, OutputPipe};
use crate::error::{Error, Result};
use std::collections::VecDeque;

/// Which of the three header layouts a packet uses, chosen by the target
/// packet size.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PacketVersion {
    V1,
    V2,
    V3,
}

impl PacketVersion {
    /// Picks a header version for a packet whose total size (header +
    /// payload) is `packet_size` bytes.
    pub fn for_packet_size(packet_size: u32) -> Self {
        if packet_size > 65_536 {
            PacketVersion::V3
        } else if packet_size >= 256 {
            PacketVersion::V1
        } else {
            PacketVersion::V2
        }
    }

    fn from_marker(marker: u8) -> Result<Self> {
        match marker {
            1 => Ok(PacketVersion::V1),
            2 => Ok(PacketVersion::V2),
            3 => Ok(PacketVersion::V3),
            other => Err(Error::BadPacketHeader(
                if other > 3 { "version field > 3" } else { "version field is zero" },
            )),
        }
    }

    fn marker(self) -> u8 {
        match self {
            PacketVersion::V1 => 1,
            PacketVersion::V2 => 2,
            PacketVersion::V3 => 3,
        }
    }

    pub fn header_size(self) -> usize {
        match self {
            PacketVersion::V1 => 8,
            PacketVersion::V2 => 4,
            PacketVersion::V3 => 14,
        }
    }

    /// Largest payload size (`packet_size - header_size`) this header
    /// version's `used_size`/`packet_size` fields can express (biased by -1).
    pub fn max_packet_size(self) -> u64 {
        match self {
            PacketVersion::V1 => (1u64 << 16) - 1 + self.header_size() as u64,
            PacketVersion::V2 => (1u64 << 15) - 1 + self.header_size() as u64,
            PacketVersion::V3 => (1u64 << 32) - 1 + self.header_size() as u64,
        }
    }
}

/// A decoded packet header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PacketHeader {
    pub version: PacketVersion,
    /// Bytes of payload carrying real data (unbiased).
    pub used_size: u32,
    /// Total packet size including header (unbiased).
    pub packet_size: u32,
}

impl PacketHeader {
    pub fn encode(self) -> Vec<u8> {
        let used_biased = self.used_size.checked_sub(1).expect("used_size >= 1") as u64;
        let packet_biased = self.packet_size.checked_sub(1).expect("packet_size >= 1") as u64;

        match self.version {
            PacketVersion::V1 => {
                let word: u64 = (self.version.marker() as u64)
                    | (used_biased << 2)
                    | (packet_biased << 18)
                    | (0u64 << 34); // reserved
                word.to_le_bytes().to_vec()
            }
            PacketVersion::V2 => {
                let word: u32 = (self.version.marker() as u32)
                    | ((used_biased as u32) << 2)
                    | ((packet_biased as u32) << 17);
                word.to_le_bytes().to_vec()
            }
            PacketVersion::V3 => {
                let mut out = Vec::with_capacity(14);
                out.push(self.version.marker());
                out.push(3); // extended version number
                out.extend_from_slice(&(used_biased as u32).to_le_bytes());
                out.extend_from_slice(&(packet_biased as u32).to_le_bytes());
                out.extend_from_slice(&0u32.to_le_bytes()); // reserved
                out
            }
        }
    }

    /// Decodes a header given its first byte (whose low 2 bits name the
    /// version) and the remaining `header_size - 1` bytes.
    pub fn decode(first_byte: u8, rest: &[u8]) -> Result<Self> {
        let version = PacketVersion::from_marker(first_byte & 0b11)?;
        if rest.len() != version.header_size() - 1 {
            return Err(Error::BadPacketHeader("short header read"));
        }
        match version {
            PacketVersion::V1 => {
                let mut buf = [0u8; 8];
                buf[0] = first_byte;
                buf[1..].copy_from_slice(rest);
                let word = u64::from_le_bytes(buf);
                let used_size = (((word >> 2) & 0xFFFF) + 1) as u32;
                let packet_size = (((word >> 18) & 0xFFFF) + 1) as u32;
                Ok(PacketHeader {
                    version,
                    used_size,
                    packet_size,
                })
            }
            PacketVersion::V2 => {
                let mut buf = [0u8; 4];
                buf[0] = first_byte;
                buf[1..].copy_from_slice(rest);
                let word = u32::from_le_bytes(buf);
                let used_size = ((word >> 2) & 0x7FFF) + 1;
                let packet_size = ((word >> 17) & 0x7FFF) + 1;
                Ok(PacketHeader {
                    version,
                    used_size,
                    packet_size,
                })
            }
            PacketVersion::V3 => {
                if rest[0] != 3 {
                    return Err(Error::BadPacketHeader("unsupported extended version"));
                }
                let used_size = u32::from_le_bytes(rest[1..5].try_into().unwrap()) + 1;
                let packet_size = u32::from_le_bytes(rest[5..9].try_into().unwrap()) + 1;
                Ok(PacketHeader {
                    version,
                    used_size,
                    packet_size,
                })
            }
        }
    }
}

/// Frames writes into fixed-size packets, flushing a packet whenever the
/// configured payload capacity is reached. A trailing short packet is
/// emitted by `flush`, with its unused tail padded with `fill_byte`.
pub struct PacketOutputPipe<'a, P: OutputPipe> {
    downstream: &'a mut P,
    version: PacketVersion,
    payload_capacity: usize,
    buffer: Vec<u8>,
    fill_byte: u8,
}

impl<'a, P: OutputPipe> PacketOutputPipe<'a, P> {
    /// `packet_size` is the *total* size (header + payload) of a full packet.
    pub fn new(downstream: &'a mut P, packet_size: u32, fill_byte: u8) -> Self {
        let version = PacketVersion::for_packet_size(packet_size);
        let payload_capacity = packet_size as usize - version.header_size();
        Self {
            downstream,
            version,
            payload_capacity,
            buffer: Vec::with_capacity(payload_capacity),
            fill_byte,
        }
    }

    fn emit_packet(&mut self, used_size: usize) -> Result<()> {
        let header = PacketHeader {
            version: self.version,
            used_size: used_size as u32,
            packet_size: (self.version.header_size() + self.payload_capacity) as u32,
        };
        let mut out = header.encode();
        out.extend_from_slice(&self.buffer);
        out.resize(
            self.version.header_size() + self.payload_capacity,
            self.fill_byte,
        );
        let n = self.downstream.write_bytes(&out)?;
        if n != out.len() {
            return Err(Error::ShortWrite {
                expected: out.len(),
                actual: n,
            });
        }
        self.buffer.clear();
        Ok(())
    }
}

impl<'a, P: OutputPipe> OutputPipe for PacketOutputPipe<'a, P> {
    fn write_bytes(&mut self, mut src: &[u8]) -> Result<usize> {
        let total = src.len();
        while !src.is_empty() {
            let space = self.payload_capacity - self.buffer.len();
            let take = space.min(src.len());
            self.buffer.extend_from_slice(&src[..take]);
            src = &src[take..];
            if self.buffer.len() == self.payload_capacity {
                self.emit_packet(self.payload_capacity)?;
            }
        }
        Ok(total)
    }

    fn flush(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            let used = self.buffer.len();
            self.emit_packet(used)?;
        }
        self.downstream.flush()
    }
}

/// Reads packets from upstream and drains their "used" payload bytes through
/// an internal queue, pulling additional packets as needed.
pub struct PacketInputPipe<'a, P: InputPipe> {
    upstream: &'a mut P,
    queue: VecDeque<u8>,
}

impl<'a, P: InputPipe> PacketInputPipe<'a, P> {
    pub fn new(upstream: &'a mut P) -> Self {
        Self {
            upstream,
            queue: VecDeque::new(),
        }
    }

    fn read_next_packet(&mut self) -> Result<()> {
        let mut first = [0u8; 1];
        let n = self.upstream.read_bytes(&mut first)?;
        if n == 0 {
            return Err(Error::ShortRead {
                expected: 1,
                actual: 0,
            });
        }
        let version = PacketVersion::from_marker(first[0] & 0b11)?;
        let mut rest = vec![0u8; version.header_size() - 1];
        let n = self.upstream.read_bytes(&mut rest)?;
        if n != rest.len() {
            return Err(Error::ShortRead {
                expected: rest.len(),
                actual: n,
            });
        }
        let header = PacketHeader::decode(first[0], &rest)?;

        let payload_len = header.packet_size as usize - version.header_size();
        let mut payload = vec![0u8; payload_len];
        let n = self.upstream.read_bytes(&mut payload)?;
        if n != payload_len {
            return Err(Error::ShortRead {
                expected: payload_len,
                actual: n,
            });
        }
        if header.used_size as usize > payload_len {
            return Err(Error::BadPacketHeader("used_size exceeds payload size"));
        }
        self.queue
            .extend(payload[..header.used_size as usize].iter().copied());
        Ok(())
    }
}

impl<'a, P: InputPipe> InputPipe for PacketInputPipe<'a, P> {
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < dst.len() {
            if self.queue.is_empty() {
                self.read_next_packet()?;
            }
            while filled < dst.len() {
                match self.queue.pop_front() {
                    Some(b) => {
                        dst[filled] = b;
                        filled += 1;
                    }
                    None => break,
                }
            }
        }
        Ok(filled)
    }
}
