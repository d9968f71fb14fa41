//! Hamming ECC pipes: a byte-aligned "raw" variant that requires
//! block-aligned input, and a "framed" variant that interposes a
//! [`packet`](super::packet) pipe so arbitrary-length input can flow through.

use super::packet::{PacketInputPipe, PacketOutputPipe};
use super::{InputPipe, OutputPipe};
use crate::bits::{BitInputStream, BitOutputStream};
use crate::error::{Error, Result};
use crate::hamming::{decode_hamming1511, decode_hamming74, encode_hamming1511, encode_hamming74};

const H74_DATA_BLOCK: usize = 4; // bytes in; 8 nibbles
const H74_CODE_BLOCK: usize = 7; // bytes out; 8 codewords * 7 bits = 56 bits

const H1511_DATA_BLOCK: usize = 11; // bytes in; 8 codewords of 11 data bits
const H1511_CODE_BLOCK: usize = 16; // bytes out; 8 codewords * 16 bits = 128 bits

fn encode_block_74(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() % H74_DATA_BLOCK != 0 {
        return Err(Error::UnalignedEcc {
            bit_count: data.len() * 8,
            divisor: H74_DATA_BLOCK * 8,
        });
    }
    let mut out = BitOutputStream::new();
    for &byte in data {
        out.write_bits(encode_hamming74(byte >> 4) as u32, 7)?;
        out.write_bits(encode_hamming74(byte & 0x0F) as u32, 7)?;
    }
    out.into_bytes()
}

fn decode_block_74(code: &[u8]) -> Result<Vec<u8>> {
    if code.len() % H74_CODE_BLOCK != 0 {
        return Err(Error::UnalignedEcc {
            bit_count: code.len() * 8,
            divisor: H74_CODE_BLOCK * 8,
        });
    }
    let mut input = BitInputStream::new(code);
    let nibbles_per_block = H74_DATA_BLOCK * 2;
    let blocks = code.len() / H74_CODE_BLOCK;
    let mut out = Vec::with_capacity(blocks * H74_DATA_BLOCK);
    for _ in 0..blocks {
        for pair in 0..(nibbles_per_block / 2) {
            let _ = pair;
            let hi = decode_hamming74(input.read_bits(7)? as u8);
            let lo = decode_hamming74(input.read_bits(7)? as u8);
            out.push((hi << 4) | lo);
        }
    }
    Ok(out)
}

fn encode_block_1511(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() % H1511_DATA_BLOCK != 0 {
        return Err(Error::UnalignedEcc {
            bit_count: data.len() * 8,
            divisor: H1511_DATA_BLOCK * 8,
        });
    }
    let mut out = BitOutputStream::new();
    for block in data.chunks(H1511_DATA_BLOCK) {
        let mut bits = BitOutputStream::new();
        for &b in block {
            bits.write_bits(b as u32, 8)?;
        }
        let block_bits = bits.into_bytes()?;
        let mut reader = BitInputStream::new(&block_bits);
        for _ in 0..8 {
            let codeword = reader.read_bits(11)?;
            out.write_bits(encode_hamming1511(codeword as u16) as u32, 16)?;
        }
    }
    out.into_bytes()
}

fn decode_block_1511(code: &[u8]) -> Result<Vec<u8>> {
    if code.len() % H1511_CODE_BLOCK != 0 {
        return Err(Error::UnalignedEcc {
            bit_count: code.len() * 8,
            divisor: H1511_CODE_BLOCK * 8,
        });
    }
    let blocks = code.len() / H1511_CODE_BLOCK;
    let mut out = Vec::with_capacity(blocks * H1511_DATA_BLOCK);
    let mut reader = BitInputStream::new(code);
    for _ in 0..blocks {
        let mut bits = BitOutputStream::new();
        for _ in 0..8 {
            let codeword = reader.read_bits(16)? as u16;
            let data = decode_hamming1511(codeword)?;
            bits.write_bits(data as u32, 11)?;
        }
        out.extend_from_slice(&bits.into_bytes()?);
    }
    Ok(out)
}

/// Byte-aligned Hamming(7,4) output pipe. Every `write_bytes` call must carry
/// a whole number of 4-byte blocks.
pub struct RawHamming74OutputPipe<'a, P: OutputPipe> {
    downstream: &'a mut P,
}

impl<'a, P: OutputPipe> RawHamming74OutputPipe<'a, P> {
    pub fn new(downstream: &'a mut P) -> Self {
        Self { downstream }
    }
}

impl<'a, P: OutputPipe> OutputPipe for RawHamming74OutputPipe<'a, P> {
    fn write_bytes(&mut self, src: &[u8]) -> Result<usize> {
        let encoded = encode_block_74(src)?;
        let n = self.downstream.write_bytes(&encoded)?;
        if n != encoded.len() {
            return Err(Error::ShortWrite {
                expected: encoded.len(),
                actual: n,
            });
        }
        Ok(src.len())
    }

    fn flush(&mut self) -> Result<()> {
        self.downstream.flush()
    }
}

/// Byte-aligned Hamming(7,4) input pipe. `dst.len()` must be a whole number
/// of 4-byte blocks; the corresponding `dst.len() * 7 / 4` code bytes are
/// read from upstream.
pub struct RawHamming74InputPipe<'a, P: InputPipe> {
    upstream: &'a mut P,
}

impl<'a, P: InputPipe> RawHamming74InputPipe<'a, P> {
    pub fn new(upstream: &'a mut P) -> Self {
        Self { upstream }
    }
}

impl<'a, P: InputPipe> InputPipe for RawHamming74InputPipe<'a, P> {
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<usize> {
        if dst.len() % H74_DATA_BLOCK != 0 {
            return Err(Error::UnalignedEcc {
                bit_count: dst.len() * 8,
                divisor: H74_DATA_BLOCK * 8,
            });
        }
        let code_len = (dst.len() / H74_DATA_BLOCK) * H74_CODE_BLOCK;
        let mut code = vec![0u8; code_len];
        let n = self.upstream.read_bytes(&mut code)?;
        if n != code_len {
            return Err(Error::ShortRead {
                expected: code_len,
                actual: n,
            });
        }
        let decoded = decode_block_74(&code)?;
        dst.copy_from_slice(&decoded);
        Ok(dst.len())
    }
}

/// Byte-aligned extended Hamming(15,11) output pipe. Every `write_bytes`
/// call must carry a whole number of 11-byte blocks.
pub struct RawHamming1511OutputPipe<'a, P: OutputPipe> {
    downstream: &'a mut P,
}

impl<'a, P: OutputPipe> RawHamming1511OutputPipe<'a, P> {
    pub fn new(downstream: &'a mut P) -> Self {
        Self { downstream }
    }
}

impl<'a, P: OutputPipe> OutputPipe for RawHamming1511OutputPipe<'a, P> {
    fn write_bytes(&mut self, src: &[u8]) -> Result<usize> {
        let encoded = encode_block_1511(src)?;
        let n = self.downstream.write_bytes(&encoded)?;
        if n != encoded.len() {
            return Err(Error::ShortWrite {
                expected: encoded.len(),
                actual: n,
            });
        }
        Ok(src.len())
    }

    fn flush(&mut self) -> Result<()> {
        self.downstream.flush()
    }
}

/// Byte-aligned extended Hamming(15,11) input pipe. `dst.len()` must be a
/// whole number of 11-byte blocks.
pub struct RawHamming1511InputPipe<'a, P: InputPipe> {
    upstream: &'a mut P,
}

impl<'a, P: InputPipe> RawHamming1511InputPipe<'a, P> {
    pub fn new(upstream: &'a mut P) -> Self {
        Self { upstream }
    }
}

impl<'a, P: InputPipe> InputPipe for RawHamming1511InputPipe<'a, P> {
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<usize> {
        if dst.len() % H1511_DATA_BLOCK != 0 {
            return Err(Error::UnalignedEcc {
                bit_count: dst.len() * 8,
                divisor: H1511_DATA_BLOCK * 8,
            });
        }
        let code_len = (dst.len() / H1511_DATA_BLOCK) * H1511_CODE_BLOCK;
        let mut code = vec![0u8; code_len];
        let n = self.upstream.read_bytes(&mut code)?;
        if n != code_len {
            return Err(Error::ShortRead {
                expected: code_len,
                actual: n,
            });
        }
        let decoded = decode_block_1511(&code)?;
        dst.copy_from_slice(&decoded);
        Ok(dst.len())
    }
}

/// Data-byte capacity of a framed (7,4) packet's payload, matching the
/// default used when a caller doesn't pick a packet size explicitly.
pub const DEFAULT_H74_DATA_CAPACITY: usize = 256;
/// Data-byte capacity of a framed (15,11) packet's payload.
pub const DEFAULT_H1511_DATA_CAPACITY: usize = 264;

fn default_packet_size(data_capacity: usize, data_block: usize, code_block: usize) -> u32 {
    let code_capacity = (data_capacity / data_block) * code_block;
    (code_capacity + PacketVersion::V1.header_size()) as u32
}

/// Framed Hamming(7,4) output pipe: accepts arbitrary-length writes, encodes
/// each full 4-byte block as it fills, and frames the resulting code bytes
/// into fixed-size packets. This is the recommended entry point over the
/// raw pipe, which requires callers to already write block-aligned chunks.
pub struct Hamming74OutputPipe<'a, P: OutputPipe> {
    packet: PacketOutputPipe<'a, P>,
    pending: Vec<u8>,
}

impl<'a, P: OutputPipe> Hamming74OutputPipe<'a, P> {
    pub fn new(downstream: &'a mut P, packet_size: u32) -> Self {
        Self {
            packet: PacketOutputPipe::new(downstream, packet_size, 0),
            pending: Vec::with_capacity(H74_DATA_BLOCK),
        }
    }

    pub fn with_defaults(downstream: &'a mut P) -> Self {
        Self::new(
            downstream,
            default_packet_size(DEFAULT_H74_DATA_CAPACITY, H74_DATA_BLOCK, H74_CODE_BLOCK),
        )
    }
}

impl<'a, P: OutputPipe> OutputPipe for Hamming74OutputPipe<'a, P> {
    fn write_bytes(&mut self, src: &[u8]) -> Result<usize> {
        self.pending.extend_from_slice(src);
        while self.pending.len() >= H74_DATA_BLOCK {
            let block: Vec<u8> = self.pending.drain(..H74_DATA_BLOCK).collect();
            let encoded = encode_block_74(&block)?;
            self.packet.write_bytes(&encoded)?;
        }
        Ok(src.len())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            let mut block = std::mem::take(&mut self.pending);
            block.resize(H74_DATA_BLOCK, 0);
            let encoded = encode_block_74(&block)?;
            self.packet.write_bytes(&encoded)?;
        }
        self.packet.flush()
    }
}

/// Framed Hamming(7,4) input pipe: the dual of [`Hamming74OutputPipe`].
/// Accepts arbitrary-length reads, pulling and decoding whole code blocks
/// from the underlying packet stream as needed.
pub struct Hamming74InputPipe<'a, P: InputPipe> {
    packet: PacketInputPipe<'a, P>,
    queue: std::collections::VecDeque<u8>,
}

impl<'a, P: InputPipe> Hamming74InputPipe<'a, P> {
    pub fn new(upstream: &'a mut P) -> Self {
        Self {
            packet: PacketInputPipe::new(upstream),
            queue: std::collections::VecDeque::new(),
        }
    }
}

impl<'a, P: InputPipe> InputPipe for Hamming74InputPipe<'a, P> {
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<usize> {
        while self.queue.len() < dst.len() {
            let mut code = vec![0u8; H74_CODE_BLOCK];
            let n = self.packet.read_bytes(&mut code)?;
            if n != H74_CODE_BLOCK {
                return Err(Error::ShortRead {
                    expected: H74_CODE_BLOCK,
                    actual: n,
                });
            }
            let decoded = decode_block_74(&code)?;
            self.queue.extend(decoded);
        }
        for slot in dst.iter_mut() {
            *slot = self.queue.pop_front().expect("queue was just topped up");
        }
        Ok(dst.len())
    }
}

/// Framed extended Hamming(15,11) output pipe. See [`Hamming74OutputPipe`].
pub struct Hamming1511OutputPipe<'a, P: OutputPipe> {
    packet: PacketOutputPipe<'a, P>,
    pending: Vec<u8>,
}

impl<'a, P: OutputPipe> Hamming1511OutputPipe<'a, P> {
    pub fn new(downstream: &'a mut P, packet_size: u32) -> Self {
        Self {
            packet: PacketOutputPipe::new(downstream, packet_size, 0),
            pending: Vec::with_capacity(H1511_DATA_BLOCK),
        }
    }

    pub fn with_defaults(downstream: &'a mut P) -> Self {
        Self::new(
            downstream,
            default_packet_size(
                DEFAULT_H1511_DATA_CAPACITY,
                H1511_DATA_BLOCK,
                H1511_CODE_BLOCK,
            ),
        )
    }
}

impl<'a, P: OutputPipe> OutputPipe for Hamming1511OutputPipe<'a, P> {
    fn write_bytes(&mut self, src: &[u8]) -> Result<usize> {
        self.pending.extend_from_slice(src);
        while self.pending.len() >= H1511_DATA_BLOCK {
            let block: Vec<u8> = self.pending.drain(..H1511_DATA_BLOCK).collect();
            let encoded = encode_block_1511(&block)?;
            self.packet.write_bytes(&encoded)?;
        }
        Ok(src.len())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            let mut block = std::mem::take(&mut self.pending);
            block.resize(H1511_DATA_BLOCK, 0);
            let encoded = encode_block_1511(&block)?;
            self.packet.write_bytes(&encoded)?;
        }
        self.packet.flush()
    }
}

/// Framed extended Hamming(15,11) input pipe. See [`Hamming74InputPipe`].
pub struct Hamming1511InputPipe<'a, P: InputPipe> {
    packet: PacketInputPipe<'a, P>,
    queue: std::collections::VecDeque<u8>,
}

impl<'a, P: InputPipe> Hamming1511InputPipe<'a, P> {
    pub fn new(upstream: &'a mut P) -> Self {
        Self {
            packet: PacketInputPipe::new(upstream),
            queue: std::collections::VecDeque::new(),
        }
    }
}

impl<'a, P: InputPipe> InputPipe for Hamming1511InputPipe<'a, P> {
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<usize> {
        while self.queue.len() < dst.len() {
            let mut code = vec![0u8; H1511_CODE_BLOCK];
            let n = self.packet.read_bytes(&mut code)?;
            if n != H1511_CODE_BLOCK {
                return Err(Error::ShortRead {
                    expected: H1511_CODE_BLOCK,
                    actual: n,
                });
            }
            let decoded = decode_block_1511(&code)?;
            self.queue.extend(decoded);
        }
        for slot in dst.iter_mut() {
            *slot = self.queue.pop_front().expect("queue was just topped up");
        }
        Ok(dst.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `OutputPipe for Vec<u8>` is implemented once, in `packet`'s own test
    // module; it's visible here too since both are compiled into the same
    // crate under `cfg(test)`.

    struct VecPipe {
        data: Vec<u8>,
        pos: usize,
    }
    impl VecPipe {
        fn new(data: Vec<u8>) -> Self {
            Self { data, pos: 0 }
        }
    }
    impl InputPipe for VecPipe {
        fn read_bytes(&mut self, dst: &mut [u8]) -> Result<usize> {
            let n = dst.len().min(self.data.len() - self.pos);
            dst[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn raw_hamming74_round_trips_and_corrects_single_bit_error() {
        let data = [0x00u8, 0x00, 0x00, 0x00];
        let mut sink: Vec<u8> = Vec::new();
        RawHamming74OutputPipe::new(&mut sink)
            .write_bytes(&data)
            .unwrap();
        assert_eq!(sink.len(), H74_CODE_BLOCK);

        for bit in 0..(sink.len() * 8) {
            let mut corrupted = sink.clone();
            corrupted[bit / 8] ^= 1 << (7 - (bit % 8));
            let mut upstream = VecPipe::new(corrupted);
            let mut input = RawHamming74InputPipe::new(&mut upstream);
            let mut out = [0u8; 4];
            input.read_bytes(&mut out).unwrap();
            assert_eq!(out, data, "flipped bit {bit}");
        }
    }

    #[test]
    fn raw_hamming1511_round_trips() {
        let data: Vec<u8> = (0..11u8).collect();
        let mut sink: Vec<u8> = Vec::new();
        RawHamming1511OutputPipe::new(&mut sink)
            .write_bytes(&data)
            .unwrap();
        assert_eq!(sink.len(), H1511_CODE_BLOCK);

        let mut upstream = VecPipe::new(sink);
        let mut input = RawHamming1511InputPipe::new(&mut upstream);
        let mut out = vec![0u8; 11];
        input.read_bytes(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn raw_hamming74_rejects_unaligned_input() {
        let mut sink: Vec<u8> = Vec::new();
        let result = RawHamming74OutputPipe::new(&mut sink).write_bytes(&[0u8; 3]);
        assert!(matches!(result, Err(Error::UnalignedEcc { .. })));
    }

    #[test]
    fn framed_hamming74_round_trips_arbitrary_length_input() {
        // Unlike the raw pipe, the framed pipe accepts any write length and
        // any read length, padding the final partial block on flush.
        let data: Vec<u8> = (0..503u32).map(|i| (i % 251) as u8).collect();
        assert_ne!(data.len() % H74_DATA_BLOCK, 0);
        let mut sink: Vec<u8> = Vec::new();
        {
            let mut out = Hamming74OutputPipe::with_defaults(&mut sink);
            out.write_bytes(&data[..200]).unwrap();
            out.write_bytes(&data[200..]).unwrap();
            out.flush().unwrap();
        }

        let mut upstream = VecPipe::new(sink);
        let mut input = Hamming74InputPipe::new(&mut upstream);
        let mut roundtripped = vec![0u8; data.len()];
        input.read_bytes(&mut roundtripped[..300]).unwrap();
        input.read_bytes(&mut roundtripped[300..]).unwrap();
        assert_eq!(roundtripped, data);
    }

    #[test]
    fn framed_hamming1511_round_trips_arbitrary_length_input() {
        let data: Vec<u8> = (0..530u32).map(|i| (i % 200) as u8).collect();
        let mut sink: Vec<u8> = Vec::new();
        {
            let mut out = Hamming1511OutputPipe::with_defaults(&mut sink);
            out.write_bytes(&data).unwrap();
            out.flush().unwrap();
        }

        let mut upstream = VecPipe::new(sink);
        let mut input = Hamming1511InputPipe::new(&mut upstream);
        let mut roundtripped = vec![0u8; data.len()];
        input.read_bytes(&mut roundtripped).unwrap();
        assert_eq!(roundtripped, data);
    }
}
