//! Reads the binary wire format and dispatches [`Parser`] events.

use crate::error::{Error, Result};
use crate::parser::{Parser, Version};
use crate::pipe::InputPipe;
use crate::value::{PrimaryId, SecondaryId};
use crate::version_convert::VersionConverter;

/// Reads a pipe header, then repeatedly reads value headers and dispatches
/// to the matching `on_*` call on a [`Parser`] sink, recursing into
/// sub-trees for arrays and objects, until it reads the top-level
/// terminator.
///
/// Keeps a single growable scratch buffer reused across typed-array reads
/// rather than allocating one per call.
pub struct Reader<P: InputPipe> {
    pipe: P,
    max_version: Version,
    scratch: Vec<u8>,
}

impl<P: InputPipe> Reader<P> {
    /// `max_version` is the highest wire-format version this reader is
    /// willing to decode; a pipe header naming a higher version fails with
    /// [`Error::BadVersion`].
    pub fn new(pipe: P, max_version: Version) -> Self {
        Self {
            pipe,
            max_version,
            scratch: Vec::new(),
        }
    }

    pub fn into_inner(self) -> P {
        self.pipe
    }

    fn read_exact(&mut self, n: usize) -> Result<()> {
        if self.scratch.len() < n {
            self.scratch.resize(n, 0);
        }
        let got = self.pipe.read_bytes(&mut self.scratch[..n])?;
        if got != n {
            return Err(Error::ShortRead {
                expected: n,
                actual: got,
            });
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.read_exact(1)?;
        Ok(self.scratch[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        self.read_exact(2)?;
        Ok(u16::from_le_bytes([self.scratch[0], self.scratch[1]]))
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.read_exact(4)?;
        Ok(u32::from_le_bytes([
            self.scratch[0],
            self.scratch[1],
            self.scratch[2],
            self.scratch[3],
        ]))
    }

    fn read_u64(&mut self) -> Result<u64> {
        self.read_exact(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.scratch[..8]);
        Ok(u64::from_le_bytes(buf))
    }

    fn read_bytes_owned(&mut self, n: usize) -> Result<Vec<u8>> {
        self.read_exact(n)?;
        Ok(self.scratch[..n].to_vec())
    }

    /// Reads the pipe header and drives `sink` with events until the
    /// top-level terminator. Returns the wire version read from the header.
    pub fn read_pipe<S: Parser>(&mut self, sink: &mut S) -> Result<Version> {
        let version_byte = self.read_u8()?;
        let version = Version::from_u8(version_byte).ok_or(Error::BadVersion(version_byte))?;
        if version > self.max_version {
            return Err(Error::BadVersion(version_byte));
        }
        sink.on_pipe_open()?;
        loop {
            let header = self.read_u8()?;
            let primary = PrimaryId::from_nibble(header >> 4)?;
            if matches!(primary, PrimaryId::Null) && header == 0 {
                break;
            }
            let secondary_nibble = header & 0x0F;
            self.dispatch_value(version, primary, secondary_nibble, sink)?;
        }
        sink.on_pipe_close()?;
        Ok(version)
    }

    fn dispatch_value<S: Parser>(
        &mut self,
        version: Version,
        primary: PrimaryId,
        secondary_nibble: u8,
        sink: &mut S,
    ) -> Result<()> {
        log::trace!("dispatch value: primary={primary:?} secondary_nibble={secondary_nibble}");
        match primary {
            PrimaryId::Null => sink.on_null(),
            PrimaryId::Primitive => self.read_primitive(secondary_nibble, sink),
            PrimaryId::String => {
                let len = self.read_u32()? as usize;
                let bytes = self.read_bytes_owned(len)?;
                let s = String::from_utf8_lossy(&bytes);
                sink.on_primitive_string(&s)
            }
            PrimaryId::Array => self.read_array(version, sink),
            PrimaryId::Object => self.read_object(version, sink),
            PrimaryId::UserPod => self.read_user_pod(secondary_nibble, sink),
        }
    }

    fn read_primitive<S: Parser>(&mut self, secondary_nibble: u8, sink: &mut S) -> Result<()> {
        let secondary = SecondaryId::from_nibble(secondary_nibble)?;
        match secondary {
            SecondaryId::Null => sink.on_null(),
            SecondaryId::U8 => {
                let v = self.read_u8()?;
                sink.on_primitive_u8(v)
            }
            SecondaryId::U16 => {
                let v = self.read_u16()?;
                sink.on_primitive_u16(v)
            }
            SecondaryId::U32 => {
                let v = self.read_u32()?;
                sink.on_primitive_u32(v)
            }
            SecondaryId::U64 => {
                let v = self.read_u64()?;
                sink.on_primitive_u64(v)
            }
            SecondaryId::S8 => {
                let v = self.read_u8()? as i8;
                sink.on_primitive_s8(v)
            }
            SecondaryId::S16 => {
                let v = self.read_u16()? as i16;
                sink.on_primitive_s16(v)
            }
            SecondaryId::S32 => {
                let v = self.read_u32()? as i32;
                sink.on_primitive_s32(v)
            }
            SecondaryId::S64 => {
                let v = self.read_u64()? as i64;
                sink.on_primitive_s64(v)
            }
            SecondaryId::F32 => {
                let v = f32::from_bits(self.read_u32()?);
                sink.on_primitive_f32(v)
            }
            SecondaryId::F64 => {
                let v = f64::from_bits(self.read_u64()?);
                sink.on_primitive_f64(v)
            }
            SecondaryId::C8 => {
                let v = self.read_u8()?;
                sink.on_primitive_c8(v)
            }
            SecondaryId::F16 => {
                let v = self.read_u16()?;
                sink.on_primitive_f16(v)
            }
        }
    }

    fn read_array<S: Parser>(&mut self, version: Version, sink: &mut S) -> Result<()> {
        let size = self.read_u32()?;
        if version == Version::V1 {
            return self.read_heterogeneous_array(size, version, sink);
        }
        let element_nibble = self.read_u8()?;
        let element = SecondaryId::from_nibble(element_nibble)?;
        if matches!(element, SecondaryId::Null) {
            return self.read_heterogeneous_array(size, version, sink);
        }
        self.read_typed_array(size as usize, element, sink)
    }

    fn read_heterogeneous_array<S: Parser>(
        &mut self,
        size: u32,
        version: Version,
        sink: &mut S,
    ) -> Result<()> {
        sink.on_array_begin(size)?;
        for _ in 0..size {
            let header = self.read_u8()?;
            let primary = PrimaryId::from_nibble(header >> 4)?;
            self.dispatch_value(version, primary, header & 0x0F, sink)?;
        }
        sink.on_array_end()
    }

    /// Reads a typed-array payload and delivers it to `sink`. If `sink`
    /// advertises a version below the one a bulk-array call requires, the
    /// call is routed through a [`VersionConverter`] that decomposes it into
    /// `on_array_begin`/per-element/`on_array_end` instead of calling the
    /// sink's bulk method directly — sinks that only claim V1 support are
    /// not required to handle being called with a bulk event at all.
    fn read_typed_array<S: Parser>(
        &mut self,
        size: usize,
        element: SecondaryId,
        sink: &mut S,
    ) -> Result<()> {
        if sink.supported_version() < Version::V2 {
            let mut conv = VersionConverter::new(sink, Version::V1);
            return self.deliver_typed_array(size, element, &mut conv);
        }
        self.deliver_typed_array(size, element, sink)
    }

    fn deliver_typed_array<S: Parser>(
        &mut self,
        size: usize,
        element: SecondaryId,
        sink: &mut S,
    ) -> Result<()> {
        match element {
            SecondaryId::U8 => {
                let raw = self.read_bytes_owned(size)?;
                sink.on_primitive_array_u8(&raw)
            }
            SecondaryId::C8 => {
                let raw = self.read_bytes_owned(size)?;
                sink.on_primitive_array_c8(&raw)
            }
            SecondaryId::S8 => {
                let raw = self.read_bytes_owned(size)?;
                let values: Vec<i8> = raw.iter().map(|&b| b as i8).collect();
                sink.on_primitive_array_s8(&values)
            }
            SecondaryId::U16 => {
                let raw = self.read_bytes_owned(size * 2)?;
                let values: Vec<u16> = raw
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect();
                sink.on_primitive_array_u16(&values)
            }
            SecondaryId::S16 => {
                let raw = self.read_bytes_owned(size * 2)?;
                let values: Vec<i16> = raw
                    .chunks_exact(2)
                    .map(|c| i16::from_le_bytes([c[0], c[1]]))
                    .collect();
                sink.on_primitive_array_s16(&values)
            }
            SecondaryId::F16 => Err(Error::BadSecondaryId(SecondaryId::F16 as u8)),
            SecondaryId::U32 => {
                let raw = self.read_bytes_owned(size * 4)?;
                let values: Vec<u32> = raw
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
                    .collect();
                sink.on_primitive_array_u32(&values)
            }
            SecondaryId::S32 => {
                let raw = self.read_bytes_owned(size * 4)?;
                let values: Vec<i32> = raw
                    .chunks_exact(4)
                    .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
                    .collect();
                sink.on_primitive_array_s32(&values)
            }
            SecondaryId::F32 => {
                let raw = self.read_bytes_owned(size * 4)?;
                let values: Vec<f32> = raw
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
                    .collect();
                sink.on_primitive_array_f32(&values)
            }
            SecondaryId::U64 => {
                let raw = self.read_bytes_owned(size * 8)?;
                let values: Vec<u64> = raw
                    .chunks_exact(8)
                    .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
                    .collect();
                sink.on_primitive_array_u64(&values)
            }
            SecondaryId::S64 => {
                let raw = self.read_bytes_owned(size * 8)?;
                let values: Vec<i64> = raw
                    .chunks_exact(8)
                    .map(|c| i64::from_le_bytes(c.try_into().unwrap()))
                    .collect();
                sink.on_primitive_array_s64(&values)
            }
            SecondaryId::F64 => {
                let raw = self.read_bytes_owned(size * 8)?;
                let values: Vec<f64> = raw
                    .chunks_exact(8)
                    .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
                    .collect();
                sink.on_primitive_array_f64(&values)
            }
            SecondaryId::Null => unreachable!("caller routes Null to the heterogeneous path"),
        }
    }

    fn read_object<S: Parser>(&mut self, version: Version, sink: &mut S) -> Result<()> {
        let count = self.read_u32()?;
        sink.on_object_begin(count)?;
        for _ in 0..count {
            let id = self.read_u16()?;
            sink.on_component_id(id)?;
            let header = self.read_u8()?;
            let primary = PrimaryId::from_nibble(header >> 4)?;
            self.dispatch_value(version, primary, header & 0x0F, sink)?;
        }
        sink.on_object_end()
    }

    fn read_user_pod<S: Parser>(&mut self, low_nibble: u8, sink: &mut S) -> Result<()> {
        let high = self.read_u16()?;
        let type_id = ((high as u32) << 4) | low_nibble as u32;
        let byte_count = self.read_u32()? as usize;
        let bytes = self.read_bytes_owned(byte_count)?;
        sink.on_user_pod(type_id, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Object, PrimitiveValue, Value};
    use crate::writer::Writer;

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

    /// A sink that builds a reference [`Value`] tree from the event stream,
    /// used to assert reader/writer round trips structurally.
    #[derive(Default)]
    struct ValueBuilder {
        // Stack of in-progress containers; the top is where the next
        // completed value is appended. `None` entries are pending
        // component ids awaiting their value.
        stack: Vec<Value>,
        pending_component: Vec<Option<u16>>,
        root: Option<Value>,
    }

    impl ValueBuilder {
        fn push_value(&mut self, value: Value) -> Result<()> {
            match self.stack.last_mut() {
                Some(Value::Array(_)) => {
                    self.stack.last_mut().unwrap().add_value(value)?;
                }
                Some(Value::Object(_)) => {
                    let id = self
                        .pending_component
                        .last_mut()
                        .and_then(|slot| slot.take())
                        .expect("component id must precede a value");
                    self.stack.last_mut().unwrap().add_member(id, value)?;
                }
                _ => {
                    self.root = Some(value);
                }
            }
            Ok(())
        }
    }

    impl Parser for ValueBuilder {
        fn on_pipe_open(&mut self) -> Result<()> {
            Ok(())
        }
        fn on_pipe_close(&mut self) -> Result<()> {
            Ok(())
        }
        fn on_array_begin(&mut self, _size: u32) -> Result<()> {
            self.stack.push(Value::Array(Vec::new()));
            Ok(())
        }
        fn on_array_end(&mut self) -> Result<()> {
            let v = self.stack.pop().expect("array_end without array_begin");
            self.push_value(v)
        }
        fn on_object_begin(&mut self, _count: u32) -> Result<()> {
            self.stack.push(Value::Object(Object::new()));
            self.pending_component.push(None);
            Ok(())
        }
        fn on_object_end(&mut self) -> Result<()> {
            self.pending_component.pop();
            let v = self.stack.pop().expect("object_end without object_begin");
            self.push_value(v)
        }
        fn on_component_id(&mut self, id: u16) -> Result<()> {
            *self.pending_component.last_mut().unwrap() = Some(id);
            Ok(())
        }
        fn on_null(&mut self) -> Result<()> {
            self.push_value(Value::Null)
        }
        fn on_user_pod(&mut self, _type_id: u32, _bytes: &[u8]) -> Result<()> {
            self.push_value(Value::Null)
        }
        fn on_primitive_bool(&mut self, value: bool) -> Result<()> {
            self.push_value(Value::Primitive(PrimitiveValue::Bool(value)))
        }
        fn on_primitive_c8(&mut self, value: u8) -> Result<()> {
            self.push_value(Value::Primitive(PrimitiveValue::C8(value)))
        }
        fn on_primitive_u8(&mut self, value: u8) -> Result<()> {
            self.push_value(Value::Primitive(PrimitiveValue::U8(value)))
        }
        fn on_primitive_u16(&mut self, value: u16) -> Result<()> {
            self.push_value(Value::Primitive(PrimitiveValue::U16(value)))
        }
        fn on_primitive_u32(&mut self, value: u32) -> Result<()> {
            self.push_value(Value::Primitive(PrimitiveValue::U32(value)))
        }
        fn on_primitive_u64(&mut self, value: u64) -> Result<()> {
            self.push_value(Value::Primitive(PrimitiveValue::U64(value)))
        }
        fn on_primitive_s8(&mut self, value: i8) -> Result<()> {
            self.push_value(Value::Primitive(PrimitiveValue::S8(value)))
        }
        fn on_primitive_s16(&mut self, value: i16) -> Result<()> {
            self.push_value(Value::Primitive(PrimitiveValue::S16(value)))
        }
        fn on_primitive_s32(&mut self, value: i32) -> Result<()> {
            self.push_value(Value::Primitive(PrimitiveValue::S32(value)))
        }
        fn on_primitive_s64(&mut self, value: i64) -> Result<()> {
            self.push_value(Value::Primitive(PrimitiveValue::S64(value)))
        }
        fn on_primitive_f16(&mut self, value: u16) -> Result<()> {
            self.push_value(Value::Primitive(PrimitiveValue::F16(value)))
        }
        fn on_primitive_f32(&mut self, value: f32) -> Result<()> {
            self.push_value(Value::Primitive(PrimitiveValue::F32(value)))
        }
        fn on_primitive_f64(&mut self, value: f64) -> Result<()> {
            self.push_value(Value::Primitive(PrimitiveValue::F64(value)))
        }
        fn on_primitive_string(&mut self, value: &str) -> Result<()> {
            self.push_value(Value::String(value.to_owned()))
        }
    }

    #[test]
    fn primitive_round_trips_through_writer_and_reader() {
        let mut w = Writer::new(Vec::<u8>::new(), Version::V1);
        w.on_pipe_open().unwrap();
        w.on_primitive_u32(0xDEADBEEF).unwrap();
        w.on_pipe_close().unwrap();
        let bytes = w.into_inner();

        let mut reader = Reader::new(VecPipe::new(bytes), Version::V1);
        let mut sink = ValueBuilder::default();
        reader.read_pipe(&mut sink).unwrap();
        assert_eq!(
            sink.root,
            Some(Value::Primitive(PrimitiveValue::U32(0xDEADBEEF)))
        );
    }

    #[test]
    fn object_round_trips_preserving_insertion_order() {
        let mut w = Writer::new(Vec::<u8>::new(), Version::V1);
        w.on_pipe_open().unwrap();
        w.on_object_begin(2).unwrap();
        w.on_component_id(7).unwrap();
        w.on_primitive_bool(true).unwrap();
        w.on_component_id(9).unwrap();
        w.on_primitive_string("hi").unwrap();
        w.on_object_end().unwrap();
        w.on_pipe_close().unwrap();
        let bytes = w.into_inner();

        let mut reader = Reader::new(VecPipe::new(bytes), Version::V1);
        let mut sink = ValueBuilder::default();
        reader.read_pipe(&mut sink).unwrap();

        let mut expected = Object::new();
        expected.insert(7, Value::Primitive(PrimitiveValue::U8(1)));
        expected.insert(9, Value::String("hi".to_owned()));
        assert_eq!(sink.root, Some(Value::Object(expected)));
    }

    #[test]
    fn bulk_array_v3_round_trips_as_typed_array_event() {
        let mut w = Writer::new(Vec::<u8>::new(), Version::V3);
        w.on_pipe_open().unwrap();
        w.on_primitive_array_u16(&[1, 2, 3]).unwrap();
        w.on_pipe_close().unwrap();
        let bytes = w.into_inner();

        let mut reader = Reader::new(VecPipe::new(bytes), Version::V3);
        let mut sink = ValueBuilder::default();
        reader.read_pipe(&mut sink).unwrap();
        assert_eq!(
            sink.root,
            Some(Value::Array(vec![
                Value::Primitive(PrimitiveValue::U16(1)),
                Value::Primitive(PrimitiveValue::U16(2)),
                Value::Primitive(PrimitiveValue::U16(3)),
            ]))
        );
    }

    #[test]
    fn pipe_header_above_max_version_fails() {
        let bytes = vec![0x03u8, 0x00]; // version 3 header, then terminator
        let mut reader = Reader::new(VecPipe::new(bytes), Version::V1);
        let mut sink = ValueBuilder::default();
        assert!(matches!(
            reader.read_pipe(&mut sink),
            Err(Error::BadVersion(3))
        ));
    }

    #[test]
    fn short_stream_is_short_read() {
        let bytes = vec![0x01u8, 0x13, 0xEF]; // header, primitive u32, truncated payload
        let mut reader = Reader::new(VecPipe::new(bytes), Version::V1);
        let mut sink = ValueBuilder::default();
        assert!(matches!(
            reader.read_pipe(&mut sink),
            Err(Error::ShortRead { .. })
        ));
    }
}
