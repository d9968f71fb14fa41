//! Sink adapters translating events written at one wire-format version into
//! the equivalent call sequence for a sink that only advertises an older
//! one.
//!
//! This generalizes the same default-decomposition pattern [`Parser`]'s own
//! bulk-array methods use (bulk call -> `on_array_begin`/per-element/
//! `on_array_end`) one level further: across versions, not just from a bulk
//! call down to its per-element form.

use crate::error::Result;
use crate::parser::{Parser, Version};

/// Wraps a sink and forwards events to it, decomposing any bulk primitive
/// array call into `on_array_begin`/per-element/`on_array_end` whenever
/// `target` is below [`Version::V2`] (the version at which the wire format
/// gains a compact typed-array encoding).
///
/// Held by mutable reference rather than by value so a converter can be
/// built on demand around a borrowed sink (e.g. from inside
/// [`crate::reader::Reader`]) without taking ownership away from the
/// caller.
pub struct VersionConverter<'a, S: Parser + ?Sized> {
    inner: &'a mut S,
    target: Version,
}

impl<'a, S: Parser + ?Sized> VersionConverter<'a, S> {
    pub fn new(inner: &'a mut S, target: Version) -> Self {
        Self { inner, target }
    }

    fn decomposes_bulk(&self) -> bool {
        self.target < Version::V2
    }
}

macro_rules! forward_bulk {
    ($name:ident, $elem:ty, $per_elem:ident) => {
        fn $name(&mut self, values: &[$elem]) -> Result<()> {
            if self.decomposes_bulk() {
                self.inner.on_array_begin(values.len() as u32)?;
                for &v in values {
                    self.inner.$per_elem(v)?;
                }
                self.inner.on_array_end()
            } else {
                self.inner.$name(values)
            }
        }
    };
}

impl<'a, S: Parser + ?Sized> Parser for VersionConverter<'a, S> {
    fn supported_version(&self) -> Version {
        self.target
    }

    fn on_pipe_open(&mut self) -> Result<()> {
        self.inner.on_pipe_open()
    }
    fn on_pipe_close(&mut self) -> Result<()> {
        self.inner.on_pipe_close()
    }
    fn on_array_begin(&mut self, size: u32) -> Result<()> {
        self.inner.on_array_begin(size)
    }
    fn on_array_end(&mut self) -> Result<()> {
        self.inner.on_array_end()
    }
    fn on_object_begin(&mut self, component_count: u32) -> Result<()> {
        self.inner.on_object_begin(component_count)
    }
    fn on_object_end(&mut self) -> Result<()> {
        self.inner.on_object_end()
    }
    fn on_component_id(&mut self, id: u16) -> Result<()> {
        self.inner.on_component_id(id)
    }
    fn on_null(&mut self) -> Result<()> {
        self.inner.on_null()
    }
    fn on_user_pod(&mut self, type_id: u32, bytes: &[u8]) -> Result<()> {
        self.inner.on_user_pod(type_id, bytes)
    }
    fn on_primitive_bool(&mut self, value: bool) -> Result<()> {
        self.inner.on_primitive_bool(value)
    }
    fn on_primitive_c8(&mut self, value: u8) -> Result<()> {
        self.inner.on_primitive_c8(value)
    }
    fn on_primitive_u8(&mut self, value: u8) -> Result<()> {
        self.inner.on_primitive_u8(value)
    }
    fn on_primitive_u16(&mut self, value: u16) -> Result<()> {
        self.inner.on_primitive_u16(value)
    }
    fn on_primitive_u32(&mut self, value: u32) -> Result<()> {
        self.inner.on_primitive_u32(value)
    }
    fn on_primitive_u64(&mut self, value: u64) -> Result<()> {
        self.inner.on_primitive_u64(value)
    }
    fn on_primitive_s8(&mut self, value: i8) -> Result<()> {
        self.inner.on_primitive_s8(value)
    }
    fn on_primitive_s16(&mut self, value: i16) -> Result<()> {
        self.inner.on_primitive_s16(value)
    }
    fn on_primitive_s32(&mut self, value: i32) -> Result<()> {
        self.inner.on_primitive_s32(value)
    }
    fn on_primitive_s64(&mut self, value: i64) -> Result<()> {
        self.inner.on_primitive_s64(value)
    }
    fn on_primitive_f16(&mut self, value: u16) -> Result<()> {
        self.inner.on_primitive_f16(value)
    }
    fn on_primitive_f32(&mut self, value: f32) -> Result<()> {
        self.inner.on_primitive_f32(value)
    }
    fn on_primitive_f64(&mut self, value: f64) -> Result<()> {
        self.inner.on_primitive_f64(value)
    }
    fn on_primitive_string(&mut self, value: &str) -> Result<()> {
        self.inner.on_primitive_string(value)
    }

    forward_bulk!(on_primitive_array_bool, bool, on_primitive_bool);
    forward_bulk!(on_primitive_array_c8, u8, on_primitive_c8);
    forward_bulk!(on_primitive_array_u8, u8, on_primitive_u8);
    forward_bulk!(on_primitive_array_u16, u16, on_primitive_u16);
    forward_bulk!(on_primitive_array_u32, u32, on_primitive_u32);
    forward_bulk!(on_primitive_array_u64, u64, on_primitive_u64);
    forward_bulk!(on_primitive_array_s8, i8, on_primitive_s8);
    forward_bulk!(on_primitive_array_s16, i16, on_primitive_s16);
    forward_bulk!(on_primitive_array_s32, i32, on_primitive_s32);
    forward_bulk!(on_primitive_array_s64, i64, on_primitive_s64);
    forward_bulk!(on_primitive_array_f32, f32, on_primitive_f32);
    forward_bulk!(on_primitive_array_f64, f64, on_primitive_f64);
}
