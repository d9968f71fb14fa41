//! The event-sink contract: [`Parser`] receives a depth-first walk of a
//! decoded value stream from a [`crate::reader::Reader`], an application, or
//! a version-conversion adapter.

use crate::error::Result;

/// Wire-format version a writer emits or a reader/sink is willing to accept.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Version {
    V1 = 1,
    V2 = 2,
    V3 = 3,
}

impl Version {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Version::V1),
            2 => Some(Version::V2),
            3 => Some(Version::V3),
            _ => None,
        }
    }
}

/// Event-sink interface representing a decoded value stream.
///
/// A call sequence is a matched `on_pipe_open`/`on_pipe_close` pair
/// enclosing any number of value sub-trees; a value sub-tree is one of: a
/// one-shot primitive/null/user-pod call, an `on_array_begin(n)` .. `n`
/// value sub-trees .. `on_array_end`, or an `on_object_begin(n)` .. `n` ×
/// (`on_component_id` + value sub-tree) .. `on_object_end`.
///
/// The bulk `on_primitive_array_*` methods are an optional fast path for
/// homogeneous primitive arrays. Their default implementations decompose
/// into the per-element calls, so a sink only needs to implement them when
/// it can actually do something faster with a contiguous slice (as
/// [`crate::writer::Writer`] does, to preserve the wire format's bulk-array
/// encoding).
#[allow(unused_variables)]
pub trait Parser {
    /// The highest wire-format version this sink understands. Writers and
    /// readers decompose events down to this version if necessary. Defaults
    /// to the original, narrowest version.
    fn supported_version(&self) -> Version {
        Version::V1
    }

    fn on_pipe_open(&mut self) -> Result<()>;
    fn on_pipe_close(&mut self) -> Result<()>;

    fn on_array_begin(&mut self, size: u32) -> Result<()>;
    fn on_array_end(&mut self) -> Result<()>;

    fn on_object_begin(&mut self, component_count: u32) -> Result<()>;
    fn on_object_end(&mut self) -> Result<()>;
    fn on_component_id(&mut self, id: u16) -> Result<()>;

    fn on_null(&mut self) -> Result<()>;
    fn on_user_pod(&mut self, type_id: u32, bytes: &[u8]) -> Result<()>;

    fn on_primitive_bool(&mut self, value: bool) -> Result<()>;
    fn on_primitive_c8(&mut self, value: u8) -> Result<()>;
    fn on_primitive_u8(&mut self, value: u8) -> Result<()>;
    fn on_primitive_u16(&mut self, value: u16) -> Result<()>;
    fn on_primitive_u32(&mut self, value: u32) -> Result<()>;
    fn on_primitive_u64(&mut self, value: u64) -> Result<()>;
    fn on_primitive_s8(&mut self, value: i8) -> Result<()>;
    fn on_primitive_s16(&mut self, value: i16) -> Result<()>;
    fn on_primitive_s32(&mut self, value: i32) -> Result<()>;
    fn on_primitive_s64(&mut self, value: i64) -> Result<()>;
    fn on_primitive_f16(&mut self, value: u16) -> Result<()>;
    fn on_primitive_f32(&mut self, value: f32) -> Result<()>;
    fn on_primitive_f64(&mut self, value: f64) -> Result<()>;
    fn on_primitive_string(&mut self, value: &str) -> Result<()>;

    /// Bulk event for a homogeneous array of `bool`. Default: decompose into
    /// `on_array_begin`/per-element/`on_array_end`.
    fn on_primitive_array_bool(&mut self, values: &[bool]) -> Result<()> {
        self.on_array_begin(values.len() as u32)?;
        for &v in values {
            self.on_primitive_bool(v)?;
        }
        self.on_array_end()
    }

    fn on_primitive_array_c8(&mut self, values: &[u8]) -> Result<()> {
        self.on_array_begin(values.len() as u32)?;
        for &v in values {
            self.on_primitive_c8(v)?;
        }
        self.on_array_end()
    }

    fn on_primitive_array_u8(&mut self, values: &[u8]) -> Result<()> {
        self.on_array_begin(values.len() as u32)?;
        for &v in values {
            self.on_primitive_u8(v)?;
        }
        self.on_array_end()
    }

    fn on_primitive_array_u16(&mut self, values: &[u16]) -> Result<()> {
        self.on_array_begin(values.len() as u32)?;
        for &v in values {
            self.on_primitive_u16(v)?;
        }
        self.on_array_end()
    }

    fn on_primitive_array_u32(&mut self, values: &[u32]) -> Result<()> {
        self.on_array_begin(values.len() as u32)?;
        for &v in values {
            self.on_primitive_u32(v)?;
        }
        self.on_array_end()
    }

    fn on_primitive_array_u64(&mut self, values: &[u64]) -> Result<()> {
        self.on_array_begin(values.len() as u32)?;
        for &v in values {
            self.on_primitive_u64(v)?;
        }
        self.on_array_end()
    }

    fn on_primitive_array_s8(&mut self, values: &[i8]) -> Result<()> {
        self.on_array_begin(values.len() as u32)?;
        for &v in values {
            self.on_primitive_s8(v)?;
        }
        self.on_array_end()
    }

    fn on_primitive_array_s16(&mut self, values: &[i16]) -> Result<()> {
        self.on_array_begin(values.len() as u32)?;
        for &v in values {
            self.on_primitive_s16(v)?;
        }
        self.on_array_end()
    }

    fn on_primitive_array_s32(&mut self, values: &[i32]) -> Result<()> {
        self.on_array_begin(values.len() as u32)?;
        for &v in values {
            self.on_primitive_s32(v)?;
        }
        self.on_array_end()
    }

    fn on_primitive_array_s64(&mut self, values: &[i64]) -> Result<()> {
        self.on_array_begin(values.len() as u32)?;
        for &v in values {
            self.on_primitive_s64(v)?;
        }
        self.on_array_end()
    }

    fn on_primitive_array_f32(&mut self, values: &[f32]) -> Result<()> {
        self.on_array_begin(values.len() as u32)?;
        for &v in values {
            self.on_primitive_f32(v)?;
        }
        self.on_array_end()
    }

    fn on_primitive_array_f64(&mut self, values: &[f64]) -> Result<()> {
        self.on_array_begin(values.len() as u32)?;
        for &v in values {
            self.on_primitive_f64(v)?;
        }
        self.on_array_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl Parser for Recorder {
        fn on_pipe_open(&mut self) -> Result<()> {
            self.events.borrow_mut().push("open".into());
            Ok(())
        }
        fn on_pipe_close(&mut self) -> Result<()> {
            self.events.borrow_mut().push("close".into());
            Ok(())
        }
        fn on_array_begin(&mut self, size: u32) -> Result<()> {
            self.events.borrow_mut().push(format!("array_begin({size})"));
            Ok(())
        }
        fn on_array_end(&mut self) -> Result<()> {
            self.events.borrow_mut().push("array_end".into());
            Ok(())
        }
        fn on_object_begin(&mut self, n: u32) -> Result<()> {
            self.events.borrow_mut().push(format!("object_begin({n})"));
            Ok(())
        }
        fn on_object_end(&mut self) -> Result<()> {
            self.events.borrow_mut().push("object_end".into());
            Ok(())
        }
        fn on_component_id(&mut self, id: u16) -> Result<()> {
            self.events.borrow_mut().push(format!("component({id})"));
            Ok(())
        }
        fn on_null(&mut self) -> Result<()> {
            self.events.borrow_mut().push("null".into());
            Ok(())
        }
        fn on_user_pod(&mut self, type_id: u32, bytes: &[u8]) -> Result<()> {
            self.events
                .borrow_mut()
                .push(format!("pod({type_id},{})", bytes.len()));
            Ok(())
        }
        fn on_primitive_bool(&mut self, value: bool) -> Result<()> {
            self.events.borrow_mut().push(format!("bool({value})"));
            Ok(())
        }
        fn on_primitive_c8(&mut self, value: u8) -> Result<()> {
            self.events.borrow_mut().push(format!("c8({value})"));
            Ok(())
        }
        fn on_primitive_u8(&mut self, value: u8) -> Result<()> {
            self.events.borrow_mut().push(format!("u8({value})"));
            Ok(())
        }
        fn on_primitive_u16(&mut self, value: u16) -> Result<()> {
            self.events.borrow_mut().push(format!("u16({value})"));
            Ok(())
        }
        fn on_primitive_u32(&mut self, value: u32) -> Result<()> {
            self.events.borrow_mut().push(format!("u32({value})"));
            Ok(())
        }
        fn on_primitive_u64(&mut self, value: u64) -> Result<()> {
            self.events.borrow_mut().push(format!("u64({value})"));
            Ok(())
        }
        fn on_primitive_s8(&mut self, value: i8) -> Result<()> {
            self.events.borrow_mut().push(format!("s8({value})"));
            Ok(())
        }
        fn on_primitive_s16(&mut self, value: i16) -> Result<()> {
            self.events.borrow_mut().push(format!("s16({value})"));
            Ok(())
        }
        fn on_primitive_s32(&mut self, value: i32) -> Result<()> {
            self.events.borrow_mut().push(format!("s32({value})"));
            Ok(())
        }
        fn on_primitive_s64(&mut self, value: i64) -> Result<()> {
            self.events.borrow_mut().push(format!("s64({value})"));
            Ok(())
        }
        fn on_primitive_f16(&mut self, value: u16) -> Result<()> {
            self.events.borrow_mut().push(format!("f16({value})"));
            Ok(())
        }
        fn on_primitive_f32(&mut self, value: f32) -> Result<()> {
            self.events.borrow_mut().push(format!("f32({value})"));
            Ok(())
        }
        fn on_primitive_f64(&mut self, value: f64) -> Result<()> {
            self.events.borrow_mut().push(format!("f64({value})"));
            Ok(())
        }
        fn on_primitive_string(&mut self, value: &str) -> Result<()> {
            self.events
                .borrow_mut()
                .push(format!("string({value})"));
            Ok(())
        }
    }

    #[test]
    fn bulk_array_default_decomposes_to_per_element_events() {
        let mut sink = Recorder::default();
        sink.on_primitive_array_u16(&[1, 2, 3]).unwrap();
        assert_eq!(
            sink.events.into_inner(),
            vec!["array_begin(3)", "u16(1)", "u16(2)", "u16(3)", "array_end"]
        );
    }

    #[test]
    fn supported_version_defaults_to_v1() {
        let sink = Recorder::default();
        assert_eq!(sink.supported_version(), Version::V1);
    }
}
