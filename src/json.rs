//! A [`Parser`] sink that renders the event stream as JSON text.

use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::parser::{Parser, Version};
use crate::value::half_to_f32;

enum Container {
    Array { first: bool },
    Object { first: bool },
}

/// Builds a JSON document from parser events. Objects render their
/// `ComponentID` keys as decimal strings; booleans render as the literal
/// `True`/`False` tokens (a deliberately preserved casing quirk, not
/// lowercase `true`/`false`); user-pods render as a sentinel object.
pub struct JsonWriter {
    out: String,
    stack: Vec<Container>,
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            stack: Vec::new(),
        }
    }

    pub fn into_inner(self) -> String {
        self.out
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Inserts a separating comma before a value if it is not the first
    /// child of an enclosing Array. Object children insert their own comma
    /// when the key is written, in `on_component_id`.
    fn before_value(&mut self) {
        if let Some(Container::Array { first }) = self.stack.last_mut() {
            if !*first {
                self.out.push(',');
            }
            *first = false;
        }
    }

    fn write_number(&mut self, value: impl std::fmt::Display) {
        self.before_value();
        write!(self.out, "{value}").unwrap();
    }

    fn write_string_literal(&mut self, s: &str) {
        self.out.push('"');
        for c in s.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                c if (c as u32) < 0x20 => {
                    write!(self.out, "\\u{:04x}", c as u32).unwrap();
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }
}

impl Parser for JsonWriter {
    fn supported_version(&self) -> Version {
        Version::V3
    }

    fn on_pipe_open(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_pipe_close(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_array_begin(&mut self, _size: u32) -> Result<()> {
        self.before_value();
        self.out.push('[');
        self.stack.push(Container::Array { first: true });
        Ok(())
    }

    fn on_array_end(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Container::Array { .. }) => {
                self.out.push(']');
                Ok(())
            }
            _ => Err(Error::BadState {
                expected: "inside an array",
                actual: "not inside an array",
            }),
        }
    }

    fn on_object_begin(&mut self, _component_count: u32) -> Result<()> {
        self.before_value();
        self.out.push('{');
        self.stack.push(Container::Object { first: true });
        Ok(())
    }

    fn on_object_end(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Container::Object { .. }) => {
                self.out.push('}');
                Ok(())
            }
            _ => Err(Error::BadState {
                expected: "inside an object",
                actual: "not inside an object",
            }),
        }
    }

    fn on_component_id(&mut self, id: u16) -> Result<()> {
        match self.stack.last_mut() {
            Some(Container::Object { first }) => {
                if !*first {
                    self.out.push(',');
                }
                *first = false;
                write!(self.out, "\"{id}\":").unwrap();
                Ok(())
            }
            _ => Err(Error::BadState {
                expected: "inside an object",
                actual: "not inside an object",
            }),
        }
    }

    fn on_null(&mut self) -> Result<()> {
        self.before_value();
        self.out.push_str("null");
        Ok(())
    }

    fn on_user_pod(&mut self, type_id: u32, bytes: &[u8]) -> Result<()> {
        self.before_value();
        write!(self.out, "{{\"__ANVIL_POD\":123456789,\"type\":{type_id},\"data\":\"").unwrap();
        for b in bytes {
            write!(self.out, "{b:02x}").unwrap();
        }
        self.out.push_str("\"}");
        Ok(())
    }

    fn on_primitive_bool(&mut self, value: bool) -> Result<()> {
        self.before_value();
        self.out.push_str(if value { "True" } else { "False" });
        Ok(())
    }

    fn on_primitive_c8(&mut self, value: u8) -> Result<()> {
        self.before_value();
        self.write_string_literal(&(value as char).to_string());
        Ok(())
    }

    fn on_primitive_u8(&mut self, value: u8) -> Result<()> {
        self.write_number(value);
        Ok(())
    }

    fn on_primitive_u16(&mut self, value: u16) -> Result<()> {
        self.write_number(value);
        Ok(())
    }

    fn on_primitive_u32(&mut self, value: u32) -> Result<()> {
        self.write_number(value);
        Ok(())
    }

    fn on_primitive_u64(&mut self, value: u64) -> Result<()> {
        self.write_number(value);
        Ok(())
    }

    fn on_primitive_s8(&mut self, value: i8) -> Result<()> {
        self.write_number(value);
        Ok(())
    }

    fn on_primitive_s16(&mut self, value: i16) -> Result<()> {
        self.write_number(value);
        Ok(())
    }

    fn on_primitive_s32(&mut self, value: i32) -> Result<()> {
        self.write_number(value);
        Ok(())
    }

    fn on_primitive_s64(&mut self, value: i64) -> Result<()> {
        self.write_number(value);
        Ok(())
    }

    fn on_primitive_f16(&mut self, value: u16) -> Result<()> {
        self.write_number(half_to_f32(value));
        Ok(())
    }

    fn on_primitive_f32(&mut self, value: f32) -> Result<()> {
        self.write_number(value);
        Ok(())
    }

    fn on_primitive_f64(&mut self, value: f64) -> Result<()> {
        self.write_number(value);
        Ok(())
    }

    fn on_primitive_string(&mut self, value: &str) -> Result<()> {
        self.before_value();
        self.write_string_literal(value);
        Ok(())
    }
}
