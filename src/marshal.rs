//! Typed return values and the status codes GameMaker branches on.
//!
//! The buffer adapter returns one of these codes as a double; the GML side
//! switches on it and reads the matching payload from the buffer. Everything
//! without a fixed-width encoding (lists, dicts, arbitrary objects) travels
//! as its `str()` rendering under the string-fallback code.

use crate::buffer::BufferWriter;
use crate::errors::Result;

/// Reply status code. The numeric values are the wire protocol and must not
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Status {
    None = 1,
    Bool = 2,
    Int = 3,
    Float = 4,
    Str = 100,
    Error = -1,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A return value after classification on the interpreter side.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn status(&self) -> Status {
        match self {
            Self::None => Status::None,
            Self::Bool(_) => Status::Bool,
            Self::Int(_) => Status::Int,
            Self::Float(_) => Status::Float,
            Self::Str(_) => Status::Str,
        }
    }

    /// Write the payload. `None` has no payload; the status code alone
    /// carries it.
    pub fn encode(&self, writer: &mut BufferWriter<'_>) -> Result<()> {
        match self {
            Self::None => Ok(()),
            Self::Bool(b) => writer.write_u8(*b as u8),
            Self::Int(i) => writer.write_i64(*i),
            Self::Float(f) => writer.write_f64(*f),
            Self::Str(s) => writer.write_str(s),
        }
    }
}

/// Encode a successful reply at the start of the buffer, overwriting the
/// request. A payload that does not fit degrades to an error reply.
pub fn encode_reply(buf: &mut [u8], value: &Value) -> Status {
    let outcome = {
        let mut writer = BufferWriter::new(buf);
        value.encode(&mut writer)
    };

    match outcome {
        Ok(()) => value.status(),
        Err(e) => encode_error(buf, &e.to_string()),
    }
}

/// Encode an error report at the start of the buffer. The report is never
/// dropped: when it does not fit it is truncated at a UTF-8 boundary so the
/// caller still sees the head of the message.
pub fn encode_error(buf: &mut [u8], report: &str) -> Status {
    let fit = {
        let mut writer = BufferWriter::new(buf);
        writer.write_str(report).is_ok()
    };

    if !fit && !buf.is_empty() {
        let mut end = (buf.len() - 1).min(report.len());
        while end > 0 && !report.is_char_boundary(end) {
            end -= 1;
        }
        buf[..end].copy_from_slice(&report.as_bytes()[..end]);
        buf[end] = 0;
    }

    Status::Error
}
