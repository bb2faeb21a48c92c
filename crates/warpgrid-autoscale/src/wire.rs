//! Binary wire primitives for autoscaling results.
//!
//! The encoding is deliberately small: single bytes for flags, variable
//! length integers for counts and sizes, length-prefixed UTF-8 for strings.
//!
//! ```text
//! vlong    = 7 bits per byte, least significant group first,
//!            high bit set on every byte except the last,
//!            minimal length (no trailing zero group)
//! string   = [len: vlong] [utf-8 bytes]
//! optional = [present: u8 0|1] [value if present]
//! map      = [count: vlong] ([key: string] [value])*
//! ```
//!
//! There is no version tag; the surrounding transport owns compatibility.

use std::io::{self, Read};

use crate::error::{AutoscaleError, AutoscaleResult};

/// Maximum number of bytes a `u64` occupies as a vlong.
const MAX_VLONG_BYTES: usize = 10;

/// Append-only encoder over an owned byte buffer.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_vlong(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    /// Write a collection or byte length.
    pub fn write_len(&mut self, len: usize) {
        self.write_vlong(len as u64);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_len(value.len());
        self.buf.extend_from_slice(value.as_bytes());
    }

    /// Write a presence flag, then the value through `write` when present.
    pub fn write_optional<T: ?Sized>(
        &mut self,
        value: Option<&T>,
        write: impl FnOnce(&mut Self, &T),
    ) {
        match value {
            Some(v) => {
                self.write_bool(true);
                write(self, v);
            }
            None => self.write_bool(false),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor-style decoder over a borrowed byte slice.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn read_u8(&mut self) -> AutoscaleResult<u8> {
        let mut byte = [0u8; 1];
        self.buf.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    pub fn read_bool(&mut self) -> AutoscaleResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(AutoscaleError::Malformed(format!(
                "invalid boolean byte {other:#04x}"
            ))),
        }
    }

    pub fn read_vlong(&mut self) -> AutoscaleResult<u64> {
        let mut value = 0u64;
        for i in 0..MAX_VLONG_BYTES {
            let byte = self.read_u8()?;
            let group = u64::from(byte & 0x7f);
            let shift = 7 * i as u32;
            // The tenth byte may only carry the top bit of a u64.
            if i == MAX_VLONG_BYTES - 1 && (group > 1 || byte & 0x80 != 0) {
                break;
            }
            value |= group << shift;
            if byte & 0x80 == 0 {
                if i > 0 && group == 0 {
                    return Err(AutoscaleError::Malformed(
                        "vlong is not minimally encoded".to_string(),
                    ));
                }
                return Ok(value);
            }
        }
        Err(AutoscaleError::Malformed("vlong overflows u64".to_string()))
    }

    /// Read a collection or byte length. A length larger than the bytes
    /// left can never be satisfied and is reported as truncation up front.
    pub fn read_len(&mut self) -> AutoscaleResult<usize> {
        let raw = self.read_vlong()?;
        let len = usize::try_from(raw)
            .map_err(|_| AutoscaleError::Malformed(format!("length {raw} exceeds usize")))?;
        if len > self.remaining() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("length {len} exceeds {} remaining bytes", self.remaining()),
            )
            .into());
        }
        Ok(len)
    }

    pub fn read_string(&mut self) -> AutoscaleResult<String> {
        let len = self.read_len()?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        String::from_utf8(head.to_vec())
            .map_err(|e| AutoscaleError::Malformed(format!("invalid utf-8 string: {e}")))
    }

    /// Read a presence flag, then the value through `read` when present.
    pub fn read_optional<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> AutoscaleResult<T>,
    ) -> AutoscaleResult<Option<T>> {
        if self.read_bool()? {
            read(self).map(Some)
        } else {
            Ok(None)
        }
    }
}
