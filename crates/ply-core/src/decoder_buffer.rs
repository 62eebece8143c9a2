use byteorder::ByteOrder;

use crate::ply_types::{Scalar, ScalarType};
use crate::status::{PlyError, PlyResult};

/// Sequential reader over the body bytes of a PLY file.
///
/// Supports fixed-width binary reads in either byte order and line-based
/// reads for ascii bodies.
///
/// # Example
///
/// ```
/// use byteorder::BigEndian;
/// use ply_core::decoder_buffer::DecoderBuffer;
/// use ply_core::ply_types::{Scalar, ScalarType};
///
/// let data = [0x00, 0x02, 0x07];
/// let mut buffer = DecoderBuffer::new(&data);
///
/// assert_eq!(buffer.decode_scalar::<BigEndian>(ScalarType::Uint16).unwrap(), Scalar::Uint16(2));
/// assert_eq!(buffer.remaining_size(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DecoderBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DecoderBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current read position in bytes.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Sets the read position.
    ///
    /// # Errors
    ///
    /// Returns `PlyError::ElementRowCorrupted` if the position is beyond the
    /// buffer length.
    pub fn set_position(&mut self, pos: usize) -> PlyResult<()> {
        if pos > self.data.len() {
            return Err(PlyError::ElementRowCorrupted(format!(
                "Position {} exceeds buffer length {}",
                pos,
                self.data.len()
            )));
        }
        self.pos = pos;
        Ok(())
    }

    /// Returns the number of bytes remaining in the buffer.
    pub fn remaining_size(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining_size() == 0
    }

    /// Decodes and returns a slice of the specified size.
    ///
    /// # Errors
    ///
    /// Returns `PlyError::ElementRowCorrupted` if not enough bytes remain.
    pub fn decode_slice(&mut self, size: usize) -> PlyResult<&'a [u8]> {
        if size > self.remaining_size() {
            return Err(PlyError::ElementRowCorrupted(format!(
                "Unexpected end of buffer: need {} bytes, have {}",
                size,
                self.remaining_size()
            )));
        }
        let slice = &self.data[self.pos..self.pos + size];
        self.pos += size;
        Ok(slice)
    }

    /// Decodes one binary value of type `ty` in byte order `E`.
    pub fn decode_scalar<E: ByteOrder>(&mut self, ty: ScalarType) -> PlyResult<Scalar> {
        let bytes = self.decode_slice(ty.byte_length())?;
        let value = match ty {
            ScalarType::Int8 => Scalar::Int8(bytes[0] as i8),
            ScalarType::Uint8 => Scalar::Uint8(bytes[0]),
            ScalarType::Int16 => Scalar::Int16(E::read_i16(bytes)),
            ScalarType::Uint16 => Scalar::Uint16(E::read_u16(bytes)),
            ScalarType::Int32 => Scalar::Int32(E::read_i32(bytes)),
            ScalarType::Uint32 => Scalar::Uint32(E::read_u32(bytes)),
            ScalarType::Float32 => Scalar::Float32(E::read_f32(bytes)),
            ScalarType::Float64 => Scalar::Float64(E::read_f64(bytes)),
        };
        Ok(value)
    }

    /// Decodes the next non-blank line, without its terminator.
    ///
    /// Returns `None` once the buffer is exhausted.
    pub fn decode_line(&mut self) -> Option<&'a str> {
        while self.pos < self.data.len() {
            let rest = &self.data[self.pos..];
            let len = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
            self.pos += (len + 1).min(rest.len());
            let line = trim_ascii(&rest[..len]);
            if line.is_empty() {
                continue;
            }
            // Non-UTF-8 lines surface as a token that fails to parse.
            return Some(std::str::from_utf8(line).unwrap_or("\u{fffd}"));
        }
        None
    }
}

fn trim_ascii(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if first.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    while let [rest @ .., last] = bytes {
        if last.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    bytes
}
