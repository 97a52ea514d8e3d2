//! PER (Packed Encoding Rules) encoding/decoding
//!
//! Aligned PER (APER) as used by F1AP (ITU-T X.691). Only the subset needed
//! by the F1AP interface-management procedures is provided: constrained and
//! semi-constrained integers, enumerations, choices, sequence preambles,
//! octet/bit strings and open types.

use bitvec::prelude::*;
use bytes::Bytes;
use thiserror::Error;

/// PER codec errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerError {
    #[error("Buffer underflow: need {needed} bits, have {available}")]
    BufferUnderflow { needed: usize, available: usize },
    #[error("Invalid constraint: value {value} not in range {min}..={max}")]
    ConstraintViolation { value: i64, min: i64, max: i64 },
    #[error("Invalid choice index: {index} (max {max})")]
    InvalidChoiceIndex { index: usize, max: usize },
    #[error("Invalid length: {length}")]
    InvalidLength { length: usize },
    #[error("Unsupported extension")]
    UnsupportedExtension,
    #[error("Decode error: {0}")]
    DecodeError(String),
}

pub type PerResult<T> = Result<T, PerError>;

/// Largest length determinant written without fragmentation
pub const MAX_UNFRAGMENTED_LENGTH: usize = 16383;

/// Unit count of one fragment block (X.691 Section 11.9.3.8)
pub const FRAGMENT_BLOCK: usize = 16384;

/// One length determinant as read from the wire
enum LengthDeterminant {
    Complete(usize),
    /// 1..=4 blocks of [`FRAGMENT_BLOCK`] units, more fragments follow
    Fragment(usize),
}

/// Constraint definition for constrained integers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub min: i64,
    pub max: i64,
    pub extensible: bool,
}

impl Constraint {
    pub const fn new(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            extensible: false,
        }
    }

    pub const fn extensible(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            extensible: true,
        }
    }

    /// Number of values in the constraint
    pub fn range(&self) -> u64 {
        if self.max >= self.min {
            (self.max - self.min) as u64 + 1
        } else {
            0
        }
    }

    /// Bits needed to encode an offset within this range
    pub fn bits_needed(&self) -> usize {
        let range = self.range();
        if range <= 1 {
            0
        } else {
            64 - (range - 1).leading_zeros() as usize
        }
    }

    /// Octets needed to hold the largest offset (X.691 10.5.7.4)
    pub fn octets_needed(&self) -> usize {
        self.bits_needed().div_ceil(8).max(1)
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }
}

fn minimal_octets(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

/// APER (Aligned PER) Encoder
pub struct AperEncoder {
    buffer: BitVec<u8, Msb0>,
}

impl AperEncoder {
    pub fn new() -> Self {
        Self {
            buffer: BitVec::new(),
        }
    }

    /// Consume the encoder, returning the octet-aligned buffer
    pub fn into_bytes(mut self) -> Bytes {
        self.align();
        Bytes::from(self.buffer.into_vec())
    }

    pub fn bit_position(&self) -> usize {
        self.buffer.len()
    }

    /// Align to octet boundary
    pub fn align(&mut self) {
        let remainder = self.buffer.len() % 8;
        if remainder != 0 {
            let padded = self.buffer.len() + (8 - remainder);
            self.buffer.resize(padded, false);
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.buffer.push(bit);
    }

    /// Write the low `num_bits` of `value`, MSB first
    pub fn write_bits(&mut self, value: u64, num_bits: usize) {
        for i in (0..num_bits.min(64)).rev() {
            self.buffer.push((value >> i) & 1 == 1);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.write_bits(*byte as u64, 8);
        }
    }

    /// Encode constrained whole number (X.691 Section 10.5)
    pub fn encode_constrained_whole_number(
        &mut self,
        value: i64,
        constraint: &Constraint,
    ) -> PerResult<()> {
        if !constraint.contains(value) {
            return Err(PerError::ConstraintViolation {
                value,
                min: constraint.min,
                max: constraint.max,
            });
        }

        let range = constraint.range();
        let offset = (value - constraint.min) as u64;

        if range == 1 {
            return Ok(());
        }

        if range <= 255 {
            self.write_bits(offset, constraint.bits_needed());
        } else if range == 256 {
            self.align();
            self.write_bits(offset, 8);
        } else if range <= 65536 {
            self.align();
            self.write_bits(offset, 16);
        } else {
            // Indefinite-length case: octet count as a constrained number,
            // then the offset in the minimum number of octets.
            let octets = minimal_octets(offset);
            let count = Constraint::new(1, constraint.octets_needed() as i64);
            self.encode_constrained_whole_number(octets as i64, &count)?;
            self.align();
            self.write_bits(offset, octets * 8);
        }

        Ok(())
    }

    /// Encode unconstrained whole number (X.691 Section 10.8)
    pub fn encode_unconstrained_whole_number(&mut self, value: i64) -> PerResult<()> {
        let raw = value.to_be_bytes();
        // Drop redundant sign octets, keeping at least one.
        let mut start = 0;
        while start < raw.len() - 1 {
            let (cur, next) = (raw[start], raw[start + 1]);
            let redundant = (cur == 0x00 && next & 0x80 == 0) || (cur == 0xFF && next & 0x80 != 0);
            if !redundant {
                break;
            }
            start += 1;
        }
        let bytes = &raw[start..];

        self.encode_length_determinant(bytes.len())?;
        self.write_bytes(bytes);
        Ok(())
    }

    /// Encode an unconstrained length determinant (X.691 Section 10.9)
    pub fn encode_length_determinant(&mut self, length: usize) -> PerResult<()> {
        self.align();
        if length <= 127 {
            self.write_bits(length as u64, 8);
        } else if length <= MAX_UNFRAGMENTED_LENGTH {
            self.write_bits(0x8000 | length as u64, 16);
        } else {
            return Err(PerError::InvalidLength { length });
        }
        Ok(())
    }

    /// Encode constrained length determinant
    pub fn encode_constrained_length(
        &mut self,
        length: usize,
        min: usize,
        max: usize,
    ) -> PerResult<()> {
        let constraint = Constraint::new(min as i64, max as i64);
        self.encode_constrained_whole_number(length as i64, &constraint)
            .map_err(|_| PerError::InvalidLength { length })
    }

    /// Encode ENUMERATED (X.691 Section 13)
    ///
    /// Values past the root of an extensible enumeration are sent as a
    /// normally small number counted from the first extension value.
    pub fn encode_enumerated(&mut self, value: i64, constraint: &Constraint) -> PerResult<()> {
        if constraint.extensible {
            let in_root = constraint.contains(value);
            self.write_bit(!in_root);
            if in_root {
                self.encode_constrained_whole_number(value, constraint)?;
            } else if value > constraint.max {
                self.encode_normally_small_non_negative((value - constraint.max - 1) as u64)?;
            } else {
                return Err(PerError::ConstraintViolation {
                    value,
                    min: constraint.min,
                    max: constraint.max,
                });
            }
        } else {
            self.encode_constrained_whole_number(value, constraint)?;
        }
        Ok(())
    }

    /// Encode constrained INTEGER with an optional extension marker
    pub fn encode_integer(&mut self, value: i64, constraint: &Constraint) -> PerResult<()> {
        if constraint.extensible {
            let in_root = constraint.contains(value);
            self.write_bit(!in_root);
            if !in_root {
                return self.encode_unconstrained_whole_number(value);
            }
        }
        self.encode_constrained_whole_number(value, constraint)
    }

    /// Encode normally small non-negative whole number (X.691 Section 10.6)
    pub fn encode_normally_small_non_negative(&mut self, value: u64) -> PerResult<()> {
        if value <= 63 {
            self.write_bit(false);
            self.write_bits(value, 6);
        } else {
            self.write_bit(true);
            self.encode_unconstrained_whole_number(value as i64)?;
        }
        Ok(())
    }

    /// Encode CHOICE index (X.691 Section 23)
    pub fn encode_choice_index(
        &mut self,
        index: usize,
        num_alternatives: usize,
        extensible: bool,
    ) -> PerResult<()> {
        let in_root = index < num_alternatives;
        if extensible {
            self.write_bit(!in_root);
            if !in_root {
                return self.encode_normally_small_non_negative((index - num_alternatives) as u64);
            }
        } else if !in_root {
            return Err(PerError::InvalidChoiceIndex {
                index,
                max: num_alternatives.saturating_sub(1),
            });
        }
        let constraint = Constraint::new(0, num_alternatives as i64 - 1);
        self.encode_constrained_whole_number(index as i64, &constraint)
    }

    /// Encode a SEQUENCE preamble: extension bit (if extensible) followed by
    /// one presence bit per OPTIONAL component.
    pub fn encode_sequence_preamble(&mut self, extensible: bool, optionals: &[bool]) {
        if extensible {
            self.write_bit(false);
        }
        for present in optionals {
            self.write_bit(*present);
        }
    }

    /// Encode OCTET STRING (X.691 Section 17)
    pub fn encode_octet_string(
        &mut self,
        data: &[u8],
        min_len: Option<usize>,
        max_len: Option<usize>,
    ) -> PerResult<()> {
        let len = data.len();

        match (min_len, max_len) {
            (Some(min), Some(max)) if min == max => {
                if len != min {
                    return Err(PerError::InvalidLength { length: len });
                }
                if min > 2 {
                    self.align();
                }
                self.write_bytes(data);
            }
            (Some(min), Some(max)) => {
                self.encode_constrained_length(len, min, max)?;
                if max > 2 {
                    self.align();
                }
                self.write_bytes(data);
            }
            _ => self.encode_fragmented_octets(data)?,
        }
        Ok(())
    }

    /// Write octets behind a length determinant, splitting contents of
    /// 16K octets or more into fragments (X.691 Section 11.9.3.8)
    pub fn encode_fragmented_octets(&mut self, data: &[u8]) -> PerResult<()> {
        let mut rest = data;
        while rest.len() >= FRAGMENT_BLOCK {
            let blocks = (rest.len() / FRAGMENT_BLOCK).min(4);
            self.align();
            self.write_bits(0xC0 | blocks as u64, 8);
            let (fragment, tail) = rest.split_at(blocks * FRAGMENT_BLOCK);
            self.write_bytes(fragment);
            rest = tail;
        }
        // A trailing zero length closes contents that ended on a fragment.
        self.encode_length_determinant(rest.len())?;
        self.write_bytes(rest);
        Ok(())
    }

    /// Encode BIT STRING (X.691 Section 16)
    pub fn encode_bit_string(
        &mut self,
        bits: &BitSlice<u8, Msb0>,
        min_len: Option<usize>,
        max_len: Option<usize>,
    ) -> PerResult<()> {
        let len = bits.len();

        match (min_len, max_len) {
            (Some(min), Some(max)) if min == max => {
                if len != min {
                    return Err(PerError::InvalidLength { length: len });
                }
                if min > 16 {
                    self.align();
                }
            }
            (Some(min), Some(max)) => {
                self.encode_constrained_length(len, min, max)?;
                if max > 16 {
                    self.align();
                }
            }
            _ => self.encode_length_determinant(len)?,
        }
        self.buffer.extend_from_bitslice(bits);
        Ok(())
    }

    /// Encode an open type: the value is encoded on its own, padded to an
    /// octet and written behind a length determinant (X.691 Section 11.2)
    pub fn encode_open_type<T: AperEncode + ?Sized>(&mut self, value: &T) -> PerResult<()> {
        let mut inner = AperEncoder::new();
        value.encode_aper(&mut inner)?;
        let bytes = inner.into_bytes();
        self.encode_open_type_bytes(&bytes)
    }

    /// Write already-encoded open type contents
    pub fn encode_open_type_bytes(&mut self, bytes: &[u8]) -> PerResult<()> {
        // An empty encoding is carried as a single zero octet.
        if bytes.is_empty() {
            self.encode_length_determinant(1)?;
            self.write_bits(0, 8);
            return Ok(());
        }
        self.encode_fragmented_octets(bytes)
    }
}

impl Default for AperEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// APER (Aligned PER) Decoder
pub struct AperDecoder<'a> {
    data: &'a BitSlice<u8, Msb0>,
    position: usize,
}

impl<'a> AperDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data: BitSlice::from_slice(data),
            position: 0,
        }
    }

    pub fn bit_position(&self) -> usize {
        self.position
    }

    pub fn remaining_bits(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Align to octet boundary
    pub fn align(&mut self) {
        let remainder = self.position % 8;
        if remainder != 0 {
            self.position += 8 - remainder;
        }
    }

    pub fn read_bit(&mut self) -> PerResult<bool> {
        if self.position >= self.data.len() {
            return Err(PerError::BufferUnderflow {
                needed: 1,
                available: 0,
            });
        }
        let bit = self.data[self.position];
        self.position += 1;
        Ok(bit)
    }

    /// Read `num_bits` (at most 64) as a value, MSB first
    pub fn read_bits(&mut self, num_bits: usize) -> PerResult<u64> {
        if num_bits > 64 {
            return Err(PerError::InvalidLength { length: num_bits });
        }
        if num_bits > self.remaining_bits() {
            return Err(PerError::BufferUnderflow {
                needed: num_bits,
                available: self.remaining_bits(),
            });
        }

        let value = self.data[self.position..self.position + num_bits]
            .iter()
            .fold(0u64, |acc, bit| (acc << 1) | (*bit as u64));
        self.position += num_bits;
        Ok(value)
    }

    pub fn read_bytes(&mut self, num_bytes: usize) -> PerResult<Vec<u8>> {
        if num_bytes * 8 > self.remaining_bits() {
            return Err(PerError::BufferUnderflow {
                needed: num_bytes * 8,
                available: self.remaining_bits(),
            });
        }
        let mut bytes = Vec::with_capacity(num_bytes);
        for _ in 0..num_bytes {
            bytes.push(self.read_bits(8)? as u8);
        }
        Ok(bytes)
    }

    /// Decode constrained whole number (X.691 Section 10.5)
    pub fn decode_constrained_whole_number(&mut self, constraint: &Constraint) -> PerResult<i64> {
        let range = constraint.range();

        if range == 1 {
            return Ok(constraint.min);
        }

        let offset = if range <= 255 {
            self.read_bits(constraint.bits_needed())?
        } else if range == 256 {
            self.align();
            self.read_bits(8)?
        } else if range <= 65536 {
            self.align();
            self.read_bits(16)?
        } else {
            let count = Constraint::new(1, constraint.octets_needed() as i64);
            let octets = self.decode_constrained_whole_number(&count)? as usize;
            self.align();
            self.read_bits(octets * 8)?
        };

        let value = constraint.min + offset as i64;
        if value > constraint.max {
            return Err(PerError::ConstraintViolation {
                value,
                min: constraint.min,
                max: constraint.max,
            });
        }
        Ok(value)
    }

    /// Decode unconstrained whole number (X.691 Section 10.8)
    pub fn decode_unconstrained_whole_number(&mut self) -> PerResult<i64> {
        let len = self.decode_length_determinant()?;
        if len > 8 {
            return Err(PerError::InvalidLength { length: len });
        }
        let bytes = self.read_bytes(len)?;

        let Some(first) = bytes.first() else {
            return Ok(0);
        };
        let seed: i64 = if first & 0x80 != 0 { -1 } else { 0 };
        Ok(bytes
            .iter()
            .fold(seed, |acc, byte| (acc << 8) | (*byte as i64)))
    }

    fn read_length_determinant(&mut self) -> PerResult<LengthDeterminant> {
        self.align();
        let first_byte = self.read_bits(8)? as u8;

        if first_byte & 0x80 == 0 {
            Ok(LengthDeterminant::Complete(first_byte as usize))
        } else if first_byte & 0x40 == 0 {
            let second_byte = self.read_bits(8)? as u8;
            Ok(LengthDeterminant::Complete(
                (((first_byte & 0x3F) as usize) << 8) | (second_byte as usize),
            ))
        } else {
            match (first_byte & 0x3F) as usize {
                blocks @ 1..=4 => Ok(LengthDeterminant::Fragment(blocks * FRAGMENT_BLOCK)),
                blocks => Err(PerError::DecodeError(format!(
                    "invalid fragment multiplier {blocks}"
                ))),
            }
        }
    }

    /// Decode an unconstrained length determinant (X.691 Section 10.9).
    ///
    /// Only a complete length is accepted here; fragmented contents are
    /// read with [`AperDecoder::decode_fragmented_octets`].
    pub fn decode_length_determinant(&mut self) -> PerResult<usize> {
        match self.read_length_determinant()? {
            LengthDeterminant::Complete(length) => Ok(length),
            LengthDeterminant::Fragment(_) => Err(PerError::DecodeError(
                "fragmented length where a count is expected".to_string(),
            )),
        }
    }

    /// Read octets behind a length determinant, joining fragments
    pub fn decode_fragmented_octets(&mut self) -> PerResult<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            match self.read_length_determinant()? {
                LengthDeterminant::Fragment(length) => out.extend(self.read_bytes(length)?),
                LengthDeterminant::Complete(length) => {
                    out.extend(self.read_bytes(length)?);
                    return Ok(out);
                }
            }
        }
    }

    pub fn decode_constrained_length(&mut self, min: usize, max: usize) -> PerResult<usize> {
        let constraint = Constraint::new(min as i64, max as i64);
        self.decode_constrained_whole_number(&constraint)
            .map(|v| v as usize)
    }

    /// Decode ENUMERATED (X.691 Section 13)
    pub fn decode_enumerated(&mut self, constraint: &Constraint) -> PerResult<i64> {
        if constraint.extensible && self.read_bit()? {
            let index = self.decode_normally_small_non_negative()?;
            return Ok((constraint.max + 1).saturating_add(index.min(i64::MAX as u64) as i64));
        }
        self.decode_constrained_whole_number(constraint)
    }

    /// Decode constrained INTEGER with an optional extension marker
    pub fn decode_integer(&mut self, constraint: &Constraint) -> PerResult<i64> {
        if constraint.extensible && self.read_bit()? {
            return self.decode_unconstrained_whole_number();
        }
        self.decode_constrained_whole_number(constraint)
    }

    /// Decode normally small non-negative whole number (X.691 Section 10.6)
    pub fn decode_normally_small_non_negative(&mut self) -> PerResult<u64> {
        if !self.read_bit()? {
            self.read_bits(6)
        } else {
            self.decode_unconstrained_whole_number().map(|v| v as u64)
        }
    }

    /// Decode CHOICE index (X.691 Section 23)
    pub fn decode_choice_index(
        &mut self,
        num_alternatives: usize,
        extensible: bool,
    ) -> PerResult<usize> {
        if extensible && self.read_bit()? {
            let ext_index = self.decode_normally_small_non_negative()?;
            return Ok(num_alternatives.saturating_add(ext_index as usize));
        }
        let constraint = Constraint::new(0, num_alternatives as i64 - 1);
        self.decode_constrained_whole_number(&constraint)
            .map(|v| v as usize)
    }

    /// Decode a SEQUENCE preamble and return the OPTIONAL presence bitmap.
    /// Extension additions are not understood and are rejected.
    pub fn decode_sequence_preamble(
        &mut self,
        extensible: bool,
        num_optionals: usize,
    ) -> PerResult<Vec<bool>> {
        if extensible && self.read_bit()? {
            return Err(PerError::UnsupportedExtension);
        }
        (0..num_optionals).map(|_| self.read_bit()).collect()
    }

    /// Decode OCTET STRING (X.691 Section 17)
    pub fn decode_octet_string(
        &mut self,
        min_len: Option<usize>,
        max_len: Option<usize>,
    ) -> PerResult<Vec<u8>> {
        let len = match (min_len, max_len) {
            (Some(min), Some(max)) if min == max => {
                if min > 2 {
                    self.align();
                }
                min
            }
            (Some(min), Some(max)) => {
                let len = self.decode_constrained_length(min, max)?;
                if max > 2 {
                    self.align();
                }
                len
            }
            _ => return self.decode_fragmented_octets(),
        };

        self.read_bytes(len)
    }

    /// Decode BIT STRING (X.691 Section 16)
    pub fn decode_bit_string(
        &mut self,
        min_len: Option<usize>,
        max_len: Option<usize>,
    ) -> PerResult<BitVec<u8, Msb0>> {
        let len = match (min_len, max_len) {
            (Some(min), Some(max)) if min == max => {
                if min > 16 {
                    self.align();
                }
                min
            }
            (Some(min), Some(max)) => {
                let len = self.decode_constrained_length(min, max)?;
                if max > 16 {
                    self.align();
                }
                len
            }
            _ => self.decode_length_determinant()?,
        };

        if len > self.remaining_bits() {
            return Err(PerError::BufferUnderflow {
                needed: len,
                available: self.remaining_bits(),
            });
        }
        let bits = self.data[self.position..self.position + len].to_bitvec();
        self.position += len;
        Ok(bits)
    }

    /// Decode an open type as `T`, consuming exactly its declared length
    pub fn decode_open_type<T: AperDecode>(&mut self) -> PerResult<T> {
        let bytes = self.decode_open_type_bytes()?;
        let mut inner = AperDecoder::new(&bytes);
        T::decode_aper(&mut inner)
    }

    /// Read the raw contents of an open type
    pub fn decode_open_type_bytes(&mut self) -> PerResult<Vec<u8>> {
        self.decode_fragmented_octets()
    }
}

/// Trait for types that can be encoded with APER
pub trait AperEncode {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()>;
}

/// Trait for types that can be decoded with APER
pub trait AperDecode: Sized {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self>;
}
