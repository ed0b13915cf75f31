//! Binary range coder driven by a [`Predictor`].
//!
//! Bytes are coded most significant bit first, one binary decision per bit.
//! The coder tracks the current interval with two 56-bit bounds, `low` and
//! `high`, both inclusive:
//!
//! - `split = ((high - low) >> 4) * p >> 8` for a 12-bit prediction `p`
//! - a 1 keeps `[low, low + split]`, a 0 keeps `[low + split + 1, high]`
//! - while bits 24..56 of both bounds agree, those 32 bits are settled: the
//!   encoder emits them, the decoder pulls 32 fresh bits into its probe, and
//!   both bounds shift left by 32 (`high` filling with ones)
//!
//! Since both bounds are kept exactly, a settled prefix can never change
//! and no carry propagation is needed. On dispose the encoder writes 56 bits
//! identifying a value inside the final interval; the decoder loads its
//! 56-bit probe on the first read. An encoded block is therefore always
//! `56 + 32 * k` bits long, and the decoder consumes exactly that many.

use crate::codec::{EntropyDecoder, EntropyEncoder};
use crate::predictor::Predictor;
use oxiblock_core::bitstream::{InputBitStream, OutputBitStream};
use oxiblock_core::error::{OxiBlockError, Result};

/// Width of the range registers.
pub const REGISTER_BITS: u32 = 56;

/// Mask of the range registers.
pub const MASK_56: u64 = (1 << REGISTER_BITS) - 1;

/// Bits emitted or consumed per renormalization step.
pub const SHIFT_BITS: u32 = 32;

/// Bits written on dispose and read when the decoder is primed.
pub const FLUSH_BITS: u32 = REGISTER_BITS;

/// Bits 24..56: once equal in `low` and `high`, they are settled.
const SETTLED_MASK: u64 = 0x00FF_FFFF_FF00_0000;

/// Whether `bits` is a possible length for one coded block.
pub fn is_valid_coded_len(bits: u64) -> bool {
    bits >= FLUSH_BITS as u64 && (bits - FLUSH_BITS as u64) % SHIFT_BITS as u64 == 0
}

/// Longest possible coding of a block of `len` bytes.
///
/// Right after a shift the low 32 bits of `low` are zeros and those of `high`
/// are ones, so bits 24..32 differ and a second shift cannot follow. Each of
/// the `8 * len` decisions therefore settles at most one 32-bit word.
pub fn max_coded_len(len: usize) -> u64 {
    (len as u64)
        .saturating_mul(8 * SHIFT_BITS as u64)
        .saturating_add(FLUSH_BITS as u64)
}

/// Which side of the coder is stepping the registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Encoding the given bit.
    Encode(u32),
    /// Decoding against the given 56-bit probe.
    Decode(u64),
}

/// Interval bounds shared by the encoder and the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRegisters {
    low: u64,
    high: u64,
}

impl RangeRegisters {
    /// Full interval.
    pub fn new() -> Self {
        Self {
            low: 0,
            high: MASK_56,
        }
    }

    /// Lower bound.
    pub fn low(&self) -> u64 {
        self.low
    }

    /// Upper bound (inclusive).
    pub fn high(&self) -> u64 {
        self.high
    }

    /// Narrow the interval for one binary decision with prediction `p`.
    ///
    /// Returns the coded bit: the given one when encoding, the one the probe
    /// falls into when decoding.
    #[inline]
    pub fn code(&mut self, p: u32, direction: Direction) -> u32 {
        let split = (((self.high - self.low) >> 4) * p as u64) >> 8;
        let bit = match direction {
            Direction::Encode(bit) => bit & 1,
            Direction::Decode(probe) => u32::from(probe <= self.low + split),
        };
        if bit == 1 {
            self.high = self.low + split;
        } else {
            self.low += split + 1;
        }
        bit
    }

    /// Shift out the settled top 32 bits, if any.
    #[inline]
    pub fn shift(&mut self) -> Option<u64> {
        if (self.low ^ self.high) & SETTLED_MASK != 0 {
            return None;
        }
        let settled = self.high >> 24;
        self.low = (self.low << SHIFT_BITS) & MASK_56;
        self.high = ((self.high << SHIFT_BITS) | 0xFFFF_FFFF) & MASK_56;
        Some(settled)
    }

    /// Value written on flush; always inside `[low, high]`.
    pub fn final_value(&self) -> u64 {
        self.low | 0xFF_FFFF
    }
}

impl Default for RangeRegisters {
    fn default() -> Self {
        Self::new()
    }
}

/// Binary entropy encoder.
///
/// Dropping an encoder that was not disposed disposes it, so the bound bit
/// stream must still be open at that point.
#[derive(Debug)]
pub struct BinaryEntropyEncoder<P: Predictor, S: OutputBitStream> {
    predictor: P,
    stream: S,
    registers: RangeRegisters,
    disposed: bool,
}

impl<P: Predictor, S: OutputBitStream> BinaryEntropyEncoder<P, S> {
    /// Create an encoder writing to `stream`.
    pub fn new(stream: S, predictor: P) -> Self {
        Self {
            predictor,
            stream,
            registers: RangeRegisters::new(),
            disposed: false,
        }
    }

    /// The predictor driving this encoder.
    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    #[inline]
    fn encode_bit(&mut self, bit: u32) {
        let p = self.predictor.get();
        self.registers.code(p, Direction::Encode(bit));
        self.predictor.update(bit);

        while let Some(settled) = self.registers.shift() {
            self.stream.write_bits(settled, SHIFT_BITS);
        }
    }

    #[inline]
    fn encode_byte(&mut self, byte: u8) {
        for shift in (0..8).rev() {
            self.encode_bit(((byte >> shift) & 1) as u32);
        }
    }
}

impl<P: Predictor, S: OutputBitStream> EntropyEncoder for BinaryEntropyEncoder<P, S> {
    fn write(&mut self, block: &[u8]) -> Result<usize> {
        assert!(!self.disposed, "Entropy encoder used after dispose");
        for &byte in block {
            self.encode_byte(byte);
        }
        self.stream.check()?;
        Ok(block.len())
    }

    fn bit_stream(&mut self) -> &mut dyn OutputBitStream {
        &mut self.stream
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.stream.write_bits(self.registers.final_value(), FLUSH_BITS);
    }
}

impl<P: Predictor, S: OutputBitStream> Drop for BinaryEntropyEncoder<P, S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Binary entropy decoder.
///
/// Before every refill the decoder checks that the bit stream still has
/// data; running dry is reported as a corrupted block. The bound stream must
/// hold a whole number of coded blocks (see [`is_valid_coded_len`]) so that a
/// refill never starts inside the last partial word.
#[derive(Debug)]
pub struct BinaryEntropyDecoder<P: Predictor, S: InputBitStream> {
    predictor: P,
    stream: S,
    registers: RangeRegisters,
    probe: u64,
    primed: bool,
    disposed: bool,
}

impl<P: Predictor, S: InputBitStream> BinaryEntropyDecoder<P, S> {
    /// Create a decoder reading from `stream`.
    pub fn new(stream: S, predictor: P) -> Self {
        Self {
            predictor,
            stream,
            registers: RangeRegisters::new(),
            probe: 0,
            primed: false,
            disposed: false,
        }
    }

    /// The predictor driving this decoder.
    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    fn pull(&mut self, count: u32) -> Result<u64> {
        if !self.stream.has_more_to_read()? {
            return Err(OxiBlockError::corrupted(format!(
                "entropy coded data ends after {} bits",
                self.stream.read()
            )));
        }
        Ok(self.stream.read_bits(count))
    }

    #[inline]
    fn decode_bit(&mut self) -> Result<u32> {
        let p = self.predictor.get();
        let bit = self.registers.code(p, Direction::Decode(self.probe));
        self.predictor.update(bit);

        while self.registers.shift().is_some() {
            self.probe = ((self.probe << SHIFT_BITS) | self.pull(SHIFT_BITS)?) & MASK_56;
        }
        Ok(bit)
    }

    #[inline]
    fn decode_byte(&mut self) -> Result<u8> {
        let mut byte = 0u32;
        for _ in 0..8 {
            byte = (byte << 1) | self.decode_bit()?;
        }
        Ok(byte as u8)
    }
}

impl<P: Predictor, S: InputBitStream> EntropyDecoder for BinaryEntropyDecoder<P, S> {
    fn read(&mut self, block: &mut [u8]) -> Result<usize> {
        assert!(!self.disposed, "Entropy decoder used after dispose");
        if !self.primed {
            self.probe = self.pull(FLUSH_BITS)?;
            self.primed = true;
        }
        for slot in block.iter_mut() {
            *slot = self.decode_byte()?;
        }
        Ok(block.len())
    }

    fn bit_stream(&mut self) -> &mut dyn InputBitStream {
        &mut self.stream
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}
