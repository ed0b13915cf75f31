//! Bit-level I/O for entropy coding and stream framing.
//!
//! This module provides the [`InputBitStream`] and [`OutputBitStream`]
//! contracts together with default implementations over any `Read`/`Write`.
//!
//! # Bit Ordering
//!
//! Bits are MSB-first: the first bit written becomes the most significant
//! bit of the first byte, and multi-bit values are emitted most significant
//! bit first. Byte alignment is only guaranteed at the start of a stream and
//! after `close()`, which pads the final partial byte with zeros.
//!
//! # Failure discipline
//!
//! The per-bit primitives are hot-path calls and treat misuse as a contract
//! violation: reading past the end of the stream, bit counts outside
//! `1..=64`, or any call after `close()` panics. Callers track expected
//! lengths themselves. Untrusted framing data should go through the checked
//! `try_read_*` methods of [`DefaultInputBitStream`] instead.
//!
//! # Example
//!
//! ```
//! use oxiblock_core::bitstream::{
//!     DefaultInputBitStream, DefaultOutputBitStream, InputBitStream, OutputBitStream,
//! };
//! use std::io::Cursor;
//!
//! let mut output = Vec::new();
//! {
//!     let mut obs = DefaultOutputBitStream::new(&mut output);
//!     obs.write_bits(0b101, 3);
//!     obs.write_bits(0xBEEF, 16);
//!     obs.close().unwrap();
//!     assert_eq!(obs.written(), 19);
//! }
//!
//! let mut ibs = DefaultInputBitStream::new(Cursor::new(output));
//! assert_eq!(ibs.read_bits(3), 0b101);
//! assert_eq!(ibs.read_bits(16), 0xBEEF);
//! assert_eq!(ibs.read(), 19);
//! ```

use crate::error::{OxiBlockError, Result};
use std::io::{Read, Write};

/// Default size of the internal byte buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Smallest accepted internal buffer size.
pub const MIN_BUFFER_SIZE: usize = 1024;

#[inline]
fn mask(count: u32) -> u64 {
    if count >= 64 {
        u64::MAX
    } else {
        (1u64 << count) - 1
    }
}

/// Sequential bit reader.
pub trait InputBitStream {
    /// Read one bit, returned as 0 or 1.
    ///
    /// Panics at end of stream, after close, or if the source fails.
    fn read_bit(&mut self) -> u32;

    /// Read `count` bits (1..=64), MSB first.
    ///
    /// Panics if `count` is out of range or the stream cannot supply the bits.
    fn read_bits(&mut self, count: u32) -> u64;

    /// Read `count` bits into `bits`, packed MSB first. Returns the number of
    /// bits read.
    ///
    /// Panics if `bits` holds fewer than `count` bits or the stream cannot
    /// supply them.
    fn read_array(&mut self, bits: &mut [u8], count: u64) -> u64;

    /// Check whether at least one more bit can be read.
    ///
    /// Returns `false` once closed or at end of stream.
    fn has_more_to_read(&mut self) -> Result<bool>;

    /// Close the stream. Returns `true` if this call closed it.
    fn close(&mut self) -> Result<bool>;

    /// Number of bits read so far.
    fn read(&self) -> u64;
}

/// Sequential bit writer.
pub trait OutputBitStream {
    /// Write the least significant bit of `bit`.
    ///
    /// Panics after close.
    fn write_bit(&mut self, bit: u32);

    /// Write the low `count` bits (1..=64) of `bits`, MSB first. Returns the
    /// number of bits written.
    ///
    /// Panics if `count` is out of range or after close.
    fn write_bits(&mut self, bits: u64, count: u32) -> u32;

    /// Write the first `count` bits of `bits` (MSB first within each byte).
    /// Returns the number of bits written.
    ///
    /// Panics if `bits` holds fewer than `count` bits or after close.
    fn write_array(&mut self, bits: &[u8], count: u64) -> u64;

    /// Report a deferred failure of the underlying sink.
    fn check(&self) -> Result<()>;

    /// Flush pending bits (zero padded to a byte boundary) and close the
    /// stream. Returns `true` if this call closed it.
    fn close(&mut self) -> Result<bool>;

    /// Number of bits written so far. Close-time padding is not counted.
    fn written(&self) -> u64;
}

impl<T: InputBitStream + ?Sized> InputBitStream for &mut T {
    fn read_bit(&mut self) -> u32 {
        (**self).read_bit()
    }

    fn read_bits(&mut self, count: u32) -> u64 {
        (**self).read_bits(count)
    }

    fn read_array(&mut self, bits: &mut [u8], count: u64) -> u64 {
        (**self).read_array(bits, count)
    }

    fn has_more_to_read(&mut self) -> Result<bool> {
        (**self).has_more_to_read()
    }

    fn close(&mut self) -> Result<bool> {
        (**self).close()
    }

    fn read(&self) -> u64 {
        (**self).read()
    }
}

impl<T: OutputBitStream + ?Sized> OutputBitStream for &mut T {
    fn write_bit(&mut self, bit: u32) {
        (**self).write_bit(bit)
    }

    fn write_bits(&mut self, bits: u64, count: u32) -> u32 {
        (**self).write_bits(bits, count)
    }

    fn write_array(&mut self, bits: &[u8], count: u64) -> u64 {
        (**self).write_array(bits, count)
    }

    fn check(&self) -> Result<()> {
        (**self).check()
    }

    fn close(&mut self) -> Result<bool> {
        (**self).close()
    }

    fn written(&self) -> u64 {
        (**self).written()
    }
}

/// Bit reader over any `Read` implementation.
///
/// Bytes are pulled from the source into an internal buffer and consumed
/// through a 64-bit accumulator.
#[derive(Debug)]
pub struct DefaultInputBitStream<R: Read> {
    /// Underlying source.
    source: R,
    /// Byte buffer filled from the source.
    buffer: Vec<u8>,
    /// Next unread byte in `buffer`.
    position: usize,
    /// Number of valid bytes in `buffer`.
    limit: usize,
    /// Accumulator; the low `avail_bits` bits are unread.
    current: u64,
    /// Unread bits in `current` (0..=64).
    avail_bits: u32,
    /// Total bits consumed.
    total_bits_read: u64,
    /// Source returned end of file.
    eos: bool,
    closed: bool,
}

impl<R: Read> DefaultInputBitStream<R> {
    /// Create a new bit reader with the default buffer size.
    pub fn new(source: R) -> Self {
        Self::with_capacity(source, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new bit reader with a specific buffer size.
    ///
    /// Sizes below [`MIN_BUFFER_SIZE`] are raised to it.
    pub fn with_capacity(source: R, capacity: usize) -> Self {
        Self {
            source,
            buffer: vec![0u8; capacity.max(MIN_BUFFER_SIZE)],
            position: 0,
            limit: 0,
            current: 0,
            avail_bits: 0,
            total_bits_read: 0,
            eos: false,
            closed: false,
        }
    }

    /// Get a reference to the underlying source.
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Consume this reader and return the underlying source.
    ///
    /// Bytes already buffered but not consumed are lost.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Refill the byte buffer. Returns `false` at end of file.
    fn fill_buffer(&mut self) -> Result<bool> {
        if self.eos {
            return Ok(false);
        }

        loop {
            match self.source.read(&mut self.buffer) {
                Ok(0) => {
                    self.eos = true;
                    return Ok(false);
                }
                Ok(n) => {
                    self.position = 0;
                    self.limit = n;
                    return Ok(true);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(OxiBlockError::read("input bit stream", e)),
            }
        }
    }

    /// Load up to 8 bytes into the accumulator.
    fn pull_current(&mut self) -> Result<()> {
        let mut value = 0u64;
        let mut loaded = 0u32;

        while loaded < 8 {
            if self.position >= self.limit && !self.fill_buffer()? {
                break;
            }
            value = (value << 8) | self.buffer[self.position] as u64;
            self.position += 1;
            loaded += 1;
        }

        if loaded == 0 {
            return Err(OxiBlockError::end_of_stream(self.total_bits_read));
        }

        self.current = value;
        self.avail_bits = loaded * 8;
        Ok(())
    }

    /// Read `count` bits (1..=64), reporting end of stream and source
    /// failures as errors.
    ///
    /// On error the stream position is unspecified and the stream should be
    /// abandoned.
    pub fn try_read_bits(&mut self, count: u32) -> Result<u64> {
        if count == 0 || count > 64 {
            return Err(OxiBlockError::invalid_param(
                "count",
                format!("cannot read {count} bits (must be 1-64)"),
            ));
        }
        if self.closed {
            return Err(OxiBlockError::invalid_file("bit stream closed"));
        }

        if count <= self.avail_bits {
            self.avail_bits -= count;
            self.total_bits_read += count as u64;
            return Ok((self.current >> self.avail_bits) & mask(count));
        }

        // Split across the accumulator boundary
        let remaining = count - self.avail_bits;
        let high = self.current & mask(self.avail_bits);
        self.pull_current()?;

        if self.avail_bits < remaining {
            self.avail_bits = 0;
            return Err(OxiBlockError::end_of_stream(self.total_bits_read));
        }

        self.avail_bits -= remaining;
        self.total_bits_read += count as u64;
        let low = (self.current >> self.avail_bits) & mask(remaining);
        Ok(high.checked_shl(remaining).unwrap_or(0) | low)
    }

    /// Read `count` bits into `bits`, reporting failures as errors.
    pub fn try_read_array(&mut self, bits: &mut [u8], count: u64) -> Result<u64> {
        let capacity = bits.len() as u64 * 8;
        if count > capacity {
            return Err(OxiBlockError::buffer_too_small(
                count.div_ceil(8) as usize,
                bits.len(),
            ));
        }

        let full_bytes = (count / 8) as usize;
        let mut index = 0;

        // 8 bytes at a time
        while index + 8 <= full_bytes {
            let value = self.try_read_bits(64)?;
            bits[index..index + 8].copy_from_slice(&value.to_be_bytes());
            index += 8;
        }

        while index < full_bytes {
            bits[index] = self.try_read_bits(8)? as u8;
            index += 1;
        }

        let tail = (count % 8) as u32;
        if tail > 0 {
            let value = self.try_read_bits(tail)? as u8;
            bits[index] = value << (8 - tail);
        }

        Ok(count)
    }
}

impl<R: Read> InputBitStream for DefaultInputBitStream<R> {
    #[inline]
    fn read_bit(&mut self) -> u32 {
        if self.avail_bits > 0 {
            self.avail_bits -= 1;
            self.total_bits_read += 1;
            return ((self.current >> self.avail_bits) & 1) as u32;
        }
        self.read_bits(1) as u32
    }

    #[inline]
    fn read_bits(&mut self, count: u32) -> u64 {
        assert!(
            (1..=64).contains(&count),
            "Invalid bit count: {count} (must be 1-64)"
        );
        match self.try_read_bits(count) {
            Ok(value) => value,
            Err(e) => panic!("Cannot read {count} bits: {e}"),
        }
    }

    fn read_array(&mut self, bits: &mut [u8], count: u64) -> u64 {
        match self.try_read_array(bits, count) {
            Ok(read) => read,
            Err(e) => panic!("Cannot read {count} bits into array: {e}"),
        }
    }

    fn has_more_to_read(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        if self.avail_bits > 0 || self.position < self.limit {
            return Ok(true);
        }
        self.fill_buffer()
    }

    fn close(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        self.closed = true;
        self.avail_bits = 0;
        self.position = 0;
        self.limit = 0;
        Ok(true)
    }

    fn read(&self) -> u64 {
        self.total_bits_read
    }
}

/// Bit writer over any `Write` implementation.
///
/// Bits accumulate in a 64-bit register; full registers are appended to an
/// internal byte buffer that is handed to the sink when full. A sink failure
/// is kept and reported by [`OutputBitStream::check`] and
/// [`OutputBitStream::close`]; output after the failure is discarded.
#[derive(Debug)]
pub struct DefaultOutputBitStream<W: Write> {
    /// Underlying sink. Only `None` inside `into_inner`.
    sink: Option<W>,
    /// Pending bytes.
    buffer: Vec<u8>,
    /// Flush threshold for `buffer`.
    capacity: usize,
    /// Accumulator; bits are added below the `64 - avail_bits` used bits.
    current: u64,
    /// Free bits in `current` (1..=64).
    avail_bits: u32,
    /// Total bits written.
    total_bits_written: u64,
    /// First sink failure.
    error: Option<std::io::Error>,
    closed: bool,
}

impl<W: Write> DefaultOutputBitStream<W> {
    /// Create a new bit writer with the default buffer size.
    pub fn new(sink: W) -> Self {
        Self::with_capacity(sink, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new bit writer with a specific buffer size.
    ///
    /// Sizes below [`MIN_BUFFER_SIZE`] are raised to it.
    pub fn with_capacity(sink: W, capacity: usize) -> Self {
        let capacity = capacity.max(MIN_BUFFER_SIZE);
        Self {
            sink: Some(sink),
            buffer: Vec::with_capacity(capacity + 8),
            capacity,
            current: 0,
            avail_bits: 64,
            total_bits_written: 0,
            error: None,
            closed: false,
        }
    }

    /// Get a reference to the underlying sink.
    ///
    /// Returns `None` only while `into_inner` is handing the sink out.
    pub fn get_ref(&self) -> Option<&W> {
        self.sink.as_ref()
    }

    /// Whether the stream was closed; writing after that panics.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the stream and return the underlying sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.close()?;
        self.sink
            .take()
            .ok_or_else(|| OxiBlockError::invalid_param("sink", "output bit stream has no sink"))
    }

    fn flush_buffer(&mut self) {
        if self.error.is_none() && !self.buffer.is_empty() {
            if let Some(sink) = self.sink.as_mut() {
                if let Err(e) = sink.write_all(&self.buffer) {
                    self.error = Some(e);
                }
            }
        }
        self.buffer.clear();
    }

    #[inline]
    fn push_current(&mut self) {
        self.buffer.extend_from_slice(&self.current.to_be_bytes());
        if self.buffer.len() >= self.capacity {
            self.flush_buffer();
        }
    }

    #[inline]
    fn ensure_open(&self) {
        assert!(!self.closed, "Output bit stream is closed");
    }
}

impl<W: Write> OutputBitStream for DefaultOutputBitStream<W> {
    #[inline]
    fn write_bit(&mut self, bit: u32) {
        self.ensure_open();

        if self.avail_bits > 1 {
            self.avail_bits -= 1;
            self.current |= ((bit & 1) as u64) << self.avail_bits;
            self.total_bits_written += 1;
        } else {
            self.write_bits((bit & 1) as u64, 1);
        }
    }

    #[inline]
    fn write_bits(&mut self, bits: u64, count: u32) -> u32 {
        self.ensure_open();
        assert!(
            (1..=64).contains(&count),
            "Invalid bit count: {count} (must be 1-64)"
        );

        let value = bits & mask(count);

        if count < self.avail_bits {
            self.avail_bits -= count;
            self.current |= value << self.avail_bits;
        } else {
            // Fill the accumulator, push it, keep the leftover low bits
            let remaining = count - self.avail_bits;
            self.current |= value >> remaining;
            self.push_current();
            self.avail_bits = 64 - remaining;
            self.current = if remaining == 0 {
                0
            } else {
                value << self.avail_bits
            };
        }

        self.total_bits_written += count as u64;
        count
    }

    fn write_array(&mut self, bits: &[u8], count: u64) -> u64 {
        self.ensure_open();
        assert!(
            count <= bits.len() as u64 * 8,
            "Cannot write {count} bits from a {}-byte array",
            bits.len()
        );

        let full_bytes = (count / 8) as usize;
        let mut chunks = bits[..full_bytes].chunks_exact(8);

        for chunk in chunks.by_ref() {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            self.write_bits(u64::from_be_bytes(word), 64);
        }

        for &byte in chunks.remainder() {
            self.write_bits(byte as u64, 8);
        }

        let tail = (count % 8) as u32;
        if tail > 0 {
            self.write_bits((bits[full_bytes] >> (8 - tail)) as u64, tail);
        }

        count
    }

    fn check(&self) -> Result<()> {
        match &self.error {
            Some(e) => Err(OxiBlockError::write(
                "output bit stream",
                std::io::Error::new(e.kind(), e.to_string()),
            )),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }

        // Emit the used part of the accumulator, zero padded
        let used_bytes = (64 - self.avail_bits).div_ceil(8) as usize;
        let pending = self.current.to_be_bytes();
        self.buffer.extend_from_slice(&pending[..used_bytes]);
        self.current = 0;
        self.avail_bits = 64;
        self.flush_buffer();

        if self.error.is_none() {
            if let Some(sink) = self.sink.as_mut() {
                if let Err(e) = sink.flush() {
                    self.error = Some(e);
                }
            }
        }

        self.closed = true;
        self.check()?;
        Ok(true)
    }

    fn written(&self) -> u64 {
        self.total_bits_written
    }
}

impl<W: Write> Drop for DefaultOutputBitStream<W> {
    fn drop(&mut self) {
        // Best-effort close on drop
        if self.sink.is_some() {
            let _ = self.close();
        }
    }
}
