//! Pass-through codec: bytes are stored verbatim, 8 bits each.

use crate::codec::{EntropyDecoder, EntropyEncoder};
use oxiblock_core::bitstream::{InputBitStream, OutputBitStream};
use oxiblock_core::error::{OxiBlockError, Result};

/// Encoder storing bytes as-is.
#[derive(Debug)]
pub struct NullEntropyEncoder<S: OutputBitStream> {
    stream: S,
    disposed: bool,
}

impl<S: OutputBitStream> NullEntropyEncoder<S> {
    /// Create an encoder writing to `stream`.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            disposed: false,
        }
    }
}

impl<S: OutputBitStream> EntropyEncoder for NullEntropyEncoder<S> {
    fn write(&mut self, block: &[u8]) -> Result<usize> {
        assert!(!self.disposed, "Entropy encoder used after dispose");
        if !block.is_empty() {
            self.stream.write_array(block, block.len() as u64 * 8);
        }
        self.stream.check()?;
        Ok(block.len())
    }

    fn bit_stream(&mut self) -> &mut dyn OutputBitStream {
        &mut self.stream
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

/// Decoder reading bytes as-is.
#[derive(Debug)]
pub struct NullEntropyDecoder<S: InputBitStream> {
    stream: S,
    disposed: bool,
}

impl<S: InputBitStream> NullEntropyDecoder<S> {
    /// Create a decoder reading from `stream`.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            disposed: false,
        }
    }
}

impl<S: InputBitStream> EntropyDecoder for NullEntropyDecoder<S> {
    fn read(&mut self, block: &mut [u8]) -> Result<usize> {
        assert!(!self.disposed, "Entropy decoder used after dispose");
        for slot in block.iter_mut() {
            if !self.stream.has_more_to_read()? {
                return Err(OxiBlockError::corrupted(format!(
                    "stored data ends after {} bits",
                    self.stream.read()
                )));
            }
            *slot = self.stream.read_bits(8) as u8;
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
