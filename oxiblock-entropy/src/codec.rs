//! Entropy encoder and decoder contracts.

use oxiblock_core::bitstream::{InputBitStream, OutputBitStream};
use oxiblock_core::error::Result;

/// Compresses byte blocks into a bound output bit stream.
pub trait EntropyEncoder {
    /// Encode all of `block`, returning the number of bytes consumed.
    ///
    /// Fails when the underlying sink has failed.
    ///
    /// # Panics
    ///
    /// Panics when called after [`EntropyEncoder::dispose`].
    fn write(&mut self, block: &[u8]) -> Result<usize>;

    /// The bound bit stream.
    fn bit_stream(&mut self) -> &mut dyn OutputBitStream;

    /// Flush pending coder state into the bit stream.
    ///
    /// Must run before the bit stream is closed. Only the first call has an
    /// effect.
    fn dispose(&mut self);
}

/// Restores byte blocks from a bound input bit stream.
pub trait EntropyDecoder {
    /// Decode exactly `block.len()` bytes into `block`, returning that count.
    ///
    /// Fails when the bit stream runs out before the block is complete or
    /// the underlying source fails.
    ///
    /// # Panics
    ///
    /// Panics when called after [`EntropyDecoder::dispose`].
    fn read(&mut self, block: &mut [u8]) -> Result<usize>;

    /// The bound bit stream.
    fn bit_stream(&mut self) -> &mut dyn InputBitStream;

    /// Release the decoder. Only the first call has an effect.
    fn dispose(&mut self);
}

impl<E: EntropyEncoder + ?Sized> EntropyEncoder for Box<E> {
    fn write(&mut self, block: &[u8]) -> Result<usize> {
        (**self).write(block)
    }

    fn bit_stream(&mut self) -> &mut dyn OutputBitStream {
        (**self).bit_stream()
    }

    fn dispose(&mut self) {
        (**self).dispose();
    }
}

impl<D: EntropyDecoder + ?Sized> EntropyDecoder for Box<D> {
    fn read(&mut self, block: &mut [u8]) -> Result<usize> {
        (**self).read(block)
    }

    fn bit_stream(&mut self) -> &mut dyn InputBitStream {
        (**self).bit_stream()
    }

    fn dispose(&mut self) {
        (**self).dispose();
    }
}
