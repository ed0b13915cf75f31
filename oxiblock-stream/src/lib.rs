//! # OxiBlock Stream
//!
//! Block container for OxiBlock.
//!
//! A stream starts with a [`StreamHeader`] recording the block size, the
//! entropy codec, the transform chain and whether blocks carry a CRC-32.
//! Raw input is cut into blocks; every block is transformed, entropy coded
//! into its own payload and framed in the main bit stream. A zero-width frame
//! ends the stream.
//!
//! - [`CompressedWriter`] / [`CompressedReader`]: `io::Write` / `io::Read`
//!   adapters
//! - [`compress`] / [`decompress`]: whole-buffer helpers
//! - [`StreamConfig`]: block size, codec, transforms, checksum, jobs
//! - [`Listener`] / [`Event`]: block-level progress
//! - [`CancellationToken`]: stop between blocks
//!
//! ## Features
//!
//! - `parallel`: compress and decompress `jobs` blocks at once with rayon;
//!   the output is identical to sequential processing
//! - `serde`: `Serialize` / `Deserialize` for [`StreamConfig`]
//!
//! ## Example
//!
//! ```rust
//! use oxiblock_stream::{StreamConfig, compress, decompress};
//!
//! let data = b"to be or not to be, that is the question".repeat(50);
//! let config = StreamConfig::default()
//!     .with_block_size(64 * 1024)
//!     .with_transform_chain("BWT+MTFT+RLT")
//!     .unwrap();
//!
//! let compressed = compress(&data, &config).unwrap();
//! assert!(compressed.len() < data.len() / 4);
//! assert_eq!(decompress(&compressed).unwrap(), data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod batch;
pub mod block;
pub mod cancel;
pub mod config;
pub mod header;
pub mod listener;
pub mod reader;
pub mod writer;

pub use block::{BlockCodec, BlockFrame, TRANSFORM_HEADROOM};
pub use cancel::CancellationToken;
pub use config::{DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE, StreamConfig};
pub use header::{MAGIC, STREAM_VERSION, StreamHeader};
pub use listener::{Event, Listener};
pub use oxiblock_core::error::{ErrorKind, OxiBlockError, Result};
pub use oxiblock_entropy::EntropyCodecType;
pub use oxiblock_transform::TransformType;
pub use reader::CompressedReader;
pub use writer::CompressedWriter;

use std::io::{Read, Write};

/// Compress `data` into a complete stream.
pub fn compress(data: &[u8], config: &StreamConfig) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len() / 2 + 64);
    {
        let mut writer = CompressedWriter::new(&mut output, config.clone())?;
        writer
            .write_all(data)
            .map_err(|e| OxiBlockError::from_io(e, ErrorKind::WriteFile))?;
        writer.finish()?;
    }
    Ok(output)
}

/// Decompress a complete stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    decompress_with_jobs(data, 1)
}

/// Decompress a complete stream, decoding up to `jobs` blocks at once.
pub fn decompress_with_jobs(data: &[u8], jobs: usize) -> Result<Vec<u8>> {
    let mut reader = CompressedReader::new(data).with_jobs(jobs)?;
    let mut output = Vec::with_capacity(data.len() * 2);
    reader
        .read_to_end(&mut output)
        .map_err(|e| OxiBlockError::from_io(e, ErrorKind::ReadFile))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_decompress() {
        let data = b"Hello, OxiBlock! ".repeat(100);
        let compressed = compress(&data, &StreamConfig::default()).unwrap();
        assert!(compressed.len() < data.len());
        assert_eq!(decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_empty_input() {
        let compressed = compress(&[], &StreamConfig::default()).unwrap();
        assert!(decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_not_a_stream() {
        let err = decompress(b"this is not compressed").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFile);
    }
}
