//! Stream events.
//!
//! Writers and readers report their progress to registered [`Listener`]s.
//! Events are delivered on the calling thread in block order, also when
//! blocks are processed in parallel.

use oxiblock_entropy::EntropyCodecType;

/// Progress notification from a compressed writer or reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Stream header written or read.
    StreamHeader {
        /// Raw bytes per block.
        block_size: usize,
        /// Entropy codec of every block.
        entropy: EntropyCodecType,
        /// Transform chain, e.g. `BWT+MTFT+RLT`.
        transforms: String,
        /// Whether blocks carry a CRC-32.
        checksum: bool,
    },
    /// One block compressed and appended to the stream.
    BlockEncoded {
        /// Block index, from 0.
        block: u64,
        /// Raw bytes.
        original_len: usize,
        /// Bytes after the transforms.
        transformed_len: usize,
        /// Transforms skipped for this block.
        skip_flags: u8,
        /// Payload size in bits.
        bits: u64,
    },
    /// One block read and decompressed.
    BlockDecoded {
        /// Block index, from 0.
        block: u64,
        /// Raw bytes.
        original_len: usize,
        /// Bytes after the transforms.
        transformed_len: usize,
        /// Payload size in bits.
        bits: u64,
    },
    /// End-of-stream marker written or read.
    StreamEnd {
        /// Number of blocks.
        blocks: u64,
        /// Total raw bytes.
        bytes: u64,
    },
}

/// Receiver of stream events.
pub trait Listener: Send + Sync {
    /// Handle one event.
    fn process_event(&self, event: &Event);
}

impl<F: Fn(&Event) + Send + Sync> Listener for F {
    fn process_event(&self, event: &Event) {
        self(event)
    }
}
