//! # OxiBlock Core
//!
//! Core components for the OxiBlock block compressor.
//!
//! This crate provides the building blocks shared by every codec layer:
//!
//! - [`bitstream`]: MSB-first bit readers and writers
//! - [`crc`]: CRC-32 block checksums
//! - [`transform`]: the reversible transform / function contract
//! - [`error`]: error taxonomy
//!
//! ## Architecture
//!
//! OxiBlock is designed as a layered stack:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Stream                                              │
//! │     Container header, block framing, parallel blocks   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Transforms (BWT, MTF, RLT), binary entropy coding  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Core (this crate)                                   │
//! │     Bit streams, CRC-32, transform contract, errors    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiblock_core::bitstream::{DefaultInputBitStream, InputBitStream};
//! use oxiblock_core::crc::Crc32;
//! use std::io::Cursor;
//!
//! // Read bits from data
//! let data = vec![0xAB, 0xCD];
//! let mut reader = DefaultInputBitStream::new(Cursor::new(data));
//! assert_eq!(reader.read_bits(12), 0xABC);
//!
//! // Compute CRC-32
//! let crc = Crc32::compute(b"Hello, World!");
//! assert_eq!(crc, 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod crc;
pub mod error;
pub mod transform;

// Re-exports for convenience
pub use bitstream::{DefaultInputBitStream, DefaultOutputBitStream, InputBitStream, OutputBitStream};
pub use crc::Crc32;
pub use error::{ErrorCategory, ErrorKind, OxiBlockError, Result};
pub use transform::{
    ByteFunction, ByteTransform, Function, IntFunction, IntTransform, Transform, TransformResult,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::{
        DefaultInputBitStream, DefaultOutputBitStream, InputBitStream, OutputBitStream,
    };
    pub use crate::crc::Crc32;
    pub use crate::error::{ErrorKind, OxiBlockError, Result};
    pub use crate::transform::{Function, Transform, TransformResult};
}
