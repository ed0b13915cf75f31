//! # OxiBlock Entropy
//!
//! Adaptive binary entropy coding for OxiBlock.
//!
//! A [`Predictor`] estimates the probability of the next bit; the binary
//! range coder ([`BinaryEntropyEncoder`] / [`BinaryEntropyDecoder`]) narrows
//! a 56-bit interval with it, one decision per bit. Encoder and decoder step
//! the same [`RangeRegisters`], so they stay bit-for-bit symmetric: decoding
//! a block consumes exactly the bits its encoding produced.
//!
//! ## Predictors
//!
//! - [`FixedPredictor`]: constant probability
//! - [`Order0Predictor`]: one adaptive counter per partial-byte context
//! - [`PaqPredictor`]: bit-history states refined by adaptive probability maps
//!
//! ## Example
//!
//! ```rust
//! use oxiblock_core::bitstream::{DefaultInputBitStream, DefaultOutputBitStream, OutputBitStream};
//! use oxiblock_entropy::{EntropyCodecType, EntropyDecoder, EntropyEncoder};
//! use std::io::Cursor;
//!
//! let data = b"to be or not to be";
//! let codec = EntropyCodecType::from_name("PAQ").unwrap();
//!
//! let mut encoded = Vec::new();
//! {
//!     let mut obs = DefaultOutputBitStream::new(&mut encoded);
//!     let mut encoder = codec.new_encoder(&mut obs).unwrap();
//!     encoder.write(data).unwrap();
//!     encoder.dispose();
//!     drop(encoder);
//!     obs.close().unwrap();
//! }
//!
//! let mut ibs = DefaultInputBitStream::new(Cursor::new(encoded));
//! let mut decoder = codec.new_decoder(&mut ibs).unwrap();
//! let mut decoded = vec![0u8; data.len()];
//! decoder.read(&mut decoded).unwrap();
//! assert_eq!(&decoded, data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod apm;
pub mod binary;
pub mod codec;
pub mod factory;
pub mod null;
pub mod paq;
pub mod predictor;

pub use binary::{BinaryEntropyDecoder, BinaryEntropyEncoder, Direction, RangeRegisters};
pub use codec::{EntropyDecoder, EntropyEncoder};
pub use factory::EntropyCodecType;
pub use null::{NullEntropyDecoder, NullEntropyEncoder};
pub use paq::PaqPredictor;
pub use predictor::{FixedPredictor, Order0Predictor, PROB_HALF, PROB_MAX, Predictor};
