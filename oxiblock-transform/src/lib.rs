//! # OxiBlock Transform
//!
//! Reversible block transforms for OxiBlock.
//!
//! Every transform implements [`Function`]: a forward/inverse pair over a
//! slice plus a bound on the forward output size. Byte transforms are chained
//! with a [`TransformSequence`], usually built from names via
//! [`parse_chain`] and [`new_sequence`].
//!
//! ## Transforms
//!
//! - [`Bwt`]: Burrows-Wheeler transform (adds a 4-byte primary index)
//! - [`Mtft`]: move-to-front
//! - [`Rlt`]: run-length coding of runs of four or more
//! - [`NullFunction`]: copy
//! - [`DeltaCodec`]: delta coding of `i32` arrays
//!
//! ## Example
//!
//! ```rust
//! use oxiblock_core::transform::{Function, Transform};
//! use oxiblock_transform::{new_sequence, parse_chain};
//!
//! let types = parse_chain("BWT+MTFT+RLT").unwrap();
//! let data = b"banana bandana banana bandana";
//!
//! let mut forward = new_sequence(&types).unwrap();
//! let mut encoded = vec![0u8; forward.max_encoded_len(data.len()).unwrap()];
//! let result = forward.forward(data, &mut encoded).unwrap();
//! encoded.truncate(result.produced);
//!
//! let mut inverse = new_sequence(&types).unwrap();
//! inverse.set_skip_flags(forward.skip_flags());
//! let mut decoded = vec![0u8; forward.max_encoded_len(data.len()).unwrap()];
//! let result = inverse.inverse(&encoded, &mut decoded).unwrap();
//! assert_eq!(&decoded[..result.produced], data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bwt;
pub mod delta;
pub mod factory;
pub mod mtf;
pub mod null;
pub mod rlt;
pub mod sequence;

pub use bwt::Bwt;
pub use delta::DeltaCodec;
pub use factory::{TransformType, chain_name, new_sequence, parse_chain};
pub use mtf::Mtft;
pub use null::NullFunction;
pub use oxiblock_core::transform::{Function, Transform, TransformResult};
pub use rlt::Rlt;
pub use sequence::{MAX_STEPS, TransformSequence};
