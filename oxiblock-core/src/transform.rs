//! Reversible transform contract.
//!
//! A transform turns a source array into a destination array of a size the
//! caller does not know in advance, and can undo the operation. Transforms
//! are generic over the element type: `u8` for byte transforms and `i32`
//! for integer transforms. A [`Function`] additionally bounds its output
//! size so callers can pre-size destination buffers.
//!
//! Every call reports how far it progressed through both arrays in a
//! [`TransformResult`]. Source and destination must not alias: plain slices
//! cannot, and the range-based entry points ([`Transform::forward_in`],
//! [`Transform::inverse_in`]) reject overlapping ranges of one buffer.
//!
//! # Example
//!
//! ```
//! use oxiblock_core::transform::{Transform, TransformResult};
//! use oxiblock_core::Result;
//!
//! /// Adds one to every byte.
//! struct Increment;
//!
//! impl Transform<u8> for Increment {
//!     fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformResult> {
//!         oxiblock_core::transform::check_capacity(src.len(), dst.len())?;
//!         for (d, s) in dst.iter_mut().zip(src) {
//!             *d = s.wrapping_add(1);
//!         }
//!         Ok(TransformResult::new(src.len(), src.len()))
//!     }
//!
//!     fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformResult> {
//!         oxiblock_core::transform::check_capacity(src.len(), dst.len())?;
//!         for (d, s) in dst.iter_mut().zip(src) {
//!             *d = s.wrapping_sub(1);
//!         }
//!         Ok(TransformResult::new(src.len(), src.len()))
//!     }
//! }
//!
//! let mut buf = [1u8, 2, 3, 0, 0, 0];
//! let result = Increment.forward_in(&mut buf, 0..3, 3..6).unwrap();
//! assert_eq!(result.produced, 3);
//! assert_eq!(buf, [1, 2, 3, 2, 3, 4]);
//!
//! // Overlapping source and destination are rejected
//! assert!(Increment.forward_in(&mut buf, 0..4, 2..6).is_err());
//! ```

use crate::error::{OxiBlockError, Result};
use std::ops::Range;

/// Progress of a single forward or inverse call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformResult {
    /// Elements consumed from the source.
    pub consumed: usize,
    /// Elements produced into the destination.
    pub produced: usize,
}

impl TransformResult {
    /// Create a new result.
    pub fn new(consumed: usize, produced: usize) -> Self {
        Self { consumed, produced }
    }
}

/// A reversible, possibly size-changing operation over `[T]`.
pub trait Transform<T> {
    /// Apply the transform from `src` into `dst`.
    fn forward(&mut self, src: &[T], dst: &mut [T]) -> Result<TransformResult>;

    /// Undo the transform from `src` into `dst`.
    fn inverse(&mut self, src: &[T], dst: &mut [T]) -> Result<TransformResult>;

    /// Apply the transform between two disjoint ranges of one buffer.
    fn forward_in(
        &mut self,
        buf: &mut [T],
        src: Range<usize>,
        dst: Range<usize>,
    ) -> Result<TransformResult> {
        let (src, dst) = split_disjoint(buf, src, dst)?;
        self.forward(src, dst)
    }

    /// Undo the transform between two disjoint ranges of one buffer.
    fn inverse_in(
        &mut self,
        buf: &mut [T],
        src: Range<usize>,
        dst: Range<usize>,
    ) -> Result<TransformResult> {
        let (src, dst) = split_disjoint(buf, src, dst)?;
        self.inverse(src, dst)
    }
}

/// A transform with a known bound on its forward output size.
pub trait Function<T>: Transform<T> {
    /// Upper bound on the forward output for `src_len` input elements, or
    /// `None` when no bound is known.
    fn max_encoded_len(&self, src_len: usize) -> Option<usize>;
}

/// Byte-array transform.
pub trait ByteTransform: Transform<u8> {}
impl<X: Transform<u8> + ?Sized> ByteTransform for X {}

/// Integer-array transform.
pub trait IntTransform: Transform<i32> {}
impl<X: Transform<i32> + ?Sized> IntTransform for X {}

/// Byte-array function.
pub trait ByteFunction: Function<u8> {}
impl<X: Function<u8> + ?Sized> ByteFunction for X {}

/// Integer-array function.
pub trait IntFunction: Function<i32> {}
impl<X: Function<i32> + ?Sized> IntFunction for X {}

impl<T, X: Transform<T> + ?Sized> Transform<T> for Box<X> {
    fn forward(&mut self, src: &[T], dst: &mut [T]) -> Result<TransformResult> {
        (**self).forward(src, dst)
    }

    fn inverse(&mut self, src: &[T], dst: &mut [T]) -> Result<TransformResult> {
        (**self).inverse(src, dst)
    }
}

impl<T, X: Function<T> + ?Sized> Function<T> for Box<X> {
    fn max_encoded_len(&self, src_len: usize) -> Option<usize> {
        (**self).max_encoded_len(src_len)
    }
}

/// Fail with `BufferTooSmall` unless `available >= needed`.
#[inline]
pub fn check_capacity(needed: usize, available: usize) -> Result<()> {
    if available < needed {
        return Err(OxiBlockError::buffer_too_small(needed, available));
    }
    Ok(())
}

/// Borrow two disjoint ranges of `buf`, the first shared and the second
/// mutable. Overlapping or out-of-bounds ranges are an `InvalidParam` error.
pub fn split_disjoint<T>(
    buf: &mut [T],
    src: Range<usize>,
    dst: Range<usize>,
) -> Result<(&[T], &mut [T])> {
    let len = buf.len();
    for (name, range) in [("src", &src), ("dst", &dst)] {
        if range.start > range.end || range.end > len {
            return Err(OxiBlockError::invalid_param(
                name,
                format!("range {range:?} outside buffer of length {len}"),
            ));
        }
    }

    let overlap = !src.is_empty() && !dst.is_empty() && src.start < dst.end && dst.start < src.end;
    if overlap {
        return Err(OxiBlockError::invalid_param(
            "dst",
            format!("source {src:?} and destination {dst:?} overlap"),
        ));
    }

    if src.end <= dst.start {
        let (head, tail) = buf.split_at_mut(dst.start);
        Ok((&head[src], &mut tail[..dst.end - dst.start]))
    } else {
        let (head, tail) = buf.split_at_mut(src.start);
        Ok((&tail[..src.end - src.start], &mut head[dst]))
    }
}
