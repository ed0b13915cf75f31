//! Identity transform.

use oxiblock_core::error::Result;
use oxiblock_core::transform::{Function, Transform, TransformResult, check_capacity};
use std::marker::PhantomData;

/// Copies the source to the destination in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFunction<T> {
    _marker: PhantomData<T>,
}

impl<T> NullFunction<T> {
    /// Create the identity transform.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: Copy> NullFunction<T> {
    fn copy(src: &[T], dst: &mut [T]) -> Result<TransformResult> {
        check_capacity(src.len(), dst.len())?;
        dst[..src.len()].copy_from_slice(src);
        Ok(TransformResult::new(src.len(), src.len()))
    }
}

impl<T: Copy> Transform<T> for NullFunction<T> {
    fn forward(&mut self, src: &[T], dst: &mut [T]) -> Result<TransformResult> {
        Self::copy(src, dst)
    }

    fn inverse(&mut self, src: &[T], dst: &mut [T]) -> Result<TransformResult> {
        Self::copy(src, dst)
    }
}

impl<T: Copy> Function<T> for NullFunction<T> {
    fn max_encoded_len(&self, src_len: usize) -> Option<usize> {
        Some(src_len)
    }
}
