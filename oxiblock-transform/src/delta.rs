//! Delta coding for integer arrays.
//!
//! Each value is replaced by its difference from the previous one (the first
//! value is kept as-is). Arithmetic wraps, so every `i32` sequence round
//! trips exactly.

use oxiblock_core::error::Result;
use oxiblock_core::transform::{Function, Transform, TransformResult, check_capacity};

/// Delta codec over `i32`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaCodec;

impl DeltaCodec {
    /// Create the codec.
    pub fn new() -> Self {
        Self
    }
}

impl Transform<i32> for DeltaCodec {
    fn forward(&mut self, src: &[i32], dst: &mut [i32]) -> Result<TransformResult> {
        check_capacity(src.len(), dst.len())?;
        let mut prev = 0i32;
        for (out, &value) in dst.iter_mut().zip(src) {
            *out = value.wrapping_sub(prev);
            prev = value;
        }
        Ok(TransformResult::new(src.len(), src.len()))
    }

    fn inverse(&mut self, src: &[i32], dst: &mut [i32]) -> Result<TransformResult> {
        check_capacity(src.len(), dst.len())?;
        let mut prev = 0i32;
        for (out, &delta) in dst.iter_mut().zip(src) {
            prev = prev.wrapping_add(delta);
            *out = prev;
        }
        Ok(TransformResult::new(src.len(), src.len()))
    }
}

impl Function<i32> for DeltaCodec {
    fn max_encoded_len(&self, src_len: usize) -> Option<usize> {
        Some(src_len)
    }
}
