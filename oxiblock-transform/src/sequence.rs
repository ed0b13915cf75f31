//! Ordered pipeline of functions.
//!
//! A [`TransformSequence`] runs up to [`MAX_STEPS`] functions one after the
//! other. Every intermediate result must fit in the destination given to
//! [`Transform::forward`]; a step whose output does not fit fails with
//! `BufferTooSmall` and is skipped, leaving the data unchanged. Skipped steps
//! are recorded in an 8-bit mask (bit `i` for step `i`) that must be handed
//! back through [`TransformSequence::set_skip_flags`] before the inverse.

use oxiblock_core::error::{OxiBlockError, Result};
use oxiblock_core::transform::{Function, Transform, TransformResult, check_capacity};
use std::fmt;

/// Maximum number of steps in a sequence.
pub const MAX_STEPS: usize = 8;

/// Functions applied in order on forward and in reverse order on inverse.
pub struct TransformSequence<T> {
    steps: Vec<Box<dyn Function<T>>>,
    skip_flags: u8,
}

impl<T> fmt::Debug for TransformSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformSequence")
            .field("steps", &self.steps.len())
            .field("skip_flags", &format_args!("{:#010b}", self.skip_flags))
            .finish()
    }
}

impl<T: Copy + Default> TransformSequence<T> {
    /// Create a sequence from its steps.
    pub fn new(steps: Vec<Box<dyn Function<T>>>) -> Result<Self> {
        if steps.len() > MAX_STEPS {
            return Err(OxiBlockError::invalid_param(
                "transforms",
                format!("{} steps given, at most {MAX_STEPS} allowed", steps.len()),
            ));
        }
        Ok(Self {
            steps,
            skip_flags: 0,
        })
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the sequence has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps skipped by the last forward call.
    pub fn skip_flags(&self) -> u8 {
        self.skip_flags
    }

    /// Set the steps the next inverse call must skip.
    pub fn set_skip_flags(&mut self, flags: u8) {
        self.skip_flags = flags;
    }

    fn is_skipped(&self, step: usize) -> bool {
        self.skip_flags & (1 << step) != 0
    }
}

/// Two equally sized working buffers; `front[..len]` holds the current data.
struct PingPong<T> {
    front: Vec<T>,
    back: Vec<T>,
    len: usize,
}

impl<T: Copy + Default> PingPong<T> {
    fn new(src: &[T], capacity: usize) -> Self {
        let capacity = capacity.max(src.len());
        let mut front = vec![T::default(); capacity];
        front[..src.len()].copy_from_slice(src);
        Self {
            front,
            back: vec![T::default(); capacity],
            len: src.len(),
        }
    }

    /// Run one step from front to back; on success, back becomes front.
    fn apply(
        &mut self,
        limit: usize,
        step: impl FnOnce(&[T], &mut [T]) -> Result<TransformResult>,
    ) -> Result<()> {
        let result = step(&self.front[..self.len], &mut self.back[..limit])?;
        if result.consumed != self.len {
            return Err(OxiBlockError::corrupted(format!(
                "transform step consumed {} of {} elements",
                result.consumed, self.len
            )));
        }
        std::mem::swap(&mut self.front, &mut self.back);
        self.len = result.produced;
        Ok(())
    }

    fn finish(&self, dst: &mut [T]) -> Result<usize> {
        check_capacity(self.len, dst.len())?;
        dst[..self.len].copy_from_slice(&self.front[..self.len]);
        Ok(self.len)
    }
}

impl<T: Copy + Default> Transform<T> for TransformSequence<T> {
    fn forward(&mut self, src: &[T], dst: &mut [T]) -> Result<TransformResult> {
        let limit = dst.len();
        let mut buffers = PingPong::new(src, limit);
        let mut skip_flags = 0u8;

        for (i, step) in self.steps.iter_mut().enumerate() {
            match buffers.apply(limit, |from, to| step.forward(from, to)) {
                Ok(()) => {}
                Err(OxiBlockError::BufferTooSmall { .. }) => skip_flags |= 1 << i,
                Err(e) => return Err(e),
            }
        }

        self.skip_flags = skip_flags;
        let produced = buffers.finish(dst)?;
        Ok(TransformResult::new(src.len(), produced))
    }

    /// Undo the sequence. `dst` must be at least as large as the destination
    /// given to the matching forward call.
    fn inverse(&mut self, src: &[T], dst: &mut [T]) -> Result<TransformResult> {
        let limit = dst.len().max(src.len());
        let mut buffers = PingPong::new(src, limit);

        for i in (0..self.steps.len()).rev() {
            if self.is_skipped(i) {
                continue;
            }
            let step = &mut self.steps[i];
            buffers.apply(limit, |from, to| step.inverse(from, to))?;
        }

        let produced = buffers.finish(dst)?;
        Ok(TransformResult::new(src.len(), produced))
    }
}

impl<T: Copy + Default> Function<T> for TransformSequence<T> {
    fn max_encoded_len(&self, src_len: usize) -> Option<usize> {
        // Any subset of steps may run, so never shrink the running bound
        self.steps.iter().try_fold(src_len, |bound, step| {
            step.max_encoded_len(bound).map(|next| next.max(bound))
        })
    }
}
