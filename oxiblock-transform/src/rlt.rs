//! Run-Length Transform.
//!
//! Runs of 4 or more identical bytes are encoded as:
//! - First 4 bytes as-is
//! - Then a count byte (0-251) for additional repeats
//!
//! Runs longer than 255 bytes are split. Shorter runs are copied verbatim.

use oxiblock_core::error::{OxiBlockError, Result};
use oxiblock_core::transform::{Function, Transform, TransformResult};

/// Run length that triggers a count byte.
pub const RUN_THRESHOLD: usize = 4;

/// Longest run covered by one marker and count byte.
pub const MAX_RUN: usize = RUN_THRESHOLD + 251;

/// Run-length transform over bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rlt;

impl Rlt {
    /// Create the transform.
    pub fn new() -> Self {
        Self
    }
}

/// Sequential writer into a fixed destination.
struct Output<'a> {
    dst: &'a mut [u8],
    pos: usize,
}

impl Output<'_> {
    #[inline]
    fn push(&mut self, byte: u8, count: usize) -> Result<()> {
        let end = self.pos + count;
        if end > self.dst.len() {
            return Err(OxiBlockError::buffer_too_small(end, self.dst.len()));
        }
        self.dst[self.pos..end].fill(byte);
        self.pos = end;
        Ok(())
    }
}

impl Transform<u8> for Rlt {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformResult> {
        let mut out = Output { dst, pos: 0 };
        let mut i = 0;

        while i < src.len() {
            let byte = src[i];
            let mut run_len = 1;

            // Count consecutive identical bytes
            while i + run_len < src.len() && src[i + run_len] == byte && run_len < MAX_RUN {
                run_len += 1;
            }

            if run_len >= RUN_THRESHOLD {
                out.push(byte, RUN_THRESHOLD)?;
                out.push((run_len - RUN_THRESHOLD) as u8, 1)?;
            } else {
                out.push(byte, run_len)?;
            }
            i += run_len;
        }

        Ok(TransformResult::new(src.len(), out.pos))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformResult> {
        let mut out = Output { dst, pos: 0 };
        let mut i = 0;

        while i < src.len() {
            let byte = src[i];
            let mut run_len = 1;
            while run_len < RUN_THRESHOLD && i + run_len < src.len() && src[i + run_len] == byte {
                run_len += 1;
            }
            i += run_len;

            if run_len < RUN_THRESHOLD {
                out.push(byte, run_len)?;
                continue;
            }

            // Found run of 4: a count byte must follow
            let Some(&extra) = src.get(i) else {
                return Err(OxiBlockError::corrupted(
                    "RLT run at end of block is missing its count byte",
                ));
            };
            if extra as usize > MAX_RUN - RUN_THRESHOLD {
                return Err(OxiBlockError::corrupted(format!(
                    "RLT run count {extra} out of range"
                )));
            }
            out.push(byte, RUN_THRESHOLD + extra as usize)?;
            i += 1;
        }

        Ok(TransformResult::new(src.len(), out.pos))
    }
}

impl Function<u8> for Rlt {
    fn max_encoded_len(&self, src_len: usize) -> Option<usize> {
        Some(src_len + src_len / RUN_THRESHOLD + 1)
    }
}
