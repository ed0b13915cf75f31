//! Burrows-Wheeler Transform.
//!
//! The BWT is a reversible transformation that groups similar bytes together,
//! making the data more compressible. The forward output is the 4-byte
//! big-endian primary index (the row of the original string among the sorted
//! rotations) followed by the last column of the sorted rotation matrix.

use oxiblock_core::error::{OxiBlockError, Result};
use oxiblock_core::transform::{Function, Transform, TransformResult, check_capacity};

/// Size of the primary index header.
pub const PRIMARY_INDEX_SIZE: usize = 4;

/// Burrows-Wheeler transform over bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bwt;

impl Bwt {
    /// Create the transform.
    pub fn new() -> Self {
        Self
    }
}

/// Sort all rotations of `data`.
///
/// Prefix doubling: rotations are ranked by their first `h` bytes, then by
/// the pair of ranks at `i` and `i + h`, with `h` doubling each round. Each
/// round is two counting sorts, so the whole sort is `O(n log n)` even on
/// highly repetitive input.
fn sort_rotations(data: &[u8]) -> Vec<u32> {
    let n = data.len();
    let mut order = vec![0u32; n];
    let mut class = vec![0u32; n];
    let mut counts = vec![0usize; n.max(256)];

    for &byte in data {
        counts[byte as usize] += 1;
    }
    for i in 1..256 {
        counts[i] += counts[i - 1];
    }
    for (i, &byte) in data.iter().enumerate().rev() {
        counts[byte as usize] -= 1;
        order[counts[byte as usize]] = i as u32;
    }

    let mut classes = 1usize;
    for i in 1..n {
        if data[order[i] as usize] != data[order[i - 1] as usize] {
            classes += 1;
        }
        class[order[i] as usize] = (classes - 1) as u32;
    }

    let mut shifted = vec![0u32; n];
    let mut next_class = vec![0u32; n];
    let mut h = 1usize;

    while h < n && classes < n {
        // Rotations ordered by their second half; stable sort by first half
        for (slot, &start) in shifted.iter_mut().zip(order.iter()) {
            *slot = ((start as usize + n - h) % n) as u32;
        }

        counts[..classes].fill(0);
        for &start in &shifted {
            counts[class[start as usize] as usize] += 1;
        }
        for i in 1..classes {
            counts[i] += counts[i - 1];
        }
        for &start in shifted.iter().rev() {
            let c = class[start as usize] as usize;
            counts[c] -= 1;
            order[counts[c]] = start;
        }

        let key = |start: u32| {
            let start = start as usize;
            (class[start], class[(start + h) % n])
        };
        next_class[order[0] as usize] = 0;
        classes = 1;
        for i in 1..n {
            if key(order[i]) != key(order[i - 1]) {
                classes += 1;
            }
            next_class[order[i] as usize] = (classes - 1) as u32;
        }

        std::mem::swap(&mut class, &mut next_class);
        h <<= 1;
    }

    order
}

impl Transform<u8> for Bwt {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformResult> {
        if src.is_empty() {
            return Ok(TransformResult::default());
        }

        let n = src.len();
        if u32::try_from(n).is_err() {
            return Err(OxiBlockError::invalid_param(
                "src",
                format!("BWT input of {n} bytes exceeds the 32-bit primary index"),
            ));
        }
        check_capacity(n + PRIMARY_INDEX_SIZE, dst.len())?;

        let order = sort_rotations(src);

        // Rotation 0 is always present
        let primary = order.iter().position(|&start| start == 0).unwrap_or(0) as u32;
        dst[..PRIMARY_INDEX_SIZE].copy_from_slice(&primary.to_be_bytes());

        // Last column of the sorted matrix
        for (out, &start) in dst[PRIMARY_INDEX_SIZE..].iter_mut().zip(order.iter()) {
            *out = src[(start as usize + n - 1) % n];
        }

        Ok(TransformResult::new(n, n + PRIMARY_INDEX_SIZE))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformResult> {
        if src.is_empty() {
            return Ok(TransformResult::default());
        }
        if src.len() <= PRIMARY_INDEX_SIZE {
            return Err(OxiBlockError::corrupted(format!(
                "BWT block of {} bytes is too short",
                src.len()
            )));
        }

        let mut header = [0u8; PRIMARY_INDEX_SIZE];
        header.copy_from_slice(&src[..PRIMARY_INDEX_SIZE]);
        let primary = u32::from_be_bytes(header) as usize;
        let data = &src[PRIMARY_INDEX_SIZE..];
        let n = data.len();

        if primary >= n {
            return Err(OxiBlockError::corrupted(format!(
                "BWT primary index {primary} out of range for {n} bytes"
            )));
        }
        check_capacity(n, dst.len())?;

        // Count occurrences of each byte
        let mut counts = [0usize; 256];
        for &byte in data {
            counts[byte as usize] += 1;
        }

        // Starting position of each byte in the first column
        let mut positions = [0usize; 256];
        let mut total = 0;
        for (position, &count) in positions.iter_mut().zip(counts.iter()) {
            *position = total;
            total += count;
        }

        // next[i]: row holding the successor of row i in the original string
        let mut next = vec![0u32; n];
        for (i, &byte) in data.iter().enumerate() {
            next[positions[byte as usize]] = i as u32;
            positions[byte as usize] += 1;
        }

        let mut idx = next[primary] as usize;
        for out in dst[..n].iter_mut() {
            *out = data[idx];
            idx = next[idx] as usize;
        }

        Ok(TransformResult::new(src.len(), n))
    }
}

impl Function<u8> for Bwt {
    fn max_encoded_len(&self, src_len: usize) -> Option<usize> {
        Some(src_len + PRIMARY_INDEX_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxiblock_core::ErrorKind;

    fn forward(data: &[u8]) -> Vec<u8> {
        let mut dst = vec![0u8; data.len() + PRIMARY_INDEX_SIZE];
        let result = Bwt::new().forward(data, &mut dst).unwrap();
        assert_eq!(result.consumed, data.len());
        dst.truncate(result.produced);
        dst
    }

    fn inverse(data: &[u8]) -> Vec<u8> {
        let mut dst = vec![0u8; data.len()];
        let result = Bwt::new().inverse(data, &mut dst).unwrap();
        assert_eq!(result.consumed, data.len());
        dst.truncate(result.produced);
        dst
    }

    #[test]
    fn test_bwt_empty() {
        assert!(forward(b"").is_empty());
        assert!(inverse(b"").is_empty());
    }

    #[test]
    fn test_bwt_single() {
        assert_eq!(forward(b"a"), [0, 0, 0, 0, b'a']);
    }

    #[test]
    fn test_bwt_banana() {
        // Classic BWT example
        let transformed = forward(b"banana");
        assert_eq!(&transformed[..4], &3u32.to_be_bytes());
        assert_eq!(&transformed[4..], b"nnbaaa");
        assert_eq!(inverse(&transformed), b"banana");
    }

    #[test]
    fn test_bwt_roundtrip() {
        let test_cases = [
            b"hello world".as_slice(),
            b"abracadabra",
            b"mississippi",
            b"aaaaa",
            b"abababab",
            b"abcde",
            b"the quick brown fox jumps over the lazy dog",
        ];

        for data in test_cases {
            let transformed = forward(data);
            assert_eq!(inverse(&transformed), data, "Failed for: {:?}", data);
        }
    }

    #[test]
    fn test_bwt_matches_naive_sort() {
        let data = b"she sells sea shells by the sea shore";
        let n = data.len();
        let mut rotations: Vec<Vec<u8>> = (0..n)
            .map(|i| data[i..].iter().chain(&data[..i]).copied().collect())
            .collect();
        rotations.sort();
        let last: Vec<u8> = rotations.iter().map(|r| r[n - 1]).collect();

        assert_eq!(&forward(data)[4..], last.as_slice());
    }

    #[test]
    fn test_bwt_groups_similar() {
        // BWT should group similar bytes together
        let transformed = forward(b"abababab");
        let runs = 1 + transformed[4..].windows(2).filter(|w| w[0] != w[1]).count();
        assert!(runs <= 4, "BWT should group similar bytes");
    }

    #[test]
    fn test_bwt_large_repetitive_block() {
        let data: Vec<u8> = b"0123456789".iter().copied().cycle().take(200_000).collect();
        let transformed = forward(&data);
        assert_eq!(inverse(&transformed), data);
    }

    #[test]
    fn test_bwt_rejects_bad_input() {
        let mut dst = [0u8; 16];
        let err = Bwt::new().inverse(&[0, 0, 0], &mut dst).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProcessBlock);

        let err = Bwt::new()
            .inverse(&[0, 0, 0, 9, b'a', b'b'], &mut dst)
            .unwrap_err();
        assert!(matches!(err, OxiBlockError::CorruptedBlock { .. }));

        let mut small = [0u8; 4];
        let err = Bwt::new().forward(b"abc", &mut small).unwrap_err();
        assert!(matches!(err, OxiBlockError::BufferTooSmall { .. }));
    }
}
