//! Move-to-Front Transform.
//!
//! MTF transforms a stream by replacing each byte with its position
//! in a dynamic list. After each byte, that byte is moved to the front
//! of the list. This converts local byte clusters into many zeros.

use oxiblock_core::error::Result;
use oxiblock_core::transform::{Function, Transform, TransformResult, check_capacity};

/// Move-to-front transform over bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mtft;

impl Mtft {
    /// Create the transform.
    pub fn new() -> Self {
        Self
    }
}

/// Symbol list in recency order, starting as the identity.
fn initial_list() -> [u8; 256] {
    let mut list = [0u8; 256];
    for (i, slot) in list.iter_mut().enumerate() {
        *slot = i as u8;
    }
    list
}

#[inline]
fn move_to_front(list: &mut [u8; 256], pos: usize) {
    if pos > 0 {
        let byte = list[pos];
        list.copy_within(0..pos, 1);
        list[0] = byte;
    }
}

impl Transform<u8> for Mtft {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformResult> {
        check_capacity(src.len(), dst.len())?;
        let mut list = initial_list();

        for (out, &byte) in dst.iter_mut().zip(src) {
            // Every byte value is in the list
            let pos = list.iter().position(|&b| b == byte).unwrap_or(0);
            *out = pos as u8;
            move_to_front(&mut list, pos);
        }

        Ok(TransformResult::new(src.len(), src.len()))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<TransformResult> {
        check_capacity(src.len(), dst.len())?;
        let mut list = initial_list();

        for (out, &pos) in dst.iter_mut().zip(src) {
            *out = list[pos as usize];
            move_to_front(&mut list, pos as usize);
        }

        Ok(TransformResult::new(src.len(), src.len()))
    }
}

impl Function<u8> for Mtft {
    fn max_encoded_len(&self, src_len: usize) -> Option<usize> {
        Some(src_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward(data: &[u8]) -> Vec<u8> {
        let mut dst = vec![0u8; data.len()];
        Mtft::new().forward(data, &mut dst).unwrap();
        dst
    }

    fn inverse(data: &[u8]) -> Vec<u8> {
        let mut dst = vec![0u8; data.len()];
        Mtft::new().inverse(data, &mut dst).unwrap();
        dst
    }

    #[test]
    fn test_mtf_empty() {
        assert!(forward(b"").is_empty());
    }

    #[test]
    fn test_mtf_single() {
        assert_eq!(forward(b"a"), [b'a']);
    }

    #[test]
    fn test_mtf_repeated() {
        // Repeated bytes become zeros after the first
        assert_eq!(forward(b"aaaa"), [b'a', 0, 0, 0]);
    }

    #[test]
    fn test_mtf_alternating() {
        assert_eq!(forward(&[1, 2, 1, 2]), [1, 2, 1, 1]);
    }

    #[test]
    fn test_mtf_roundtrip() {
        let test_cases = [
            b"hello world".as_slice(),
            b"banana",
            b"abracadabra",
            &[255, 0, 255, 0, 128],
        ];

        for data in test_cases {
            assert_eq!(inverse(&forward(data)), data, "Failed for: {:?}", data);
        }
    }

    #[test]
    fn test_mtf_small_destination() {
        let mut dst = [0u8; 2];
        assert!(Mtft::new().forward(b"abc", &mut dst).is_err());
        assert!(Mtft::new().inverse(b"abc", &mut dst).is_err());
    }
}
