//! Block encoding and framing.
//!
//! A block is run through the transform sequence and entropy coded into its
//! own bit stream, the payload:
//!
//! ```text
//! skip flags          8
//! original length    32
//! transformed length 32
//! CRC-32             32  (only when the stream has checksums)
//! entropy data       ..
//! ```
//!
//! In the main stream each payload is framed as a 6-bit width `w`, the
//! payload bit length in `w` bits, then the payload bits. A width of 0 ends
//! the stream; a width of 63 marks a stream whose writer failed.
//!
//! Lengths read from a frame are checked against what the codec and the
//! transforms can produce, and buffers grow in chunks as bits arrive, so a
//! malformed length fails with an error rather than a huge allocation.

use crate::header::StreamHeader;
use oxiblock_core::bitstream::{
    DefaultInputBitStream, DefaultOutputBitStream, InputBitStream, OutputBitStream,
};
use oxiblock_core::crc::Crc32;
use oxiblock_core::error::{OxiBlockError, Result};
use oxiblock_core::transform::Transform;
use oxiblock_entropy::EntropyCodecType;
use oxiblock_transform::{TransformType, new_sequence};
use std::io::{Cursor, Read};

/// Extra room given to the transforms beyond the raw block length.
pub const TRANSFORM_HEADROOM: usize = 64;

/// Bits of the payload length width field.
const WIDTH_BITS: u32 = 6;

/// Width value written in place of a frame when the writer failed.
const ABORT_WIDTH: u64 = (1 << WIDTH_BITS) - 1;

/// Bytes read or decoded per step while a buffer is filled.
const CHUNK_SIZE: usize = 1 << 16;

/// Payload header size without and with a checksum.
const PAYLOAD_HEADER_BITS: u64 = 8 + 32 + 32;
const CHECKSUM_BITS: u64 = 32;

/// Framed payload of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFrame {
    /// Payload bits, zero padded to a whole byte.
    pub payload: Vec<u8>,
    /// Payload length in bits.
    pub bits: u64,
}

/// Result of compressing one block.
#[derive(Debug, Clone)]
pub struct EncodedBlock {
    /// Framed payload.
    pub frame: BlockFrame,
    /// Raw length.
    pub original_len: usize,
    /// Length after the transforms.
    pub transformed_len: usize,
    /// Transforms skipped for this block.
    pub skip_flags: u8,
}

/// Result of decompressing one block.
#[derive(Debug, Clone)]
pub struct DecodedBlock {
    /// Raw bytes.
    pub data: Vec<u8>,
    /// Length after the transforms.
    pub transformed_len: usize,
}

/// Compresses and decompresses the blocks of one stream.
///
/// Holds only the stream parameters; every call builds its own transform
/// sequence, bit stream and entropy coder, so one codec can be shared by
/// worker threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCodec {
    block_size: usize,
    entropy: EntropyCodecType,
    transforms: Vec<TransformType>,
    checksum: bool,
}

impl BlockCodec {
    /// Create a codec for streams described by `header`.
    pub fn new(header: &StreamHeader) -> Self {
        Self {
            block_size: header.block_size,
            entropy: header.entropy,
            transforms: header.transforms.clone(),
            checksum: header.checksum,
        }
    }

    /// Raw bytes per block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    fn header_bits(&self) -> u64 {
        if self.checksum {
            PAYLOAD_HEADER_BITS + CHECKSUM_BITS
        } else {
            PAYLOAD_HEADER_BITS
        }
    }

    fn max_transformed_len(&self) -> usize {
        self.block_size + TRANSFORM_HEADROOM
    }

    /// Largest payload length a block of this stream can have.
    pub fn max_frame_bits(&self) -> u64 {
        self.header_bits() + self.entropy.max_coded_bits(self.max_transformed_len())
    }

    /// Most raw bytes the inverse transforms can rebuild from
    /// `transformed_len` bytes when the steps in `skip_flags` were skipped.
    fn max_original_len(&self, transformed_len: usize, skip_flags: u8) -> usize {
        self.transforms
            .iter()
            .enumerate()
            .rev()
            .filter(|&(i, _)| (skip_flags >> i) & 1 == 0)
            .fold(transformed_len, |len, (_, t)| t.max_decoded_len(len))
    }

    /// Compress one block of at most `block_size` bytes.
    pub fn encode(&self, data: &[u8]) -> Result<EncodedBlock> {
        if data.len() > self.block_size {
            return Err(OxiBlockError::invalid_param(
                "block",
                format!("{} bytes exceed the block size {}", data.len(), self.block_size),
            ));
        }

        let mut sequence = new_sequence(&self.transforms)?;
        let mut transformed = vec![0u8; data.len() + TRANSFORM_HEADROOM];
        let result = sequence.forward(data, &mut transformed)?;
        transformed.truncate(result.produced);
        let skip_flags = sequence.skip_flags();

        let mut payload = Vec::with_capacity(transformed.len() + 16);
        let bits = {
            let mut obs = DefaultOutputBitStream::new(&mut payload);
            obs.write_bits(skip_flags as u64, 8);
            obs.write_bits(data.len() as u64, 32);
            obs.write_bits(transformed.len() as u64, 32);
            if self.checksum {
                obs.write_bits(Crc32::compute(data) as u64, 32);
            }
            {
                let mut encoder = self.entropy.new_encoder(&mut obs)?;
                encoder.write(&transformed)?;
                encoder.dispose();
            }
            obs.close()?;
            obs.written()
        };

        Ok(EncodedBlock {
            frame: BlockFrame { payload, bits },
            original_len: data.len(),
            transformed_len: transformed.len(),
            skip_flags,
        })
    }

    /// Decompress one framed block.
    pub fn decode(&self, frame: &BlockFrame) -> Result<DecodedBlock> {
        let header_bits = self.header_bits();
        if frame.bits < header_bits || frame.payload.len() as u64 * 8 < frame.bits {
            return Err(OxiBlockError::corrupted(format!(
                "block payload of {} bits is too short",
                frame.bits
            )));
        }

        // Payload bits past `frame.bits` are padding and must not reach the decoder
        let payload = &frame.payload[..frame.bits.div_ceil(8) as usize];
        let mut ibs = DefaultInputBitStream::new(Cursor::new(payload));
        let skip_flags = ibs.try_read_bits(8)? as u8;
        let original_len = ibs.try_read_bits(32)? as usize;
        let transformed_len = ibs.try_read_bits(32)? as usize;
        let expected_crc = if self.checksum {
            Some(ibs.try_read_bits(32)? as u32)
        } else {
            None
        };

        if original_len > self.block_size {
            return Err(OxiBlockError::corrupted(format!(
                "block length {original_len} exceeds the block size {}",
                self.block_size
            )));
        }
        if transformed_len > original_len + TRANSFORM_HEADROOM {
            return Err(OxiBlockError::corrupted(format!(
                "transformed length {transformed_len} too large for a block of {original_len} bytes"
            )));
        }
        if u32::from(skip_flags) >> self.transforms.len() != 0 {
            return Err(OxiBlockError::corrupted(format!(
                "skip flags {skip_flags:#010b} name missing transforms"
            )));
        }
        let coded_bits = frame.bits - header_bits;
        if !self.entropy.is_valid_coded_len(coded_bits, transformed_len)
            || coded_bits > self.entropy.max_coded_bits(transformed_len)
        {
            return Err(OxiBlockError::corrupted(format!(
                "{coded_bits} coded bits cannot hold {transformed_len} bytes"
            )));
        }
        if original_len > self.max_original_len(transformed_len, skip_flags) {
            return Err(OxiBlockError::corrupted(format!(
                "{transformed_len} transformed bytes cannot rebuild {original_len} bytes"
            )));
        }

        // The first read primes the decoder, even for an empty block
        let mut transformed = Vec::with_capacity(transformed_len.min(CHUNK_SIZE));
        {
            let mut decoder = self.entropy.new_decoder(&mut ibs)?;
            loop {
                let start = transformed.len();
                let end = transformed_len.min(start + CHUNK_SIZE);
                transformed.resize(end, 0);
                decoder.read(&mut transformed[start..])?;
                if end == transformed_len {
                    break;
                }
            }
            decoder.dispose();
        }
        if ibs.read() != frame.bits {
            return Err(OxiBlockError::corrupted(format!(
                "entropy decoder consumed {} of {} payload bits",
                ibs.read(),
                frame.bits
            )));
        }

        let mut sequence = new_sequence(&self.transforms)?;
        sequence.set_skip_flags(skip_flags);
        let mut data = vec![0u8; original_len + TRANSFORM_HEADROOM];
        let result = sequence.inverse(&transformed, &mut data)?;
        if result.produced != original_len {
            return Err(OxiBlockError::corrupted(format!(
                "inverse transforms produced {} bytes, expected {original_len}",
                result.produced
            )));
        }
        data.truncate(original_len);

        if let Some(expected) = expected_crc {
            let computed = Crc32::compute(&data);
            if computed != expected {
                return Err(OxiBlockError::crc_mismatch(expected, computed));
            }
        }

        Ok(DecodedBlock {
            data,
            transformed_len,
        })
    }
}

/// Append a framed payload to the main stream.
pub fn write_frame(obs: &mut dyn OutputBitStream, frame: &BlockFrame) -> Result<()> {
    let width = u64::BITS - frame.bits.leading_zeros();
    obs.write_bits(width as u64, WIDTH_BITS);
    obs.write_bits(frame.bits, width);
    obs.write_array(&frame.payload, frame.bits);
    obs.check()
}

/// Write the end-of-stream marker.
pub fn write_end_marker(obs: &mut dyn OutputBitStream) -> Result<()> {
    obs.write_bits(0, WIDTH_BITS);
    obs.check()
}

/// Write the marker of a stream abandoned after a failure. Readers reject
/// it, so the stream can never pass for a complete one.
pub fn write_abort_marker(obs: &mut dyn OutputBitStream) -> Result<()> {
    obs.write_bits(ABORT_WIDTH, WIDTH_BITS);
    obs.check()
}

/// Read the next frame, or `None` at the end-of-stream marker.
///
/// The payload is read in chunks, so a length beyond the end of the input
/// fails once the input runs out.
pub fn read_frame<R: Read>(
    ibs: &mut DefaultInputBitStream<R>,
    max_bits: u64,
) -> Result<Option<BlockFrame>> {
    let width = ibs.try_read_bits(WIDTH_BITS)?;
    if width == 0 {
        return Ok(None);
    }
    if width == ABORT_WIDTH {
        return Err(OxiBlockError::invalid_file(
            "stream was abandoned after a compression failure",
        ));
    }

    let bits = ibs.try_read_bits(width as u32)?;
    if bits > max_bits {
        return Err(OxiBlockError::invalid_file(format!(
            "block frame of {bits} bits exceeds the limit of {max_bits}"
        )));
    }

    let chunk_bits = CHUNK_SIZE as u64 * 8;
    let mut payload = Vec::with_capacity((bits.div_ceil(8) as usize).min(CHUNK_SIZE));
    let mut remaining = bits;
    while remaining > 0 {
        let count = remaining.min(chunk_bits);
        let start = payload.len();
        payload.resize(start + count.div_ceil(8) as usize, 0);
        ibs.try_read_array(&mut payload[start..], count)?;
        remaining -= count;
    }
    Ok(Some(BlockFrame { payload, bits }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAX_BLOCK_SIZE, StreamConfig};
    use oxiblock_core::ErrorKind;

    fn codec(config: &StreamConfig) -> BlockCodec {
        BlockCodec::new(&StreamHeader::from_config(config))
    }

    fn sample(len: usize) -> Vec<u8> {
        b"It was the best of times, it was the worst of times. "
            .iter()
            .copied()
            .cycle()
            .take(len)
            .collect()
    }

    #[test]
    fn test_block_roundtrip() {
        let codec = codec(&StreamConfig::default().with_block_size(64 * 1024));
        let data = sample(50_000);
        let block = codec.encode(&data).unwrap();
        assert_eq!(block.original_len, data.len());
        assert!(block.frame.payload.len() < data.len() / 10);

        let decoded = codec.decode(&block.frame).unwrap();
        assert_eq!(decoded.data, data);
        assert_eq!(decoded.transformed_len, block.transformed_len);
    }

    #[test]
    fn test_stored_block_layout() {
        let codec = codec(&StreamConfig::stored().with_checksum(false));
        let block = codec.encode(b"abc").unwrap();
        assert_eq!(block.frame.bits, 72 + 24);
        assert_eq!(block.frame.payload[0], 0);
        assert_eq!(&block.frame.payload[1..5], &3u32.to_be_bytes());
        assert_eq!(&block.frame.payload[9..], b"abc");
    }

    #[test]
    fn test_empty_block() {
        let codec = codec(&StreamConfig::default());
        let block = codec.encode(&[]).unwrap();
        assert!(codec.decode(&block.frame).unwrap().data.is_empty());
    }

    #[test]
    fn test_oversized_block_rejected() {
        let codec = codec(&StreamConfig::default().with_block_size(1024));
        let err = codec.encode(&[0u8; 1025]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParam);
    }

    #[test]
    fn test_checksum_mismatch() {
        let codec = codec(&StreamConfig::stored());
        let mut block = codec.encode(b"checksummed").unwrap();
        // Flip a bit of the stored data after the 104-bit header
        block.frame.payload[14] ^= 0x01;
        let err = codec.decode(&block.frame).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CrcCheck);
    }

    #[test]
    fn test_inconsistent_lengths() {
        let codec = codec(&StreamConfig::stored().with_checksum(false));
        let mut block = codec.encode(b"abcdef").unwrap();
        // Transformed length no longer matches the coded bits
        block.frame.payload[8] = 5;
        let err = codec.decode(&block.frame).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProcessBlock);

        let short = BlockFrame {
            payload: vec![0; 4],
            bits: 32,
        };
        assert_eq!(codec.decode(&short).unwrap_err().kind(), ErrorKind::ProcessBlock);
    }

    #[test]
    fn test_truncated_entropy_data() {
        let codec = codec(&StreamConfig::default().with_block_size(64 * 1024));
        let mut block = codec.encode(&sample(4000)).unwrap();
        block.frame.bits -= 32;
        let err = codec.decode(&block.frame).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProcessBlock);
    }

    #[test]
    fn test_frame_roundtrip() {
        let codec = codec(&StreamConfig::default());
        let first = codec.encode(b"first block").unwrap();
        let second = codec.encode(b"second block").unwrap();

        let mut output = Vec::new();
        {
            let mut obs = DefaultOutputBitStream::new(&mut output);
            write_frame(&mut obs, &first.frame).unwrap();
            write_frame(&mut obs, &second.frame).unwrap();
            write_end_marker(&mut obs).unwrap();
            obs.close().unwrap();
        }

        let mut ibs = DefaultInputBitStream::new(Cursor::new(output));
        let max = codec.max_frame_bits();
        assert_eq!(read_frame(&mut ibs, max).unwrap(), Some(first.frame));
        assert_eq!(read_frame(&mut ibs, max).unwrap(), Some(second.frame));
        assert_eq!(read_frame(&mut ibs, max).unwrap(), None);
    }

    #[test]
    fn test_declared_lengths_beyond_coded_data() {
        let codec = codec(&StreamConfig::default().with_block_size(MAX_BLOCK_SIZE));
        let mut payload = Vec::new();
        let bits = {
            let mut obs = DefaultOutputBitStream::new(&mut payload);
            obs.write_bits(0, 8);
            obs.write_bits(MAX_BLOCK_SIZE as u64, 32);
            obs.write_bits(MAX_BLOCK_SIZE as u64, 32);
            obs.write_bits(0, 32);
            obs.write_bits(0, 56);
            obs.close().unwrap();
            obs.written()
        };
        let err = codec.decode(&BlockFrame { payload, bits }).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProcessBlock);
    }

    #[test]
    fn test_original_len_beyond_inverse_expansion() {
        let codec = codec(&StreamConfig::stored().with_checksum(false));
        let mut block = codec.encode(b"abcdef").unwrap();
        // Nothing can turn 6 stored bytes into 7
        block.frame.payload[4] = 7;
        let err = codec.decode(&block.frame).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProcessBlock);
        assert!(err.to_string().contains("cannot rebuild"));
    }

    #[test]
    fn test_max_frame_bits_follows_codec() {
        let stored = codec(&StreamConfig::stored().with_checksum(false).with_block_size(1024));
        assert_eq!(stored.max_frame_bits(), 72 + (1024 + 64) * 8);

        let paq = codec(&StreamConfig::default().with_block_size(1024));
        assert_eq!(paq.max_frame_bits(), 104 + 56 + (1024 + 64) * 256);
    }

    #[test]
    fn test_truncated_frame_payload() {
        let mut output = Vec::new();
        {
            let mut obs = DefaultOutputBitStream::new(&mut output);
            obs.write_bits(39, WIDTH_BITS);
            obs.write_bits((1 << 38) + 12345, 39);
            obs.write_bits(0xABCD, 16);
            obs.close().unwrap();
        }
        let mut ibs = DefaultInputBitStream::new(Cursor::new(output));
        let err = read_frame(&mut ibs, 1 << 40).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFile);
    }

    #[test]
    fn test_abort_marker() {
        let mut output = Vec::new();
        {
            let mut obs = DefaultOutputBitStream::new(&mut output);
            write_abort_marker(&mut obs).unwrap();
            obs.close().unwrap();
        }
        let mut ibs = DefaultInputBitStream::new(Cursor::new(output));
        let err = read_frame(&mut ibs, 1 << 20).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFile);
    }

    #[test]
    fn test_frame_length_limit() {
        let mut output = Vec::new();
        {
            let mut obs = DefaultOutputBitStream::new(&mut output);
            obs.write_bits(40, WIDTH_BITS);
            obs.write_bits(1 << 39, 40);
            obs.close().unwrap();
        }
        let mut ibs = DefaultInputBitStream::new(Cursor::new(output));
        let err = read_frame(&mut ibs, 1 << 20).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFile);
    }
}
