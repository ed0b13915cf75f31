//! Stream header.
//!
//! ```text
//! magic         32  0x4F58424B ("OXBK")
//! version        8
//! checksum       1  CRC-32 per block when set
//! entropy        5  entropy codec id
//! count          4  number of transforms (0..=8)
//! transforms  6*count  transform ids
//! block size    28  block size / 16
//! ```

use crate::config::{BLOCK_SIZE_ALIGN, StreamConfig, validate_block_size};
use oxiblock_core::bitstream::{DefaultInputBitStream, OutputBitStream};
use oxiblock_core::error::{OxiBlockError, Result};
use oxiblock_entropy::EntropyCodecType;
use oxiblock_transform::TransformType;
use oxiblock_transform::sequence::MAX_STEPS;
use std::io::Read;

/// Stream magic number.
pub const MAGIC: u32 = 0x4F58_424B;

/// Container format version.
pub const STREAM_VERSION: u8 = 1;

const ENTROPY_BITS: u32 = 5;
const COUNT_BITS: u32 = 4;
const TRANSFORM_BITS: u32 = 6;
const BLOCK_SIZE_BITS: u32 = 28;

/// Parameters recorded at the start of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Raw bytes per block.
    pub block_size: usize,
    /// Entropy codec of every block.
    pub entropy: EntropyCodecType,
    /// Transforms of every block.
    pub transforms: Vec<TransformType>,
    /// Whether blocks carry a CRC-32.
    pub checksum: bool,
}

impl StreamHeader {
    /// Header describing streams written with `config`.
    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            block_size: config.block_size,
            entropy: config.entropy,
            transforms: config.transforms.clone(),
            checksum: config.checksum,
        }
    }

    /// Size of the encoded header in bits.
    pub fn bit_len(&self) -> u64 {
        (32 + 8 + 1 + ENTROPY_BITS + COUNT_BITS + BLOCK_SIZE_BITS) as u64
            + self.transforms.len() as u64 * TRANSFORM_BITS as u64
    }

    /// Write the header. The fields must already be validated.
    pub fn write(&self, obs: &mut dyn OutputBitStream) -> Result<()> {
        obs.write_bits(MAGIC as u64, 32);
        obs.write_bits(STREAM_VERSION as u64, 8);
        obs.write_bit(self.checksum as u32);
        obs.write_bits(self.entropy.id() as u64, ENTROPY_BITS);
        obs.write_bits(self.transforms.len() as u64, COUNT_BITS);
        for transform in &self.transforms {
            obs.write_bits(transform.id() as u64, TRANSFORM_BITS);
        }
        obs.write_bits((self.block_size / BLOCK_SIZE_ALIGN) as u64, BLOCK_SIZE_BITS);
        obs.check()
    }

    /// Read and validate a header.
    pub fn read<R: Read>(ibs: &mut DefaultInputBitStream<R>) -> Result<Self> {
        let magic = ibs.try_read_bits(32)? as u32;
        if magic != MAGIC {
            return Err(OxiBlockError::invalid_file(format!(
                "bad magic {magic:#010x}, expected {MAGIC:#010x}"
            )));
        }

        let version = ibs.try_read_bits(8)? as u8;
        if version != STREAM_VERSION {
            return Err(OxiBlockError::stream_version(STREAM_VERSION, version));
        }

        let checksum = ibs.try_read_bits(1)? == 1;
        let entropy = EntropyCodecType::from_id(ibs.try_read_bits(ENTROPY_BITS)? as u8)?;

        let count = ibs.try_read_bits(COUNT_BITS)? as usize;
        if count > MAX_STEPS {
            return Err(OxiBlockError::invalid_file(format!(
                "{count} transforms in header, at most {MAX_STEPS} allowed"
            )));
        }
        let transforms = (0..count)
            .map(|_| TransformType::from_id(ibs.try_read_bits(TRANSFORM_BITS)? as u8))
            .collect::<Result<Vec<_>>>()?;

        let block_size = ibs.try_read_bits(BLOCK_SIZE_BITS)? as usize * BLOCK_SIZE_ALIGN;
        validate_block_size(block_size)?;

        Ok(Self {
            block_size,
            entropy,
            transforms,
            checksum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxiblock_core::ErrorKind;
    use oxiblock_core::bitstream::DefaultOutputBitStream;
    use std::io::Cursor;

    fn encode(header: &StreamHeader) -> Vec<u8> {
        let mut output = Vec::new();
        let mut obs = DefaultOutputBitStream::new(&mut output);
        header.write(&mut obs).unwrap();
        assert_eq!(obs.written(), header.bit_len());
        obs.close().unwrap();
        drop(obs);
        output
    }

    fn decode(bytes: &[u8]) -> Result<StreamHeader> {
        let mut ibs = DefaultInputBitStream::new(Cursor::new(bytes));
        StreamHeader::read(&mut ibs)
    }

    #[test]
    fn test_header_roundtrip() {
        let header = StreamHeader::from_config(&StreamConfig::default());
        let bytes = encode(&header);
        assert_eq!(&bytes[..4], b"OXBK");
        assert_eq!(bytes[4], STREAM_VERSION);
        assert_eq!(decode(&bytes).unwrap(), header);
    }

    #[test]
    fn test_header_without_transforms() {
        let header = StreamHeader::from_config(&StreamConfig::stored().with_checksum(false));
        assert_eq!(header.bit_len(), 78);
        assert_eq!(decode(&encode(&header)).unwrap(), header);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&StreamHeader::from_config(&StreamConfig::default()));
        bytes[0] = b'Z';
        assert_eq!(decode(&bytes).unwrap_err().kind(), ErrorKind::InvalidFile);
    }

    #[test]
    fn test_bad_version() {
        let mut bytes = encode(&StreamHeader::from_config(&StreamConfig::default()));
        bytes[4] = 7;
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StreamVersion);
        assert!(matches!(err, OxiBlockError::StreamVersion { expected: 1, found: 7 }));
    }

    #[test]
    fn test_unknown_codec_id() {
        let mut bytes = encode(&StreamHeader::from_config(&StreamConfig::stored()));
        // Byte 5 holds the checksum flag and the 5-bit entropy id
        bytes[5] = 0b1_11111_00;
        assert_eq!(decode(&bytes).unwrap_err().kind(), ErrorKind::InvalidCodec);
    }

    #[test]
    fn test_truncated_header() {
        let bytes = encode(&StreamHeader::from_config(&StreamConfig::default()));
        assert_eq!(decode(&bytes[..6]).unwrap_err().kind(), ErrorKind::InvalidFile);
        assert_eq!(decode(&[]).unwrap_err().kind(), ErrorKind::InvalidFile);
    }

    #[test]
    fn test_block_size_out_of_range() {
        let mut output = Vec::new();
        {
            let mut obs = DefaultOutputBitStream::new(&mut output);
            obs.write_bits(MAGIC as u64, 32);
            obs.write_bits(STREAM_VERSION as u64, 8);
            obs.write_bits(0, 1 + ENTROPY_BITS + COUNT_BITS);
            obs.write_bits(4, BLOCK_SIZE_BITS);
            obs.close().unwrap();
        }
        assert_eq!(decode(&output).unwrap_err().kind(), ErrorKind::BlockSize);
    }
}
