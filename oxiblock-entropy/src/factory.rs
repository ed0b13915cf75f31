//! Entropy codec registry.
//!
//! Codecs are addressed by a stable numeric id (stored in stream headers)
//! or by a case-insensitive name.

use crate::binary::{BinaryEntropyDecoder, BinaryEntropyEncoder};
use crate::codec::{EntropyDecoder, EntropyEncoder};
use crate::null::{NullEntropyDecoder, NullEntropyEncoder};
use crate::paq::PaqPredictor;
use crate::predictor::{FixedPredictor, Order0Predictor};
use oxiblock_core::bitstream::{InputBitStream, OutputBitStream};
use oxiblock_core::error::{OxiBlockError, Result};
use std::fmt;
use std::str::FromStr;

/// Registered entropy codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[repr(u8)]
pub enum EntropyCodecType {
    /// Bytes stored verbatim.
    None = 0,
    /// Binary coder with a constant 50% prediction.
    Fixed = 1,
    /// Binary coder with an order-0 adaptive predictor.
    Order0 = 2,
    /// Binary coder with the bit-history context-mixing predictor.
    #[default]
    Paq = 3,
}

impl EntropyCodecType {
    /// Every registered codec, in id order.
    pub const ALL: [Self; 4] = [Self::None, Self::Fixed, Self::Order0, Self::Paq];

    /// Look up a codec by id.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Self::None),
            1 => Ok(Self::Fixed),
            2 => Ok(Self::Order0),
            3 => Ok(Self::Paq),
            _ => Err(OxiBlockError::invalid_codec(format!("entropy codec id {id}"))),
        }
    }

    /// Look up a codec by name, ignoring case.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|codec| codec.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| OxiBlockError::invalid_codec(format!("entropy codec '{name}'")))
    }

    /// Stable numeric id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Fixed => "FIXED",
            Self::Order0 => "ORDER0",
            Self::Paq => "PAQ",
        }
    }

    /// Create an encoder of this type writing to `stream`.
    pub fn new_encoder<'a>(
        self,
        stream: &'a mut dyn OutputBitStream,
    ) -> Result<Box<dyn EntropyEncoder + 'a>> {
        let encoder: Box<dyn EntropyEncoder + 'a> = match self {
            Self::None => Box::new(NullEntropyEncoder::new(stream)),
            Self::Fixed => Box::new(BinaryEntropyEncoder::new(stream, FixedPredictor::default())),
            Self::Order0 => Box::new(BinaryEntropyEncoder::new(stream, Order0Predictor::new())),
            Self::Paq => Box::new(BinaryEntropyEncoder::new(stream, PaqPredictor::new())),
        };
        Ok(encoder)
    }

    /// Create a decoder of this type reading from `stream`.
    pub fn new_decoder<'a>(
        self,
        stream: &'a mut dyn InputBitStream,
    ) -> Result<Box<dyn EntropyDecoder + 'a>> {
        let decoder: Box<dyn EntropyDecoder + 'a> = match self {
            Self::None => Box::new(NullEntropyDecoder::new(stream)),
            Self::Fixed => Box::new(BinaryEntropyDecoder::new(stream, FixedPredictor::default())),
            Self::Order0 => Box::new(BinaryEntropyDecoder::new(stream, Order0Predictor::new())),
            Self::Paq => Box::new(BinaryEntropyDecoder::new(stream, PaqPredictor::new())),
        };
        Ok(decoder)
    }

    /// Whether `bits` is a possible length for one block coded with this codec
    /// holding `len` bytes.
    pub fn is_valid_coded_len(self, bits: u64, len: usize) -> bool {
        match self {
            Self::None => bits == len as u64 * 8,
            _ => crate::binary::is_valid_coded_len(bits),
        }
    }

    /// Most bits this codec can emit for a block of `len` bytes.
    pub fn max_coded_bits(self, len: usize) -> u64 {
        match self {
            Self::None => (len as u64).saturating_mul(8),
            _ => crate::binary::max_coded_len(len),
        }
    }
}

impl fmt::Display for EntropyCodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntropyCodecType {
    type Err = OxiBlockError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxiblock_core::ErrorKind;
    use oxiblock_core::bitstream::{DefaultInputBitStream, DefaultOutputBitStream};
    use std::io::Cursor;

    #[test]
    fn test_max_coded_bits() {
        assert_eq!(EntropyCodecType::None.max_coded_bits(10), 80);
        for codec in [EntropyCodecType::Fixed, EntropyCodecType::Order0, EntropyCodecType::Paq] {
            assert_eq!(codec.max_coded_bits(0), 56);
            assert_eq!(codec.max_coded_bits(3), 56 + 3 * 8 * 32);
            assert!(codec.is_valid_coded_len(codec.max_coded_bits(3), 3));
        }
    }

    #[test]
    fn test_names_and_ids() {
        for codec in EntropyCodecType::ALL {
            assert_eq!(EntropyCodecType::from_id(codec.id()).unwrap(), codec);
            assert_eq!(EntropyCodecType::from_name(codec.name()).unwrap(), codec);
        }
        assert_eq!(
            EntropyCodecType::from_name("order0").unwrap(),
            EntropyCodecType::Order0
        );
        assert_eq!("paq".parse::<EntropyCodecType>().unwrap(), EntropyCodecType::Paq);
        assert_eq!(EntropyCodecType::Fixed.to_string(), "FIXED");
    }

    #[test]
    fn test_unknown_codec() {
        let err = EntropyCodecType::from_name("HUFFMAN").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCodec);
        let err = EntropyCodecType::from_id(9).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCodec);
    }

    #[test]
    fn test_factory_roundtrip() {
        let data = b"abracadabra abracadabra abracadabra";
        for codec in EntropyCodecType::ALL {
            let mut output = Vec::new();
            let written = {
                let mut obs = DefaultOutputBitStream::new(&mut output);
                {
                    let mut encoder = codec.new_encoder(&mut obs).unwrap();
                    encoder.write(data).unwrap();
                    encoder.dispose();
                }
                obs.close().unwrap();
                obs.written()
            };
            assert!(codec.is_valid_coded_len(written, data.len()), "{codec}");

            let mut ibs = DefaultInputBitStream::new(Cursor::new(output));
            let mut decoded = vec![0u8; data.len()];
            {
                let mut decoder = codec.new_decoder(&mut ibs).unwrap();
                decoder.read(&mut decoded).unwrap();
                decoder.dispose();
            }
            assert_eq!(&decoded, data, "{codec}");
            assert_eq!(ibs.read(), written, "{codec}");
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&EntropyCodecType::Order0).unwrap();
        assert_eq!(json, "\"ORDER0\"");
        let codec: EntropyCodecType = serde_json::from_str("\"PAQ\"").unwrap();
        assert_eq!(codec, EntropyCodecType::Paq);
    }
}
