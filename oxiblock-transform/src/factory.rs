//! Byte transform registry.
//!
//! Transforms are addressed by a 6-bit id or a case-insensitive name. A chain
//! of transforms is written as names joined by `+`, e.g. `BWT+MTFT+RLT`.

use crate::bwt::{Bwt, PRIMARY_INDEX_SIZE};
use crate::mtf::Mtft;
use crate::null::NullFunction;
use crate::rlt::{MAX_RUN, RUN_THRESHOLD, Rlt};
use crate::sequence::{MAX_STEPS, TransformSequence};
use oxiblock_core::error::{OxiBlockError, Result};
use oxiblock_core::transform::Function;
use std::fmt;
use std::str::FromStr;

/// Separator between names in a transform chain.
pub const CHAIN_SEPARATOR: char = '+';

/// Registered byte transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[repr(u8)]
pub enum TransformType {
    /// Identity copy.
    #[default]
    None = 0,
    /// Burrows-Wheeler transform.
    Bwt = 1,
    /// Move-to-front transform.
    Mtft = 2,
    /// Run-length transform.
    Rlt = 3,
}

impl TransformType {
    /// Every registered transform, in id order.
    pub const ALL: [Self; 4] = [Self::None, Self::Bwt, Self::Mtft, Self::Rlt];

    /// Look up a transform by id.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Self::None),
            1 => Ok(Self::Bwt),
            2 => Ok(Self::Mtft),
            3 => Ok(Self::Rlt),
            _ => Err(OxiBlockError::invalid_codec(format!("transform id {id}"))),
        }
    }

    /// Look up a transform by name, ignoring case.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| OxiBlockError::invalid_codec(format!("transform '{name}'")))
    }

    /// Stable numeric id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Bwt => "BWT",
            Self::Mtft => "MTFT",
            Self::Rlt => "RLT",
        }
    }

    /// Create a fresh instance of this transform.
    pub fn new_function(self) -> Box<dyn Function<u8> + Send> {
        match self {
            Self::None => Box::new(NullFunction::<u8>::new()),
            Self::Bwt => Box::new(Bwt::new()),
            Self::Mtft => Box::new(Mtft::new()),
            Self::Rlt => Box::new(Rlt::new()),
        }
    }

    /// Most elements the inverse of this transform can produce from `len`.
    ///
    /// Lets a decoder reject a declared length before allocating for it.
    pub fn max_decoded_len(self, len: usize) -> usize {
        match self {
            Self::None | Self::Mtft => len,
            Self::Bwt => len.saturating_sub(PRIMARY_INDEX_SIZE),
            // A run and its count byte expand to at most MAX_RUN bytes
            Self::Rlt => {
                let group = RUN_THRESHOLD + 1;
                (len / group).saturating_mul(MAX_RUN) + len % group
            }
        }
    }
}

impl fmt::Display for TransformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransformType {
    type Err = OxiBlockError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Parse a `+`-separated chain of transform names.
///
/// An empty string is the empty chain. Blank segments (as in `BWT++RLT`)
/// are rejected.
pub fn parse_chain(chain: &str) -> Result<Vec<TransformType>> {
    let chain = chain.trim();
    if chain.is_empty() {
        return Ok(Vec::new());
    }

    let types = chain
        .split(CHAIN_SEPARATOR)
        .map(|name| TransformType::from_name(name.trim()))
        .collect::<Result<Vec<_>>>()?;

    if types.len() > MAX_STEPS {
        return Err(OxiBlockError::invalid_param(
            "transforms",
            format!("chain '{chain}' has {} steps, at most {MAX_STEPS} allowed", types.len()),
        ));
    }
    Ok(types)
}

/// Canonical name of a chain; `NONE` for the empty chain.
pub fn chain_name(types: &[TransformType]) -> String {
    if types.is_empty() {
        return TransformType::None.name().to_string();
    }
    types
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join("+")
}

/// Build a sequence running `types` in order.
pub fn new_sequence(types: &[TransformType]) -> Result<TransformSequence<u8>> {
    let steps = types
        .iter()
        .map(|t| t.new_function() as Box<dyn Function<u8>>)
        .collect();
    TransformSequence::new(steps)
}
