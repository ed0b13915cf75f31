//! Stream configuration.

use oxiblock_core::error::{OxiBlockError, Result};
use oxiblock_entropy::EntropyCodecType;
use oxiblock_transform::sequence::MAX_STEPS;
use oxiblock_transform::{TransformType, chain_name, parse_chain};

/// Smallest accepted block size (1 KiB).
pub const MIN_BLOCK_SIZE: usize = 1024;

/// Largest accepted block size (1 GiB).
pub const MAX_BLOCK_SIZE: usize = 1 << 30;

/// Block sizes must be a multiple of this.
pub const BLOCK_SIZE_ALIGN: usize = 16;

/// Default block size (4 MiB).
pub const DEFAULT_BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Largest accepted number of concurrent blocks.
pub const MAX_JOBS: usize = 64;

/// Compression parameters for one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamConfig {
    /// Raw bytes per block.
    pub block_size: usize,
    /// Entropy codec applied to every block.
    pub entropy: EntropyCodecType,
    /// Transforms applied to every block before entropy coding.
    pub transforms: Vec<TransformType>,
    /// Whether each block carries a CRC-32 of its raw bytes.
    pub checksum: bool,
    /// Number of blocks processed concurrently.
    /// Values above 1 only take effect with the `parallel` feature.
    pub jobs: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            entropy: EntropyCodecType::Paq,
            transforms: vec![TransformType::Bwt, TransformType::Mtft, TransformType::Rlt],
            checksum: true,
            jobs: 1,
        }
    }
}

impl StreamConfig {
    /// Stored blocks: no transform, no entropy coding.
    pub fn stored() -> Self {
        Self {
            entropy: EntropyCodecType::None,
            transforms: Vec::new(),
            ..Self::default()
        }
    }

    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the entropy codec.
    pub fn with_entropy(mut self, entropy: EntropyCodecType) -> Self {
        self.entropy = entropy;
        self
    }

    /// Set the transforms.
    pub fn with_transforms(mut self, transforms: Vec<TransformType>) -> Self {
        self.transforms = transforms;
        self
    }

    /// Set the transforms from a chain such as `BWT+MTFT+RLT`.
    pub fn with_transform_chain(mut self, chain: &str) -> Result<Self> {
        self.transforms = parse_chain(chain)?;
        Ok(self)
    }

    /// Enable or disable block checksums.
    pub fn with_checksum(mut self, checksum: bool) -> Self {
        self.checksum = checksum;
        self
    }

    /// Set the number of concurrent blocks.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Canonical name of the transform chain.
    pub fn transform_chain(&self) -> String {
        chain_name(&self.transforms)
    }

    /// Check every parameter against its limits.
    pub fn validate(&self) -> Result<()> {
        validate_block_size(self.block_size)?;

        if self.jobs == 0 || self.jobs > MAX_JOBS {
            return Err(OxiBlockError::invalid_param(
                "jobs",
                format!("{} is outside 1..={MAX_JOBS}", self.jobs),
            ));
        }

        if self.transforms.len() > MAX_STEPS {
            return Err(OxiBlockError::invalid_param(
                "transforms",
                format!(
                    "{} transforms given, at most {MAX_STEPS} allowed",
                    self.transforms.len()
                ),
            ));
        }

        Ok(())
    }
}

/// Check a block size against the container limits.
pub fn validate_block_size(block_size: usize) -> Result<()> {
    if block_size < MIN_BLOCK_SIZE {
        return Err(OxiBlockError::block_size(
            block_size as u64,
            format!("must be at least {MIN_BLOCK_SIZE} bytes"),
        ));
    }
    if block_size > MAX_BLOCK_SIZE {
        return Err(OxiBlockError::block_size(
            block_size as u64,
            format!("must be at most {MAX_BLOCK_SIZE} bytes"),
        ));
    }
    if block_size % BLOCK_SIZE_ALIGN != 0 {
        return Err(OxiBlockError::block_size(
            block_size as u64,
            format!("must be a multiple of {BLOCK_SIZE_ALIGN}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxiblock_core::ErrorKind;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.entropy, EntropyCodecType::Paq);
        assert_eq!(config.transform_chain(), "BWT+MTFT+RLT");
        assert!(config.checksum);
        assert_eq!(config.jobs, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stored_config() {
        let config = StreamConfig::stored();
        assert_eq!(config.entropy, EntropyCodecType::None);
        assert_eq!(config.transform_chain(), "NONE");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = StreamConfig::new()
            .with_block_size(64 * 1024)
            .with_entropy(EntropyCodecType::Order0)
            .with_transform_chain("mtft+rlt")
            .unwrap()
            .with_checksum(false)
            .with_jobs(4);
        assert_eq!(config.block_size, 65536);
        assert_eq!(config.transforms, [TransformType::Mtft, TransformType::Rlt]);
        assert!(!config.checksum);
        assert_eq!(config.jobs, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_block_size_limits() {
        for size in [0, 1008, MAX_BLOCK_SIZE + 16, 1030] {
            let err = StreamConfig::new()
                .with_block_size(size)
                .validate()
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BlockSize, "size {size}");
        }
        assert!(validate_block_size(MIN_BLOCK_SIZE).is_ok());
        assert!(validate_block_size(MAX_BLOCK_SIZE).is_ok());
    }

    #[test]
    fn test_invalid_jobs_and_transforms() {
        let err = StreamConfig::new().with_jobs(0).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParam);
        let err = StreamConfig::new().with_jobs(65).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParam);

        let err = StreamConfig::new()
            .with_transforms(vec![TransformType::Rlt; 9])
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParam);

        let err = StreamConfig::new()
            .with_transform_chain("BWT+LZP")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCodec);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serde() {
        let config = StreamConfig::new().with_entropy(EntropyCodecType::Order0);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"ORDER0\""));
        assert!(json.contains("\"BWT\""));
        let back: StreamConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
