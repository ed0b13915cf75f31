//! Error types for OxiBlock operations.
//!
//! Every failure that is not a programming-contract violation is reported as
//! an [`OxiBlockError`]. Each error maps to exactly one [`ErrorKind`], a fixed
//! numeric taxonomy shared by configuration, construction, I/O, format and
//! block-processing failures, so callers can branch on the *kind* of failure.
//!
//! Contract violations on the per-bit hot path (reading past the end of a bit
//! stream, out-of-range bit counts, using an entropy coder after disposal)
//! are not represented here: they panic.

use std::fmt;
use std::io;
use thiserror::Error;

/// Category an [`ErrorKind`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or invalid parameter, rejected before processing starts.
    Config,
    /// Creation of a compressor, decompressor, codec, bit stream or stream failed.
    Construction,
    /// Opening, reading, writing or creating a file or sink failed.
    Io,
    /// Invalid container, version mismatch or integrity failure.
    Format,
    /// A block could not be processed.
    Processing,
    /// Anything else.
    Unknown,
}

/// Fixed error taxonomy.
///
/// The numeric codes are stable and can be used as process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorKind {
    /// A required parameter is missing.
    MissingParam = 1,
    /// Block size outside the supported limits.
    BlockSize = 2,
    /// Unknown entropy codec or transform.
    InvalidCodec = 3,
    /// The compressor could not be created.
    CreateCompressor = 4,
    /// The decompressor could not be created.
    CreateDecompressor = 5,
    /// The output path is a directory.
    OutputIsDir = 6,
    /// The output file exists and overwriting was not allowed.
    OverwriteFile = 7,
    /// The output file could not be created.
    CreateFile = 8,
    /// A bit stream could not be created.
    CreateBitstream = 9,
    /// The input file could not be opened.
    OpenFile = 10,
    /// Reading from the source failed.
    ReadFile = 11,
    /// Writing to the sink failed.
    WriteFile = 12,
    /// A block could not be processed.
    ProcessBlock = 13,
    /// An entropy codec or transform could not be created.
    CreateCodec = 14,
    /// The input is not a valid stream.
    InvalidFile = 15,
    /// The stream was written with an unsupported version.
    StreamVersion = 16,
    /// A compressed stream could not be created.
    CreateStream = 17,
    /// A parameter has an invalid value.
    InvalidParam = 18,
    /// Integrity check failed.
    CrcCheck = 19,
    /// Unclassified failure.
    Unknown = 127,
}

impl ErrorKind {
    /// Numeric code of this kind.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a kind by its numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        let kind = match code {
            1 => Self::MissingParam,
            2 => Self::BlockSize,
            3 => Self::InvalidCodec,
            4 => Self::CreateCompressor,
            5 => Self::CreateDecompressor,
            6 => Self::OutputIsDir,
            7 => Self::OverwriteFile,
            8 => Self::CreateFile,
            9 => Self::CreateBitstream,
            10 => Self::OpenFile,
            11 => Self::ReadFile,
            12 => Self::WriteFile,
            13 => Self::ProcessBlock,
            14 => Self::CreateCodec,
            15 => Self::InvalidFile,
            16 => Self::StreamVersion,
            17 => Self::CreateStream,
            18 => Self::InvalidParam,
            19 => Self::CrcCheck,
            127 => Self::Unknown,
            _ => return None,
        };
        Some(kind)
    }

    /// Category of this kind.
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::MissingParam | Self::BlockSize | Self::InvalidParam | Self::InvalidCodec => {
                ErrorCategory::Config
            }
            Self::CreateCompressor
            | Self::CreateDecompressor
            | Self::CreateBitstream
            | Self::CreateCodec
            | Self::CreateStream => ErrorCategory::Construction,
            Self::OutputIsDir
            | Self::OverwriteFile
            | Self::CreateFile
            | Self::OpenFile
            | Self::ReadFile
            | Self::WriteFile => ErrorCategory::Io,
            Self::InvalidFile | Self::StreamVersion | Self::CrcCheck => ErrorCategory::Format,
            Self::ProcessBlock => ErrorCategory::Processing,
            Self::Unknown => ErrorCategory::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingParam => "missing parameter",
            Self::BlockSize => "invalid block size",
            Self::InvalidCodec => "invalid codec",
            Self::CreateCompressor => "cannot create compressor",
            Self::CreateDecompressor => "cannot create decompressor",
            Self::OutputIsDir => "output is a directory",
            Self::OverwriteFile => "output file exists",
            Self::CreateFile => "cannot create file",
            Self::CreateBitstream => "cannot create bit stream",
            Self::OpenFile => "cannot open file",
            Self::ReadFile => "read failure",
            Self::WriteFile => "write failure",
            Self::ProcessBlock => "block processing failure",
            Self::CreateCodec => "cannot create codec",
            Self::InvalidFile => "invalid stream",
            Self::StreamVersion => "stream version mismatch",
            Self::CreateStream => "cannot create stream",
            Self::InvalidParam => "invalid parameter",
            Self::CrcCheck => "CRC check failure",
            Self::Unknown => "unknown error",
        };
        f.write_str(text)
    }
}

/// The main error type for OxiBlock operations.
#[derive(Debug, Error)]
pub enum OxiBlockError {
    /// I/O error from the underlying source or sink.
    #[error("{kind} on {target}: {source}")]
    Io {
        /// One of `OpenFile`, `CreateFile`, `ReadFile`, `WriteFile`.
        kind: ErrorKind,
        /// What was being read or written.
        target: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A required parameter was not supplied.
    #[error("Missing parameter: {name}")]
    MissingParam {
        /// Parameter name.
        name: String,
    },

    /// A parameter has an invalid value.
    #[error("Invalid parameter {name}: {message}")]
    InvalidParam {
        /// Parameter name.
        name: String,
        /// Why the value was rejected.
        message: String,
    },

    /// Block size outside the supported limits.
    #[error("Invalid block size {size}: {message}")]
    InvalidBlockSize {
        /// Requested or declared block size.
        size: u64,
        /// Why the size was rejected.
        message: String,
    },

    /// Unknown codec or transform name or identifier.
    #[error("Invalid codec: {name}")]
    InvalidCodec {
        /// Name or identifier that was not recognized.
        name: String,
    },

    /// An object could not be constructed.
    #[error("Failed to create {component}: {message}")]
    Create {
        /// One of the construction kinds.
        kind: ErrorKind,
        /// What was being created.
        component: String,
        /// Why creation failed.
        message: String,
    },

    /// Output path is a directory.
    #[error("Output is a directory: {path}")]
    OutputIsDir {
        /// Offending path.
        path: String,
    },

    /// Output file exists and may not be overwritten.
    #[error("Output file already exists: {path}")]
    OverwriteFile {
        /// Offending path.
        path: String,
    },

    /// The input is not a valid stream.
    #[error("Invalid stream: {message}")]
    InvalidFile {
        /// Description of the problem.
        message: String,
    },

    /// A bit stream ended before the requested bits were available.
    #[error("Unexpected end of bit stream at bit {bit_position}")]
    EndOfStream {
        /// Number of bits consumed when the end was hit.
        bit_position: u64,
    },

    /// The stream was produced by an unsupported version.
    #[error("Stream version mismatch: expected {expected}, found {found}")]
    StreamVersion {
        /// Supported version.
        expected: u8,
        /// Version found in the header.
        found: u8,
    },

    /// CRC checksum mismatch.
    #[error("CRC mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// CRC stored in the stream.
        expected: u32,
        /// CRC computed over the decoded data.
        computed: u32,
    },

    /// Destination buffer too small for the operation.
    #[error("Buffer too small: need {needed} elements, have {available}")]
    BufferTooSmall {
        /// Number of elements needed.
        needed: usize,
        /// Number of elements available.
        available: usize,
    },

    /// Malformed block data.
    #[error("Corrupted block data: {message}")]
    CorruptedBlock {
        /// Description of the corruption.
        message: String,
    },

    /// Processing was cancelled between blocks.
    #[error("Operation cancelled")]
    Cancelled,

    /// Failure attributed to a specific block.
    #[error("Block {block}: {source}")]
    Block {
        /// Zero-based block index.
        block: u64,
        /// Underlying error.
        #[source]
        source: Box<OxiBlockError>,
    },

    /// Unclassified failure.
    #[error("{message}")]
    Unknown {
        /// Description.
        message: String,
    },
}

/// Result type alias for OxiBlock operations.
pub type Result<T> = std::result::Result<T, OxiBlockError>;

impl OxiBlockError {
    /// Error kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { kind, .. } | Self::Create { kind, .. } => *kind,
            Self::MissingParam { .. } => ErrorKind::MissingParam,
            Self::InvalidParam { .. } => ErrorKind::InvalidParam,
            Self::InvalidBlockSize { .. } => ErrorKind::BlockSize,
            Self::InvalidCodec { .. } => ErrorKind::InvalidCodec,
            Self::OutputIsDir { .. } => ErrorKind::OutputIsDir,
            Self::OverwriteFile { .. } => ErrorKind::OverwriteFile,
            Self::InvalidFile { .. } | Self::EndOfStream { .. } => ErrorKind::InvalidFile,
            Self::StreamVersion { .. } => ErrorKind::StreamVersion,
            Self::CrcMismatch { .. } => ErrorKind::CrcCheck,
            Self::BufferTooSmall { .. } | Self::CorruptedBlock { .. } | Self::Cancelled => {
                ErrorKind::ProcessBlock
            }
            Self::Block { source, .. } => source.kind(),
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Create a read error.
    pub fn read(target: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            kind: ErrorKind::ReadFile,
            target: target.into(),
            source,
        }
    }

    /// Create a write error.
    pub fn write(target: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            kind: ErrorKind::WriteFile,
            target: target.into(),
            source,
        }
    }

    /// Create an open-file error.
    pub fn open_file(target: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            kind: ErrorKind::OpenFile,
            target: target.into(),
            source,
        }
    }

    /// Create a create-file error.
    pub fn create_file(target: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            kind: ErrorKind::CreateFile,
            target: target.into(),
            source,
        }
    }

    /// Create a missing parameter error.
    pub fn missing_param(name: impl Into<String>) -> Self {
        Self::MissingParam { name: name.into() }
    }

    /// Create an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParam {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid block size error.
    pub fn block_size(size: u64, message: impl Into<String>) -> Self {
        Self::InvalidBlockSize {
            size,
            message: message.into(),
        }
    }

    /// Create an invalid codec error.
    pub fn invalid_codec(name: impl Into<String>) -> Self {
        Self::InvalidCodec { name: name.into() }
    }

    /// Create a construction error.
    ///
    /// `kind` should be one of the [`ErrorCategory::Construction`] kinds;
    /// anything else is reported as [`ErrorKind::Unknown`].
    pub fn create(
        kind: ErrorKind,
        component: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let kind = if kind.category() == ErrorCategory::Construction {
            kind
        } else {
            ErrorKind::Unknown
        };
        Self::Create {
            kind,
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an output-is-directory error.
    pub fn output_is_dir(path: impl Into<String>) -> Self {
        Self::OutputIsDir { path: path.into() }
    }

    /// Create an overwrite-refused error.
    pub fn overwrite_file(path: impl Into<String>) -> Self {
        Self::OverwriteFile { path: path.into() }
    }

    /// Create an invalid stream error.
    pub fn invalid_file(message: impl Into<String>) -> Self {
        Self::InvalidFile {
            message: message.into(),
        }
    }

    /// Create an end-of-stream error.
    pub fn end_of_stream(bit_position: u64) -> Self {
        Self::EndOfStream { bit_position }
    }

    /// Create a stream version error.
    pub fn stream_version(expected: u8, found: u8) -> Self {
        Self::StreamVersion { expected, found }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(expected: u32, computed: u32) -> Self {
        Self::CrcMismatch { expected, computed }
    }

    /// Create a buffer too small error.
    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        Self::BufferTooSmall { needed, available }
    }

    /// Create a corrupted block error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::CorruptedBlock {
            message: message.into(),
        }
    }

    /// Attach a block index to this error.
    pub fn in_block(self, block: u64) -> Self {
        match self {
            Self::Block { .. } => self,
            other => Self::Block {
                block,
                source: Box::new(other),
            },
        }
    }

    /// Recover an `OxiBlockError` carried inside an `io::Error`.
    ///
    /// Errors produced by the `Read`/`Write` adapters are wrapped into
    /// `io::Error`; this unwraps them again. Plain I/O errors become
    /// [`OxiBlockError::Io`] with the given fallback kind.
    pub fn from_io(err: io::Error, fallback: ErrorKind) -> Self {
        if err
            .get_ref()
            .is_some_and(|inner| inner.downcast_ref::<OxiBlockError>().is_some())
        {
            if let Some(inner) = err.into_inner() {
                if let Ok(inner) = inner.downcast::<OxiBlockError>() {
                    return *inner;
                }
            }
            return Self::Unknown {
                message: "unwrapping I/O error failed".into(),
            };
        }
        Self::Io {
            kind: fallback,
            target: "stream".into(),
            source: err,
        }
    }
}

impl From<OxiBlockError> for io::Error {
    fn from(err: OxiBlockError) -> Self {
        match err {
            OxiBlockError::Io { source, .. } => source,
            other => io::Error::other(other),
        }
    }
}
