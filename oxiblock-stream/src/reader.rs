//! Decompressing reader.

use crate::batch;
use crate::block::{BlockCodec, BlockFrame, read_frame};
use crate::cancel::CancellationToken;
use crate::config::MAX_JOBS;
use crate::header::StreamHeader;
use crate::listener::{Event, Listener};
use oxiblock_core::bitstream::{DefaultInputBitStream, InputBitStream};
use oxiblock_core::error::{OxiBlockError, Result};
use oxiblock_transform::chain_name;
use std::io::{self, Read};
use std::sync::Arc;

/// Reader that decompresses an OxiBlock stream.
///
/// The header is read on first use. Blocks are decoded in batches of `jobs`
/// (in parallel with the `parallel` feature) and handed out in order.
///
/// # Example
///
/// ```rust
/// use oxiblock_stream::{CompressedReader, StreamConfig, compress};
/// use std::io::Read;
///
/// let compressed = compress(b"abcabcabcabc", &StreamConfig::default()).unwrap();
/// let mut reader = CompressedReader::new(compressed.as_slice());
/// let mut decoded = Vec::new();
/// reader.read_to_end(&mut decoded).unwrap();
/// assert_eq!(decoded, b"abcabcabcabc");
/// ```
pub struct CompressedReader<R: Read> {
    ibs: DefaultInputBitStream<R>,
    codec: Option<BlockCodec>,
    header: Option<StreamHeader>,
    jobs: usize,
    listeners: Vec<Arc<dyn Listener>>,
    cancel: Option<CancellationToken>,
    /// Decoded bytes not yet returned.
    output: Vec<u8>,
    position: usize,
    blocks: u64,
    bytes: u64,
    finished: bool,
}

impl<R: Read> CompressedReader<R> {
    /// Create a reader over `source`, decoding one block at a time.
    pub fn new(source: R) -> Self {
        Self {
            ibs: DefaultInputBitStream::new(source),
            codec: None,
            header: None,
            jobs: 1,
            listeners: Vec::new(),
            cancel: None,
            output: Vec::new(),
            position: 0,
            blocks: 0,
            bytes: 0,
            finished: false,
        }
    }

    /// Decode up to `jobs` blocks at once.
    pub fn with_jobs(mut self, jobs: usize) -> Result<Self> {
        if jobs == 0 || jobs > MAX_JOBS {
            return Err(OxiBlockError::invalid_param(
                "jobs",
                format!("{jobs} is outside 1..={MAX_JOBS}"),
            ));
        }
        self.jobs = jobs;
        Ok(self)
    }

    /// Register a listener for stream events.
    pub fn with_listener(mut self, listener: Arc<dyn Listener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Stop before the next block once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Number of blocks decoded so far.
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    fn notify(&self, event: Event) {
        for listener in &self.listeners {
            listener.process_event(&event);
        }
    }

    /// Stream header, read from the source if needed.
    pub fn header(&mut self) -> Result<&StreamHeader> {
        if self.header.is_none() {
            let header = StreamHeader::read(&mut self.ibs)?;
            self.notify(Event::StreamHeader {
                block_size: header.block_size,
                entropy: header.entropy,
                transforms: chain_name(&header.transforms),
                checksum: header.checksum,
            });
            self.codec = Some(BlockCodec::new(&header));
            self.header = Some(header);
        }
        self.header
            .as_ref()
            .ok_or_else(|| OxiBlockError::invalid_file("stream header missing"))
    }

    /// Decode the next batch of blocks into `output`. Returns `false` at the
    /// end of the stream.
    fn fill(&mut self) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }
        self.header()?;
        let codec = self
            .codec
            .clone()
            .ok_or_else(|| OxiBlockError::invalid_file("stream header missing"))?;

        let max_bits = codec.max_frame_bits();
        let mut frames: Vec<BlockFrame> = Vec::with_capacity(self.jobs);
        while frames.len() < self.jobs {
            let index = self.blocks + frames.len() as u64;
            match read_frame(&mut self.ibs, max_bits).map_err(|e| e.in_block(index))? {
                Some(frame) => frames.push(frame),
                None => {
                    self.finished = true;
                    break;
                }
            }
        }

        self.output.clear();
        self.position = 0;
        let results = batch::process(&frames, self.jobs, self.cancel.as_ref(), |frame| {
            codec.decode(frame)
        });

        for (frame, result) in frames.iter().zip(results) {
            let block = result.map_err(|e| e.in_block(self.blocks))?;
            self.output.extend_from_slice(&block.data);
            self.notify(Event::BlockDecoded {
                block: self.blocks,
                original_len: block.data.len(),
                transformed_len: block.transformed_len,
                bits: frame.bits,
            });
            self.blocks += 1;
            self.bytes += block.data.len() as u64;
        }

        if self.finished {
            self.ibs.close()?;
            self.notify(Event::StreamEnd {
                blocks: self.blocks,
                bytes: self.bytes,
            });
        }
        Ok(!frames.is_empty())
    }
}

impl<R: Read> Read for CompressedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.position == self.output.len() {
            if !self.fill()? {
                return Ok(0);
            }
        }

        let count = buf.len().min(self.output.len() - self.position);
        buf[..count].copy_from_slice(&self.output[self.position..self.position + count]);
        self.position += count;
        Ok(count)
    }
}
