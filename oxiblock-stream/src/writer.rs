//! Compressing writer.

use crate::batch;
use crate::block::{BlockCodec, write_abort_marker, write_end_marker, write_frame};
use crate::cancel::CancellationToken;
use crate::config::StreamConfig;
use crate::header::StreamHeader;
use crate::listener::{Event, Listener};
use oxiblock_core::bitstream::{DefaultOutputBitStream, OutputBitStream};
use oxiblock_core::error::{OxiBlockError, Result};
use std::io::{self, Write};
use std::sync::Arc;

/// Writer that compresses everything written to it into an OxiBlock stream.
///
/// Input is cut into blocks of `block_size` bytes; with the `parallel`
/// feature up to `jobs` blocks are compressed at once. Blocks are emitted
/// in order, so the output does not depend on `jobs`.
///
/// [`finish`](Self::finish) writes the end-of-stream marker. Dropping an
/// unfinished writer finishes it, ignoring errors.
///
/// Once a block fails, the writer is failed for good: an abort marker is
/// written instead of further frames, and later writes and `finish` return an
/// error, so the output never decodes as a complete stream.
///
/// # Example
///
/// ```rust
/// use oxiblock_stream::{CompressedWriter, StreamConfig};
/// use std::io::Write;
///
/// let mut compressed = Vec::new();
/// let mut writer = CompressedWriter::new(&mut compressed, StreamConfig::default()).unwrap();
/// writer.write_all(b"hello hello hello hello").unwrap();
/// writer.finish().unwrap();
/// drop(writer);
/// assert_eq!(&compressed[..4], b"OXBK");
/// ```
pub struct CompressedWriter<W: Write> {
    obs: DefaultOutputBitStream<W>,
    header: StreamHeader,
    codec: BlockCodec,
    jobs: usize,
    /// Raw bytes of the batch being collected.
    pending: Vec<u8>,
    listeners: Vec<Arc<dyn Listener>>,
    cancel: Option<CancellationToken>,
    header_written: bool,
    blocks: u64,
    bytes: u64,
    finished: bool,
    /// Index of the block that failed.
    failed: Option<u64>,
}

impl<W: Write> CompressedWriter<W> {
    /// Create a writer. Fails if `config` does not validate.
    pub fn new(sink: W, config: StreamConfig) -> Result<Self> {
        config.validate()?;
        let header = StreamHeader::from_config(&config);
        let codec = BlockCodec::new(&header);
        Ok(Self {
            obs: DefaultOutputBitStream::new(sink),
            header,
            codec,
            jobs: config.jobs,
            pending: Vec::new(),
            listeners: Vec::new(),
            cancel: None,
            header_written: false,
            blocks: 0,
            bytes: 0,
            finished: false,
            failed: None,
        })
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

    /// Header written at the start of the stream.
    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    /// Number of blocks written so far.
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Number of compressed bits written so far.
    pub fn written(&self) -> u64 {
        self.obs.written()
    }

    fn batch_len(&self) -> usize {
        self.codec.block_size() * self.jobs
    }

    fn notify(&self, event: Event) {
        for listener in &self.listeners {
            listener.process_event(&event);
        }
    }

    fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Ok(());
        }
        self.header.write(&mut self.obs)?;
        self.header_written = true;
        self.notify(Event::StreamHeader {
            block_size: self.header.block_size,
            entropy: self.header.entropy,
            transforms: oxiblock_transform::chain_name(&self.header.transforms),
            checksum: self.header.checksum,
        });
        Ok(())
    }

    /// Whether a block failed, leaving the stream incomplete.
    pub fn is_failed(&self) -> bool {
        self.failed.is_some()
    }

    /// Mark the stream failed if `result` is an error.
    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() && self.failed.is_none() {
            self.failed = Some(self.blocks);
            if self.header_written && !self.obs.is_closed() {
                // The sink may be what failed; nothing more to report then
                let _ = write_abort_marker(&mut self.obs);
            }
        }
        result
    }

    fn check_failed(&self) -> Result<()> {
        match self.failed {
            Some(block) => Err(OxiBlockError::corrupted(
                "stream is incomplete after a failed block",
            )
            .in_block(block)),
            None => Ok(()),
        }
    }

    /// Compress and emit every pending byte.
    fn flush_pending(&mut self) -> Result<()> {
        let result = self.emit_pending();
        self.record(result)
    }

    fn emit_pending(&mut self) -> Result<()> {
        self.write_header()?;
        if self.pending.is_empty() {
            return Ok(());
        }

        let codec = &self.codec;
        let chunks: Vec<&[u8]> = self.pending.chunks(codec.block_size()).collect();
        let results = batch::process(&chunks, self.jobs, self.cancel.as_ref(), |chunk| {
            codec.encode(chunk)
        });
        self.pending.clear();

        for result in results {
            let block = result.map_err(|e| e.in_block(self.blocks))?;
            write_frame(&mut self.obs, &block.frame).map_err(|e| e.in_block(self.blocks))?;
            self.notify(Event::BlockEncoded {
                block: self.blocks,
                original_len: block.original_len,
                transformed_len: block.transformed_len,
                skip_flags: block.skip_flags,
                bits: block.frame.bits,
            });
            self.blocks += 1;
            self.bytes += block.original_len as u64;
        }
        Ok(())
    }

    /// Compress buffered input, write the end-of-stream marker and flush the
    /// sink. Further writes fail; calling `finish` again does nothing.
    ///
    /// Fails without writing the end marker if a block failed earlier.
    pub fn finish(&mut self) -> Result<()> {
        self.check_failed()?;
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        let result = self.finish_stream();
        self.record(result)
    }

    fn finish_stream(&mut self) -> Result<()> {
        self.emit_pending()?;
        write_end_marker(&mut self.obs)?;
        self.obs.close()?;
        self.notify(Event::StreamEnd {
            blocks: self.blocks,
            bytes: self.bytes,
        });
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        self.check_failed()?;
        if self.finished {
            return Err(OxiBlockError::invalid_param(
                "writer",
                "write after the stream was finished",
            ));
        }
        Ok(())
    }
}

impl<W: Write> Write for CompressedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_open()?;

        let batch_len = self.batch_len();
        let mut remaining = buf;
        while !remaining.is_empty() {
            let take = (batch_len - self.pending.len()).min(remaining.len());
            self.pending.extend_from_slice(&remaining[..take]);
            remaining = &remaining[take..];
            if self.pending.len() == batch_len {
                self.flush_pending()?;
            }
        }
        Ok(buf.len())
    }

    /// Blocks are emitted once full and by `finish`, so there is nothing to
    /// flush early.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Write> Drop for CompressedWriter<W> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}
