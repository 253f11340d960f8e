//! Streaming bridge between index entries and payload bytes.
//!
//! Both streams are pull-based: a block moves only when the consumer asks
//! for the next one (reads) or hands the next chunk over (writes), so
//! backpressure needs no pause/resume protocol; demand is the protocol.
//! Dropping a stream cancels it: no further blocks are fetched, and an
//! unfinished write registers nothing.

use bytes::{Bytes, BytesMut};
use std::sync::Arc;

use tracing::debug;

use skiff_blobs::ContentStore;
use skiff_diff::WatchHub;
use skiff_index::FileIndex;
use skiff_types::{BlobRef, FileEntry, Version};

use crate::error::{DriveError, DriveResult};

/// A byte range within a payload, for partial reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ByteRange {
    /// Offset of the first byte to read.
    pub start: u64,
    /// Number of bytes to read; `None` reads to the end.
    pub length: Option<u64>,
}

impl ByteRange {
    pub fn new(start: u64, length: Option<u64>) -> Self {
        Self { start, length }
    }
}

/// Pull-based reader over a blob's block range.
///
/// Yields one block per [`next`](ReadStream::next) call. An error from the
/// content store is terminal: the stream yields it once and every later
/// call keeps failing rather than silently dropping data.
pub struct ReadStream {
    content: Option<Arc<dyn ContentStore>>,
    next_block: u64,
    end_block: u64,
    skip: u64,
    remaining: Option<u64>,
}

impl ReadStream {
    /// A stream over zero-byte content: yields nothing, successfully.
    pub(crate) fn empty() -> Self {
        Self {
            content: None,
            next_block: 0,
            end_block: 0,
            skip: 0,
            remaining: None,
        }
    }

    pub(crate) fn new(content: Arc<dyn ContentStore>, blob: BlobRef, range: ByteRange) -> Self {
        Self {
            content: Some(content),
            next_block: blob.block_offset,
            end_block: blob.end(),
            skip: range.start,
            remaining: range.length,
        }
    }

    /// The next chunk of payload bytes, or `None` at the end of the range.
    pub async fn next(&mut self) -> DriveResult<Option<Bytes>> {
        let Some(content) = self.content.as_ref() else {
            return Ok(None);
        };

        loop {
            if self.remaining == Some(0) || self.next_block >= self.end_block {
                return Ok(None);
            }

            let index = self.next_block;
            let mut block = content
                .block(index)
                .await?
                .ok_or(DriveError::MissingContent { block: index })?;
            self.next_block += 1;

            if self.skip > 0 {
                let len = block.len() as u64;
                if self.skip >= len {
                    self.skip -= len;
                    continue;
                }
                block = block.slice(self.skip as usize..);
                self.skip = 0;
            }

            if let Some(remaining) = self.remaining.as_mut() {
                if *remaining < block.len() as u64 {
                    block = block.slice(..*remaining as usize);
                }
                *remaining -= block.len() as u64;
            }

            if block.is_empty() {
                continue;
            }
            return Ok(Some(block));
        }
    }

    /// Drain the stream into one buffer.
    pub async fn collect(mut self) -> DriveResult<Bytes> {
        let mut out = BytesMut::new();
        while let Some(chunk) = self.next().await? {
            out.extend_from_slice(&chunk);
        }
        Ok(out.freeze())
    }
}

/// Options carried into the entry a write registers.
#[derive(Clone, Debug, Default)]
pub struct PutOptions {
    pub executable: bool,
    pub metadata: Option<serde_json::Value>,
}

/// Streaming writer: appends payload blocks, then registers the entry.
///
/// Bytes buffer up to the content store's block size; each full block is
/// appended as it fills, suspending the writer while the store cannot
/// accept more. The index entry is registered only by a fully successful
/// [`finish`](WriteStream::finish): an aborted or dropped stream registers
/// nothing, and blocks it already appended stay orphaned in the append-only
/// log.
pub struct WriteStream {
    index: FileIndex,
    content: Arc<dyn ContentStore>,
    hub: Arc<WatchHub>,
    path: String,
    options: PutOptions,
    buf: BytesMut,
    first_block: Option<u64>,
    blocks: u64,
    aborted: bool,
}

impl WriteStream {
    pub(crate) fn new(
        index: FileIndex,
        content: Arc<dyn ContentStore>,
        hub: Arc<WatchHub>,
        path: String,
        options: PutOptions,
    ) -> Self {
        Self {
            index,
            content,
            hub,
            path,
            options,
            buf: BytesMut::new(),
            first_block: None,
            blocks: 0,
            aborted: false,
        }
    }

    /// Accept the next chunk, appending any block-sized prefix of the
    /// buffered bytes to the content store.
    pub async fn write(&mut self, chunk: &[u8]) -> DriveResult<()> {
        if self.aborted {
            return Err(DriveError::StreamAborted);
        }
        self.buf.extend_from_slice(chunk);

        let block_size = self.content.block_size();
        while self.buf.len() >= block_size {
            let block = self.buf.split_to(block_size);
            self.append_block(&block).await?;
        }
        Ok(())
    }

    /// Flush the tail block and register the entry at the target path.
    ///
    /// Zero bytes written registers a null blob reference. Returns the index
    /// version holding the new entry.
    pub async fn finish(mut self) -> DriveResult<Version> {
        if self.aborted {
            return Err(DriveError::StreamAborted);
        }
        if !self.buf.is_empty() {
            let tail = self.buf.split();
            self.append_block(&tail).await?;
        }

        let blob = self
            .first_block
            .map(|block_offset| BlobRef::new(block_offset, self.blocks));
        let entry = FileEntry {
            executable: self.options.executable,
            linkname: None,
            blob,
            metadata: self.options.metadata.take(),
        };

        let version = self.index.put(&self.path, &entry).await?;
        self.hub.publish(&self.path, version);
        debug!(path = %self.path, %version, blocks = self.blocks, "write stream finished");
        Ok(version)
    }

    /// Drop the stream without registering anything.
    pub fn abort(self) {}

    /// Bytes currently buffered below one block.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    async fn append_block(&mut self, block: &[u8]) -> DriveResult<()> {
        match self.content.append(block).await {
            Ok(index) => {
                self.first_block.get_or_insert(index);
                self.blocks += 1;
                Ok(())
            }
            Err(err) => {
                // A failed append is terminal; nothing was registered.
                self.aborted = true;
                Err(err.into())
            }
        }
    }
}
