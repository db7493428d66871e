//! Dedicated writer task for chunked response bodies.
//!
//! Producers queue body buffers through a cloneable handle; one task owns the
//! transport, cuts buffers into chunk records and writes them.
//!
//! # Architecture
//!
//! ```text
//! Producer 1 ─┐
//! Producer 2 ─┼─► mpsc::Sender<Bytes> ─► Writer Task ─► size/data/CRLF ─► transport
//! Producer N ─┘
//! ```
//!
//! When every handle is dropped the task writes `0\r\n\r\n`, flushes and hands
//! the transport back through its `JoinHandle`.

use std::io::IoSlice;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{ChunkedError, Result};
use crate::framing::{validate_chunk_size, ChunkRecord, DEFAULT_MAX_CHUNK_SIZE, LAST_CHUNK};

/// Default maximum pending buffers before backpressure kicks in.
pub const DEFAULT_MAX_PENDING: usize = 1024;

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Default backpressure timeout.
pub const DEFAULT_BACKPRESSURE_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum queued buffers to batch in a single write operation.
const MAX_BATCH_SIZE: usize = 64;

/// Configuration for the writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Largest chunk written on the wire.
    pub max_chunk_size: usize,
    /// Maximum pending buffers before backpressure kicks in.
    pub max_pending: usize,
    /// Channel capacity for the buffer queue.
    pub channel_capacity: usize,
    /// Timeout when waiting for backpressure to clear.
    pub backpressure_timeout: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            max_pending: DEFAULT_MAX_PENDING,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            backpressure_timeout: DEFAULT_BACKPRESSURE_TIMEOUT,
        }
    }
}

/// Handle for queueing body bytes to the writer task.
///
/// This is cheaply cloneable. The body ends when the last clone is dropped.
#[derive(Clone)]
pub struct ChunkWriterHandle {
    tx: mpsc::Sender<Bytes>,
    pending: Arc<AtomicUsize>,
    max_pending: usize,
    timeout: Duration,
}

impl ChunkWriterHandle {
    fn new(
        tx: mpsc::Sender<Bytes>,
        pending: Arc<AtomicUsize>,
        max_pending: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            tx,
            pending,
            max_pending,
            timeout,
        }
    }

    /// Queue body bytes.
    ///
    /// Waits while backpressure is active, timing out after the configured
    /// duration. Empty buffers are ignored.
    pub async fn send(&self, data: Bytes) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        if self.pending.load(Ordering::Acquire) >= self.max_pending {
            self.wait_for_backpressure().await?;
        }

        self.pending.fetch_add(1, Ordering::AcqRel);

        self.tx.send(data).await.map_err(|_| {
            self.pending.fetch_sub(1, Ordering::Release);
            ChunkedError::ConnectionClosed
        })
    }

    /// Queue body bytes without waiting for backpressure.
    ///
    /// Returns `Err(BackpressureTimeout)` immediately if at capacity.
    pub fn try_send(&self, data: Bytes) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        if self.pending.load(Ordering::Acquire) >= self.max_pending {
            return Err(ChunkedError::BackpressureTimeout);
        }

        self.pending.fetch_add(1, Ordering::AcqRel);

        self.tx.try_send(data).map_err(|e| {
            self.pending.fetch_sub(1, Ordering::Release);
            match e {
                mpsc::error::TrySendError::Full(_) => ChunkedError::BackpressureTimeout,
                mpsc::error::TrySendError::Closed(_) => ChunkedError::ConnectionClosed,
            }
        })
    }

    /// End the body from this handle's side.
    ///
    /// The terminal chunk is written once every clone has finished or dropped.
    pub fn finish(self) {
        drop(self);
    }

    async fn wait_for_backpressure(&self) -> Result<()> {
        let start = Instant::now();
        let check_interval = Duration::from_micros(100);

        loop {
            if self.pending.load(Ordering::Acquire) < self.max_pending {
                return Ok(());
            }

            if start.elapsed() > self.timeout {
                return Err(ChunkedError::BackpressureTimeout);
            }

            tokio::time::sleep(check_interval).await;
        }
    }

    /// Check if backpressure is currently active.
    #[inline]
    pub fn is_backpressure_active(&self) -> bool {
        self.pending.load(Ordering::Acquire) >= self.max_pending
    }

    /// Get current pending buffer count.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

/// Spawn the writer task and return a handle for queueing body bytes.
///
/// The `JoinHandle` resolves to the transport once the terminal chunk has been
/// flushed, or to the first write error.
///
/// # Errors
///
/// `InvalidArgument` if `config.max_chunk_size` is 0.
pub fn spawn_chunk_writer<W>(
    writer: W,
    config: WriterConfig,
) -> Result<(ChunkWriterHandle, JoinHandle<Result<W>>)>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    validate_chunk_size(config.max_chunk_size)?;

    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let pending = Arc::new(AtomicUsize::new(0));

    let handle = ChunkWriterHandle::new(
        tx,
        pending.clone(),
        config.max_pending,
        config.backpressure_timeout,
    );

    let task = tokio::spawn(writer_loop(rx, writer, pending, config.max_chunk_size));

    Ok((handle, task))
}

/// Spawn the writer task with default configuration.
pub fn spawn_chunk_writer_default<W>(
    writer: W,
) -> Result<(ChunkWriterHandle, JoinHandle<Result<W>>)>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    spawn_chunk_writer(writer, WriterConfig::default())
}

/// Main writer loop - receives buffers and writes them as chunk records.
async fn writer_loop<W>(
    mut rx: mpsc::Receiver<Bytes>,
    mut writer: W,
    pending: Arc<AtomicUsize>,
    max_chunk_size: usize,
) -> Result<W>
where
    W: AsyncWrite + Unpin,
{
    let mut body_len = 0usize;

    loop {
        let first = match rx.recv().await {
            Some(data) => data,
            None => break,
        };

        let mut batch = Vec::with_capacity(MAX_BATCH_SIZE);
        batch.push(first);

        while batch.len() < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(data) => batch.push(data),
                Err(_) => break,
            }
        }

        let batch_size = batch.len();
        let records = split_into_records(batch, max_chunk_size);
        body_len += records.iter().map(ChunkRecord::data_len).sum::<usize>();

        if let Err(e) = write_records(&mut writer, &records).await {
            tracing::error!("Chunked body write failed after {} bytes: {}", body_len, e);
            return Err(e);
        }

        pending.fetch_sub(batch_size, Ordering::Release);
    }

    writer.write_all(LAST_CHUNK).await?;
    writer.flush().await?;
    tracing::debug!("Chunked body complete ({} bytes)", body_len);

    Ok(writer)
}

/// Cut queued buffers into records of at most `max_chunk_size` bytes.
fn split_into_records(batch: Vec<Bytes>, max_chunk_size: usize) -> Vec<ChunkRecord> {
    let mut records = Vec::with_capacity(batch.len());
    for mut data in batch {
        while !data.is_empty() {
            let take = data.len().min(max_chunk_size);
            records.push(ChunkRecord::new(data.split_to(take)));
        }
    }
    records
}

/// Write records using scatter/gather I/O (write_vectored).
async fn write_records<W>(writer: &mut W, records: &[ChunkRecord]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if records.is_empty() {
        return Ok(());
    }

    let slices: Vec<IoSlice<'_>> = records.iter().flat_map(|r| r.io_slices()).collect();
    let total_size: usize = records.iter().map(ChunkRecord::encoded_len).sum();

    let mut total_written = writer.write_vectored(&slices).await?;
    if total_written == 0 {
        return Err(write_zero());
    }

    // Partial write: continue with remaining data
    while total_written < total_size {
        let remaining_slices = build_remaining_slices(records, total_written);
        if remaining_slices.is_empty() {
            break;
        }

        let written = writer.write_vectored(&remaining_slices).await?;
        if written == 0 {
            return Err(write_zero());
        }

        total_written += written;
    }

    writer.flush().await?;
    Ok(())
}

fn write_zero() -> ChunkedError {
    ChunkedError::Io(std::io::Error::new(
        std::io::ErrorKind::WriteZero,
        "write_vectored returned 0",
    ))
}

/// Build IoSlice array for remaining data after a partial write.
fn build_remaining_slices(records: &[ChunkRecord], skip_bytes: usize) -> Vec<IoSlice<'_>> {
    let mut slices = Vec::with_capacity(records.len() * 3);
    let mut offset = 0;

    for part in records.iter().flat_map(ChunkRecord::parts) {
        let end = offset + part.len();
        if skip_bytes < end {
            slices.push(IoSlice::new(&part[skip_bytes.saturating_sub(offset)..]));
        }
        offset = end;
    }

    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::frame_to_vec;
    use std::io::Cursor;
    use tokio::io::{duplex, AsyncReadExt};

    #[test]
    fn test_writer_config_default() {
        let config = WriterConfig::default();
        assert_eq!(config.max_chunk_size, DEFAULT_MAX_CHUNK_SIZE);
        assert_eq!(config.max_pending, DEFAULT_MAX_PENDING);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(config.backpressure_timeout, DEFAULT_BACKPRESSURE_TIMEOUT);
    }

    #[tokio::test]
    async fn test_spawn_rejects_zero_chunk_size() {
        let config = WriterConfig {
            max_chunk_size: 0,
            ..WriterConfig::default()
        };
        let result = spawn_chunk_writer(Vec::<u8>::new(), config);
        assert!(matches!(result, Err(ChunkedError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_single_buffer_body() {
        let (handle, task) = spawn_chunk_writer_default(Vec::new()).unwrap();

        handle.send(Bytes::from_static(b"hello")).await.unwrap();
        handle.finish();

        let out = task.await.unwrap().unwrap();
        assert_eq!(&out[..], b"5\r\nhello\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn test_empty_body_is_terminator_only() {
        let (handle, task) = spawn_chunk_writer_default(Vec::new()).unwrap();
        handle.send(Bytes::new()).await.unwrap();
        drop(handle);

        let out = task.await.unwrap().unwrap();
        assert_eq!(&out[..], b"0\r\n\r\n");
    }

    #[tokio::test]
    async fn test_large_buffer_split_by_chunk_size() {
        let config = WriterConfig {
            max_chunk_size: 1024,
            ..WriterConfig::default()
        };
        let (handle, task) = spawn_chunk_writer(Vec::new(), config).unwrap();

        let body = vec![0u8; 2048];
        handle.send(Bytes::from(body.clone())).await.unwrap();
        drop(handle);

        let out = task.await.unwrap().unwrap();
        assert_eq!(out, frame_to_vec(&body, 1024).unwrap());
    }

    #[tokio::test]
    async fn test_multiple_sends_keep_order() {
        let (handle, task) = spawn_chunk_writer_default(Vec::new()).unwrap();

        for part in ["first ", "second ", "third"] {
            handle.send(Bytes::from_static(part.as_bytes())).await.unwrap();
        }
        drop(handle);

        let out = task.await.unwrap().unwrap();
        assert_eq!(
            &out[..],
            b"6\r\nfirst \r\n7\r\nsecond \r\n5\r\nthird\r\n0\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn test_writer_over_duplex() {
        let (client, mut server) = duplex(4096);
        let (handle, task) = spawn_chunk_writer_default(client).unwrap();

        handle.send(Bytes::from_static(b"abc")).await.unwrap();
        drop(handle);
        let client = task.await.unwrap().unwrap();
        drop(client);

        let mut buf = Vec::new();
        server.read_to_end(&mut buf).await.unwrap();
        assert_eq!(&buf[..], b"3\r\nabc\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn test_cloned_handles_share_body() {
        let (handle, task) = spawn_chunk_writer_default(Vec::new()).unwrap();
        let other = handle.clone();

        handle.send(Bytes::from_static(b"a")).await.unwrap();
        drop(handle);
        other.send(Bytes::from_static(b"b")).await.unwrap();
        drop(other);

        let out = task.await.unwrap().unwrap();
        assert_eq!(&out[..], b"1\r\na\r\n1\r\nb\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn test_pending_count_starts_at_zero() {
        let config = WriterConfig {
            max_pending: 1000,
            channel_capacity: 100,
            backpressure_timeout: Duration::from_secs(1),
            ..WriterConfig::default()
        };
        let (handle, _task) = spawn_chunk_writer(Vec::new(), config).unwrap();

        assert_eq!(handle.pending_count(), 0);
        assert!(!handle.is_backpressure_active());
    }

    #[tokio::test]
    async fn test_try_send_at_capacity() {
        let (tx, _rx) = mpsc::channel::<Bytes>(10);
        let pending = Arc::new(AtomicUsize::new(100));

        let handle = ChunkWriterHandle::new(tx, pending, 100, Duration::from_secs(1));

        let result = handle.try_send(Bytes::from_static(b"x"));
        assert!(matches!(result, Err(ChunkedError::BackpressureTimeout)));
    }

    #[tokio::test]
    async fn test_send_after_task_gone() {
        let (tx, rx) = mpsc::channel::<Bytes>(10);
        drop(rx);
        let handle = ChunkWriterHandle::new(tx, Arc::new(AtomicUsize::new(0)), 10, Duration::from_secs(1));

        let result = handle.send(Bytes::from_static(b"x")).await;
        assert!(matches!(result, Err(ChunkedError::ConnectionClosed)));
        assert_eq!(handle.pending_count(), 0);
    }

    #[test]
    fn test_split_into_records() {
        let batch = vec![Bytes::from_static(b"abcdefg"), Bytes::from_static(b"hi")];
        let records = split_into_records(batch, 3);

        let sizes: Vec<usize> = records.iter().map(ChunkRecord::data_len).collect();
        assert_eq!(sizes, vec![3, 3, 1, 2]);
    }

    #[test]
    fn test_build_remaining_slices_no_skip() {
        let records = vec![ChunkRecord::new(Bytes::from_static(b"hello"))];

        let slices = build_remaining_slices(&records, 0);
        assert_eq!(slices.len(), 3); // size line + data + CRLF
    }

    #[test]
    fn test_build_remaining_slices_partial_size_line() {
        let records = vec![ChunkRecord::new(Bytes::from(vec![1u8; 0x400]))];

        // "400\r\n" is 5 bytes; skip 2 of them
        let slices = build_remaining_slices(&records, 2);
        assert_eq!(slices.len(), 3);
        assert_eq!(&slices[0][..], b"0\r\n");
        assert_eq!(slices[1].len(), 0x400);
    }

    #[test]
    fn test_build_remaining_slices_skip_into_data() {
        let records = vec![ChunkRecord::new(Bytes::from_static(b"hello"))];

        // skip "5\r\nhe"
        let slices = build_remaining_slices(&records, 5);
        assert_eq!(slices.len(), 2);
        assert_eq!(&slices[0][..], b"llo");
        assert_eq!(&slices[1][..], b"\r\n");
    }

    #[tokio::test]
    async fn test_write_records_multiple() {
        let mut buf = Cursor::new(Vec::new());

        let records: Vec<_> = (0..5)
            .map(|_| ChunkRecord::new(Bytes::from_static(b"abc")))
            .collect();

        write_records(&mut buf, &records).await.unwrap();

        let written = buf.into_inner();
        assert_eq!(written.len(), 5 * (3 + 3 + 2));
        assert!(written.starts_with(b"3\r\nabc\r\n3\r\nabc\r\n"));
    }
}
