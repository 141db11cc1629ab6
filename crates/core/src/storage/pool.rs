//! Reusable byte buffers for streamed uploads and downloads.
//!
//! Acquisition never waits: an empty pool allocates a fresh buffer. Buffers
//! go back to the pool when their guard drops, which covers early returns
//! and errors as well as normal stream close.

use std::io;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, ready};

use tokio::io::{AsyncRead, ReadBuf};

use super::config::BufferPoolConfig;
use super::types::ByteStream;

/// Pool of fixed-size byte buffers.
#[derive(Debug)]
pub struct BufferPool {
    buffer_size: usize,
    max_idle: usize,
    idle: Mutex<Vec<Vec<u8>>>,
    allocated: AtomicU64,
}

impl BufferPool {
    /// Creates a pool of `buffer_size`-byte buffers keeping at most
    /// `max_idle` of them for reuse.
    #[must_use]
    pub fn new(buffer_size: usize, max_idle: usize) -> Arc<Self> {
        Arc::new(Self {
            buffer_size: buffer_size.max(1),
            max_idle,
            idle: Mutex::new(Vec::with_capacity(max_idle)),
            allocated: AtomicU64::new(0),
        })
    }

    /// Creates a pool from configuration.
    #[must_use]
    pub fn from_config(config: &BufferPoolConfig) -> Arc<Self> {
        Self::new(config.buffer_size, config.max_idle)
    }

    /// Size of every buffer handed out.
    #[must_use]
    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Take a buffer, allocating one if none is idle.
    #[must_use]
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let buf = reused.unwrap_or_else(|| {
            self.allocated.fetch_add(1, Ordering::Relaxed);
            vec![0; self.buffer_size]
        });
        PooledBuffer {
            buf: Some(buf),
            pool: Arc::clone(self),
        }
    }

    /// Number of buffers waiting for reuse.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of buffers allocated over the pool's lifetime.
    #[must_use]
    pub fn allocated_count(&self) -> u64 {
        self.allocated.load(Ordering::Relaxed)
    }

    fn release(&self, buf: Vec<u8>) {
        if buf.len() != self.buffer_size {
            return;
        }
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(buf);
        }
    }
}

/// A buffer on loan from a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer {
    buf: Option<Vec<u8>>,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or_default()
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or_default()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}

/// Buffered reader whose buffer comes from a [`BufferPool`].
///
/// The buffer is returned when the reader is dropped.
pub struct PooledReader {
    inner: ByteStream,
    buf: PooledBuffer,
    pos: usize,
    filled: usize,
}

impl PooledReader {
    /// Wrap `inner`, reading through a pooled buffer.
    #[must_use]
    pub fn new(inner: ByteStream, pool: &Arc<BufferPool>) -> Self {
        Self {
            inner,
            buf: pool.acquire(),
            pos: 0,
            filled: 0,
        }
    }

    /// Wrap `inner` and box the result as a [`ByteStream`].
    #[must_use]
    pub fn boxed(inner: ByteStream, pool: &Arc<BufferPool>) -> ByteStream {
        Box::pin(Self::new(inner, pool))
    }
}

impl AsyncRead for PooledReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        out: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if this.pos == this.filled {
            let mut staging = ReadBuf::new(&mut this.buf);
            ready!(this.inner.as_mut().poll_read(cx, &mut staging))?;
            this.filled = staging.filled().len();
            this.pos = 0;
            if this.filled == 0 {
                return Poll::Ready(Ok(()));
            }
        }

        let n = out.remaining().min(this.filled - this.pos);
        out.put_slice(&this.buf[this.pos..this.pos + n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_acquire_allocates_when_empty() {
        let pool = BufferPool::new(8, 2);
        let a = pool.acquire();
        let b = pool.acquire();
        assert_eq!(a.len(), 8);
        assert_eq!(pool.allocated_count(), 2);
        assert_eq!(pool.idle_count(), 0);
        drop(a);
        drop(b);
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn test_released_buffers_are_reused() {
        let pool = BufferPool::new(8, 2);
        drop(pool.acquire());
        drop(pool.acquire());
        assert_eq!(pool.allocated_count(), 1);
    }

    #[test]
    fn test_idle_list_is_bounded() {
        let pool = BufferPool::new(8, 1);
        let held: Vec<_> = (0..3).map(|_| pool.acquire()).collect();
        drop(held);
        assert_eq!(pool.idle_count(), 1);
    }

    #[tokio::test]
    async fn test_pooled_reader_preserves_content() {
        let pool = BufferPool::new(4, 4);
        let data: Vec<u8> = (0..=255).collect();
        let inner: ByteStream = Box::pin(std::io::Cursor::new(data.clone()));

        let mut reader = PooledReader::new(inner, &pool);
        let mut small = [0u8; 3];
        let n = reader.read(&mut small).await.unwrap();
        assert_eq!(&small[..n], &data[..n]);

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await.unwrap();
        assert_eq!([&small[..n], &rest[..]].concat(), data);

        assert_eq!(pool.idle_count(), 0);
        drop(reader);
        assert_eq!(pool.idle_count(), 1);
    }

    #[tokio::test]
    async fn test_buffer_returned_on_error() {
        struct Failing;
        impl AsyncRead for Failing {
            fn poll_read(
                self: Pin<&mut Self>,
                _cx: &mut Context<'_>,
                _buf: &mut ReadBuf<'_>,
            ) -> Poll<io::Result<()>> {
                Poll::Ready(Err(io::Error::other("boom")))
            }
        }

        let pool = BufferPool::new(16, 4);
        {
            let mut reader = PooledReader::new(Box::pin(Failing), &pool);
            let mut out = [0u8; 4];
            assert!(reader.read(&mut out).await.is_err());
        }
        assert_eq!(pool.idle_count(), 1);
    }
}
