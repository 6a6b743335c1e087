use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_queue::SegQueue;
use serde::Serialize;

use crate::buffer::NativeBuffer;

/// A thread-safe pool of fixed-size [`NativeBuffer`]s.
///
/// Buffers are the only allocation the request hot path makes. The free list
/// is unbounded: if callers outpace releases the pool allocates more buffers
/// and never returns them to the system allocator, trading memory for
/// freedom from deadlock. Counters satisfy
/// `total == free + in_flight` whenever no acquire/release is mid-flight.
#[derive(Debug)]
pub struct BufferPool {
    free: SegQueue<NativeBuffer>,
    buffer_size: usize,
    total: AtomicU64,
    free_count: AtomicU64,
    allocations: AtomicU64,
}

/// Snapshot of the pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferPoolStats {
    pub total: u64,
    pub free: u64,
    pub allocations_count: u64,
}

impl BufferPool {
    /// Create a pool of `buffer_size`-byte buffers with `pre_alloc` buffers
    /// allocated up front.
    pub fn new(buffer_size: usize, pre_alloc: usize) -> Self {
        let pool = Self {
            free: SegQueue::new(),
            buffer_size,
            total: AtomicU64::new(pre_alloc as u64),
            free_count: AtomicU64::new(pre_alloc as u64),
            allocations: AtomicU64::new(pre_alloc as u64),
        };
        for _ in 0..pre_alloc {
            pool.free.push(NativeBuffer::new(buffer_size));
        }
        pool
    }

    /// Buffer capacity in bytes for every buffer in this pool.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Take a buffer from the free list, allocating a new one if the list is
    /// empty. The first byte is zeroed so the buffer reads as an empty
    /// C string until written.
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let mut buffer = match self.free.pop() {
            Some(buffer) => {
                self.free_count.fetch_sub(1, Ordering::AcqRel);
                buffer
            }
            None => {
                self.total.fetch_add(1, Ordering::AcqRel);
                self.allocations.fetch_add(1, Ordering::AcqRel);
                NativeBuffer::new(self.buffer_size)
            }
        };
        buffer.zero_first_byte();
        PooledBuffer {
            pool: Arc::clone(self),
            inner: ManuallyDrop::new(buffer),
        }
    }

    fn release(&self, buffer: NativeBuffer) {
        self.free.push(buffer);
        self.free_count.fetch_add(1, Ordering::AcqRel);
    }

    pub fn stats(&self) -> BufferPoolStats {
        BufferPoolStats {
            total: self.total.load(Ordering::Acquire),
            free: self.free_count.load(Ordering::Acquire),
            allocations_count: self.allocations.load(Ordering::Acquire),
        }
    }
}

/// A pooled [`NativeBuffer`] that returns itself to the pool on drop.
///
/// Release is tied to drop so every unwind path of an operation returns its
/// buffers; a buffer is owned exclusively by one in-flight operation between
/// acquire and release.
pub struct PooledBuffer {
    pool: Arc<BufferPool>,
    inner: ManuallyDrop<NativeBuffer>,
}

impl Deref for PooledBuffer {
    type Target = NativeBuffer;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        // SAFETY: inner is never accessed after this
        let buffer = unsafe { ManuallyDrop::take(&mut self.inner) };
        self.pool.release(buffer);
    }
}
