use std::fmt;
use std::sync::{Mutex, PoisonError};

use bytes::BytesMut;
use tracing::trace;

use crate::config::TransportConfig;

/// A shared allocator of byte buffers.
///
/// Implementations must be safe to use from many call contexts at once.
pub trait BufferPool: Send + Sync + fmt::Debug {
    /// Hands out an empty buffer with at least `min_capacity` bytes of capacity.
    fn rent(&self, min_capacity: usize) -> BytesMut;

    /// Takes a buffer back. The pool may keep it for reuse or drop it.
    fn give_back(&self, buffer: BytesMut);
}

/// A mutex guarded free list of `BytesMut` buffers.
#[derive(Debug)]
pub struct SharedBufferPool {
    free: Mutex<Vec<BytesMut>>,
    default_capacity: usize,
    max_buffers: usize,
    max_capacity: usize,
}

impl SharedBufferPool {
    pub fn new(config: &TransportConfig) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(config.max_pooled_buffers())),
            default_capacity: config.initial_buffer_size(),
            max_buffers: config.max_pooled_buffers(),
            max_capacity: config.max_pooled_capacity(),
        }
    }

    /// Number of buffers currently parked in the free list.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for SharedBufferPool {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

impl BufferPool for SharedBufferPool {
    fn rent(&self, min_capacity: usize) -> BytesMut {
        let reused = {
            let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
            free.iter().position(|buffer| buffer.capacity() >= min_capacity).map(|index| free.swap_remove(index))
        };

        match reused {
            Some(buffer) => buffer,
            None => {
                trace!(min_capacity, "allocate new pooled buffer");
                BytesMut::with_capacity(min_capacity.max(self.default_capacity))
            }
        }
    }

    fn give_back(&self, mut buffer: BytesMut) {
        if buffer.capacity() == 0 || buffer.capacity() > self.max_capacity {
            return;
        }

        buffer.clear();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.max_buffers {
            free.push(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rent_reuses_returned_buffer() {
        let pool = SharedBufferPool::default();

        let mut buffer = pool.rent(16);
        assert!(buffer.capacity() >= 16);
        buffer.extend_from_slice(b"leftover");

        pool.give_back(buffer);
        assert_eq!(pool.idle(), 1);

        let buffer = pool.rent(16);
        assert!(buffer.is_empty());
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn oversized_buffers_are_not_kept() {
        let config = TransportConfig::default().with_max_pooled_capacity(64);
        let pool = SharedBufferPool::new(&config);

        pool.give_back(BytesMut::with_capacity(1024));
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn free_list_is_bounded() {
        let config = TransportConfig::default().with_max_pooled_buffers(1);
        let pool = SharedBufferPool::new(&config);

        pool.give_back(BytesMut::with_capacity(32));
        pool.give_back(BytesMut::with_capacity(32));
        assert_eq!(pool.idle(), 1);
    }
}
