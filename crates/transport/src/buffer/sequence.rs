use std::fmt;
use std::mem;
use std::sync::Arc;

use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;

use crate::buffer::BufferPool;
use crate::ensure;
use crate::protocol::TransportError;

/// Largest length a sequence may grow to, the allocation limit of a `Vec<u8>`.
const MAX_SEQUENCE_LEN: usize = isize::MAX.unsigned_abs();

/// Which way the bytes of a [`PooledSequence`] are flowing.
///
/// A call context writes its request body in the `Outbound` phase. Binding a
/// response resets the sequence and switches it to `Inbound`, where response
/// body bytes are materialized into the same memory.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BufferPhase {
    Outbound,
    Inbound,
}

/// A growable byte sequence backed by memory rented from a [`BufferPool`].
///
/// Bytes are written with a two step protocol: [`acquire_write_buffer`] hands
/// out writable memory, [`commit_write`] makes part of it readable. Committed
/// bytes are exposed through [`view`]. The front of the view can be released
/// early with [`release_prefix`]; [`len`] keeps counting released bytes so it
/// always equals the total number of bytes committed since the last reset.
///
/// [`acquire_write_buffer`]: PooledSequence::acquire_write_buffer
/// [`commit_write`]: PooledSequence::commit_write
/// [`view`]: PooledSequence::view
/// [`release_prefix`]: PooledSequence::release_prefix
/// [`len`]: PooledSequence::len
pub struct PooledSequence {
    pool: Arc<dyn BufferPool>,
    // buf[..committed] is readable, buf[committed..committed + acquired] is handed out for writing
    buf: BytesMut,
    committed: usize,
    acquired: usize,
    released: usize,
    phase: BufferPhase,
}

impl PooledSequence {
    pub fn new(pool: Arc<dyn BufferPool>, initial_capacity: usize) -> Self {
        let buf = pool.rent(initial_capacity);
        Self { pool, buf, committed: 0, acquired: 0, released: 0, phase: BufferPhase::Outbound }
    }

    pub fn phase(&self) -> BufferPhase {
        self.phase
    }

    pub(crate) fn ensure_phase(&self, expected: BufferPhase) -> Result<(), TransportError> {
        ensure!(self.phase == expected, TransportError::BufferPhase { expected, actual: self.phase });
        Ok(())
    }

    /// Returns writable memory of exactly `min_size` bytes, zero filled.
    ///
    /// A previous acquisition that was never committed is discarded.
    pub fn acquire_write_buffer(&mut self, min_size: usize) -> Result<&mut [u8], TransportError> {
        let new_len = self
            .committed
            .checked_add(min_size)
            .filter(|&len| len <= MAX_SEQUENCE_LEN)
            .ok_or(TransportError::AcquireOverflow { committed: self.committed, requested: min_size })?;

        self.buf.truncate(self.committed);
        self.buf.resize(new_len, 0);
        self.acquired = min_size;
        Ok(&mut self.buf[self.committed..])
    }

    /// Makes the first `size` bytes of the last acquired memory readable.
    pub fn commit_write(&mut self, size: usize) -> Result<(), TransportError> {
        ensure!(size <= self.acquired, TransportError::commit_overflow(size, self.acquired));

        self.committed += size;
        self.acquired = 0;
        self.buf.truncate(self.committed);
        Ok(())
    }

    /// Appends `data` to the committed bytes, discarding any pending acquisition.
    pub fn write(&mut self, data: &[u8]) {
        self.buf.truncate(self.committed);
        self.buf.extend_from_slice(data);
        self.committed += data.len();
        self.acquired = 0;
    }

    /// Committed bytes that have not been released.
    pub fn view(&self) -> &[u8] {
        &self.buf[..self.committed]
    }

    /// Total bytes committed since the last reset, released ones included.
    pub fn len(&self) -> usize {
        self.released + self.committed
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops up to `consumed` bytes from the front of the view.
    pub fn release_prefix(&mut self, consumed: usize) {
        let consumed = consumed.min(self.committed);
        if consumed == 0 {
            return;
        }

        self.buf.truncate(self.committed);
        self.buf.advance(consumed);
        self.committed -= consumed;
        self.released += consumed;
        self.acquired = 0;
        trace!(consumed, released = self.released, "released consumed bytes");
    }

    /// Moves the committed bytes out as an immutable `Bytes`, leaving the
    /// sequence empty. The spare capacity stays with the sequence.
    pub fn take_committed(&mut self) -> Bytes {
        self.buf.truncate(self.committed);
        let bytes = self.buf.split_to(self.committed).freeze();
        self.committed = 0;
        self.acquired = 0;
        self.released = 0;
        bytes
    }

    /// Clears all bytes and enters `phase`.
    pub fn reset(&mut self, phase: BufferPhase) {
        self.buf.clear();
        self.committed = 0;
        self.acquired = 0;
        self.released = 0;
        self.phase = phase;
    }
}

impl fmt::Debug for PooledSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledSequence")
            .field("phase", &self.phase)
            .field("len", &self.len())
            .field("committed", &self.committed)
            .field("acquired", &self.acquired)
            .finish_non_exhaustive()
    }
}

impl Drop for PooledSequence {
    fn drop(&mut self) {
        let buf = mem::take(&mut self.buf);
        self.pool.give_back(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SharedBufferPool;

    fn sequence() -> PooledSequence {
        PooledSequence::new(Arc::new(SharedBufferPool::default()), 16)
    }

    #[test]
    fn commit_grows_length_by_committed_size() {
        let mut seq = sequence();

        let memory = seq.acquire_write_buffer(8).unwrap();
        assert_eq!(memory.len(), 8);
        memory[..3].copy_from_slice(b"abc");
        seq.commit_write(3).unwrap();

        assert_eq!(seq.len(), 3);
        assert_eq!(seq.view(), b"abc");

        seq.acquire_write_buffer(4).unwrap().copy_from_slice(b"defg");
        seq.commit_write(4).unwrap();
        assert_eq!(seq.len(), 7);
        assert_eq!(seq.view(), b"abcdefg");
    }

    #[test]
    fn commit_more_than_acquired_is_rejected() {
        let mut seq = sequence();

        seq.acquire_write_buffer(2).unwrap();
        let err = seq.commit_write(3).unwrap_err();
        assert!(matches!(err, TransportError::CommitOverflow { committed: 3, acquired: 2 }));
        assert_eq!(seq.len(), 0);
    }

    #[test]
    fn commit_without_acquire_is_rejected() {
        let mut seq = sequence();
        seq.write(b"xy");
        assert!(matches!(seq.commit_write(1), Err(TransportError::CommitOverflow { committed: 1, acquired: 0 })));
        assert_eq!(seq.view(), b"xy");
    }

    #[test]
    fn uncommitted_bytes_are_not_visible() {
        let mut seq = sequence();
        seq.write(b"ok");
        seq.acquire_write_buffer(5).unwrap().copy_from_slice(b"dirty");
        assert_eq!(seq.view(), b"ok");

        seq.acquire_write_buffer(1).unwrap()[0] = b'!';
        seq.commit_write(1).unwrap();
        assert_eq!(seq.view(), b"ok!");
    }

    #[test]
    fn oversized_acquire_is_rejected() {
        let mut seq = sequence();
        seq.write(b"abc");

        let err = seq.acquire_write_buffer(usize::MAX - 1).unwrap_err();
        assert!(matches!(err, TransportError::AcquireOverflow { committed: 3, requested } if requested == usize::MAX - 1));

        let err = seq.acquire_write_buffer(MAX_SEQUENCE_LEN).unwrap_err();
        assert!(matches!(err, TransportError::AcquireOverflow { committed: 3, .. }));

        assert_eq!(seq.view(), b"abc");
        seq.acquire_write_buffer(2).unwrap().copy_from_slice(b"de");
        seq.commit_write(2).unwrap();
        assert_eq!(seq.view(), b"abcde");
    }

    #[test]
    fn release_prefix_keeps_cumulative_length() {
        let mut seq = sequence();
        seq.write(b"hello world");

        seq.release_prefix(6);
        assert_eq!(seq.view(), b"world");
        assert_eq!(seq.len(), 11);

        seq.release_prefix(100);
        assert!(seq.view().is_empty());
        assert_eq!(seq.len(), 11);

        seq.write(b"!");
        assert_eq!(seq.view(), b"!");
        assert_eq!(seq.len(), 12);
    }

    #[test]
    fn take_committed_seals_bytes() {
        let mut seq = sequence();
        seq.write(b"{\"a\":1}");

        let sealed = seq.take_committed();
        assert_eq!(&sealed[..], b"{\"a\":1}");
        assert!(seq.is_empty());

        seq.write(b"more");
        assert_eq!(&sealed[..], b"{\"a\":1}");
        assert_eq!(seq.view(), b"more");
    }

    #[test]
    fn reset_switches_phase() {
        let mut seq = sequence();
        seq.write(b"request");
        assert!(seq.ensure_phase(BufferPhase::Outbound).is_ok());

        seq.reset(BufferPhase::Inbound);
        assert!(seq.is_empty());
        assert_eq!(seq.phase(), BufferPhase::Inbound);
        assert!(matches!(
            seq.ensure_phase(BufferPhase::Outbound),
            Err(TransportError::BufferPhase { expected: BufferPhase::Outbound, actual: BufferPhase::Inbound })
        ));
    }

    #[test]
    fn drop_returns_memory_to_pool() {
        let pool = Arc::new(SharedBufferPool::default());
        {
            let mut seq = PooledSequence::new(Arc::clone(&pool) as Arc<dyn BufferPool>, 16);
            seq.write(b"data");
        }
        assert_eq!(pool.idle(), 1);
    }
}
