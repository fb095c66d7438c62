//! Pooled byte buffers.
//!
//! - [`BufferPool`]: the allocator interface, shared by every call context
//! - [`SharedBufferPool`]: a bounded free list behind a mutex
//! - [`PooledSequence`]: the per-context byte sequence with the
//!   acquire/commit write protocol and the two [`BufferPhase`]s

mod pool;
mod sequence;

pub use pool::BufferPool;
pub use pool::SharedBufferPool;
pub use sequence::BufferPhase;
pub use sequence::PooledSequence;
