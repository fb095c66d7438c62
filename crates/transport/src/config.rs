//! Configuration of the transport and of the bundled HTTP/1.1 client.
//!
//! Both structs are plain values with `Default` and `with_*` setters; nothing
//! is read from files or the environment.

use std::time::Duration;

/// Initial capacity of a call context's pooled body buffer.
pub const DEFAULT_INITIAL_BUFFER_SIZE: usize = 4 * 1024;

/// Buffers kept in the shared free list.
pub const DEFAULT_MAX_POOLED_BUFFERS: usize = 64;

/// Buffers larger than this are dropped instead of pooled.
pub const DEFAULT_MAX_POOLED_CAPACITY: usize = 1024 * 1024;

/// Maximum size in bytes allowed for the whole response head.
pub const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;

/// Maximum number of headers allowed in a response.
pub const DEFAULT_MAX_HEADER_NUM: usize = 64;

/// Settings of [`HttpTransport`](crate::transport::HttpTransport) and the
/// buffers it hands to call contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    initial_buffer_size: usize,
    max_pooled_buffers: usize,
    max_pooled_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            initial_buffer_size: DEFAULT_INITIAL_BUFFER_SIZE,
            max_pooled_buffers: DEFAULT_MAX_POOLED_BUFFERS,
            max_pooled_capacity: DEFAULT_MAX_POOLED_CAPACITY,
        }
    }
}

impl TransportConfig {
    pub fn initial_buffer_size(&self) -> usize {
        self.initial_buffer_size
    }

    pub fn max_pooled_buffers(&self) -> usize {
        self.max_pooled_buffers
    }

    pub fn max_pooled_capacity(&self) -> usize {
        self.max_pooled_capacity
    }

    #[must_use]
    pub fn with_initial_buffer_size(mut self, size: usize) -> Self {
        self.initial_buffer_size = size;
        self
    }

    #[must_use]
    pub fn with_max_pooled_buffers(mut self, count: usize) -> Self {
        self.max_pooled_buffers = count;
        self
    }

    #[must_use]
    pub fn with_max_pooled_capacity(mut self, capacity: usize) -> Self {
        self.max_pooled_capacity = capacity;
        self
    }
}

/// Settings of [`Http1Client`](crate::client::Http1Client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    connect_timeout: Duration,
    read_buffer_capacity: usize,
    max_header_bytes: usize,
    max_header_num: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_buffer_capacity: 8 * 1024,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_header_num: DEFAULT_MAX_HEADER_NUM,
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn read_buffer_capacity(&self) -> usize {
        self.read_buffer_capacity
    }

    pub fn max_header_bytes(&self) -> usize {
        self.max_header_bytes
    }

    pub fn max_header_num(&self) -> usize {
        self.max_header_num
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_read_buffer_capacity(mut self, capacity: usize) -> Self {
        self.read_buffer_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_max_header_bytes(mut self, max: usize) -> Self {
        self.max_header_bytes = max;
        self
    }

    /// Caps the header count; values above [`DEFAULT_MAX_HEADER_NUM`] are clamped
    /// because the decoder parses into a fixed size array.
    #[must_use]
    pub fn with_max_header_num(mut self, max: usize) -> Self {
        self.max_header_num = max.min(DEFAULT_MAX_HEADER_NUM);
        self
    }
}
