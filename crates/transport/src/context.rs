//! The per-exchange call context.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::Uri;
use tokio_util::sync::CancellationToken;

use crate::buffer::{BufferPhase, PooledSequence};
use crate::protocol::{BodySource, RequestMethod, TransportError, WireRequest, WireResponse};
use crate::request::RequestBuilder;
use crate::response::ResponseAdapter;

/// A context handed around by the processing pipeline.
///
/// The pipeline only knows this trait; transports downcast it to their own
/// concrete context type.
pub trait PipelineContext: Send {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// State of one logical exchange, created by
/// [`HttpTransport::create_context`](crate::transport::HttpTransport::create_context).
///
/// Before a send the context collects the request: headers, body bytes through
/// [`acquire_write_buffer`](Self::acquire_write_buffer) and
/// [`commit_write`](Self::commit_write), or a body stream. After a send it
/// exposes the bound response. The same context is sent again on retry; every
/// send binds a new response in place of the previous one.
#[derive(Debug)]
pub struct CallContext {
    builder: RequestBuilder,
    buffer: PooledSequence,
    response: Option<ResponseAdapter>,
    cancel: CancellationToken,
    attempts: u32,
}

impl CallContext {
    pub(crate) fn new(method: RequestMethod, uri: Uri, buffer: PooledSequence, cancel: CancellationToken) -> Self {
        Self { builder: RequestBuilder::new(method, uri), buffer, response: None, cancel, attempts: 0 }
    }

    pub fn method(&self) -> RequestMethod {
        self.builder.method()
    }

    pub fn uri(&self) -> &Uri {
        self.builder.uri()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Number of responses bound so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn add_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        self.builder.add_header(name, value)
    }

    /// Returns `min_size` bytes of writable memory for the request body.
    pub fn acquire_write_buffer(&mut self, min_size: usize) -> Result<&mut [u8], TransportError> {
        self.buffer.ensure_phase(BufferPhase::Outbound)?;
        self.buffer.acquire_write_buffer(min_size)
    }

    pub fn commit_write(&mut self, size: usize) -> Result<(), TransportError> {
        self.buffer.ensure_phase(BufferPhase::Outbound)?;
        self.buffer.commit_write(size)
    }

    /// Attaches an external body stream, opened anew for every send.
    pub fn set_body_stream(&mut self, source: Arc<dyn BodySource>) {
        self.builder.set_body_stream(source);
    }

    /// Produces a fresh wire request from the accumulated state.
    pub fn build_wire_request(&mut self) -> Result<WireRequest, TransportError> {
        self.builder.build(&mut self.buffer)
    }

    /// The request body bytes written so far.
    pub fn request_body(&self) -> Bytes {
        self.builder.body_echo(&self.buffer)
    }

    /// Binds the response of a send attempt, switching the body buffer to
    /// the inbound phase.
    pub(crate) fn bind_response(&mut self, response: WireResponse) {
        // bytes written after the last build must still reach a retry
        self.builder.seal(&mut self.buffer);
        self.buffer.reset(BufferPhase::Inbound);
        self.response = Some(ResponseAdapter::new(response));
        self.attempts += 1;
    }

    pub fn is_bound(&self) -> bool {
        self.response.is_some()
    }

    pub fn status(&self) -> Result<u16, TransportError> {
        self.bound().map(ResponseAdapter::status)
    }

    /// See [`ResponseAdapter::get_header`].
    pub fn get_header(&self, name: &str) -> Result<Option<Bytes>, TransportError> {
        self.bound().map(|response| response.get_header(name))
    }

    /// Reads the response body until at least `min_length` bytes were
    /// buffered in total, or the body ended, and returns the unreleased part.
    pub async fn read_content(&mut self, min_length: usize) -> Result<&[u8], TransportError> {
        let response = self.response.as_mut().ok_or(TransportError::NotBound)?;
        response.fill(&mut self.buffer, min_length, &self.cancel).await?;
        Ok(self.buffer.view())
    }

    /// The response bytes buffered and not yet released.
    pub fn content(&self) -> &[u8] {
        match self.buffer.phase() {
            BufferPhase::Inbound => self.buffer.view(),
            BufferPhase::Outbound => &[],
        }
    }

    /// Total response bytes buffered, released ones included.
    pub fn content_length(&self) -> usize {
        match self.buffer.phase() {
            BufferPhase::Inbound => self.buffer.len(),
            BufferPhase::Outbound => 0,
        }
    }

    /// Releases the first `consumed` bytes of the buffered response body.
    pub fn dispose_content(&mut self, consumed: usize) -> Result<(), TransportError> {
        self.buffer.ensure_phase(BufferPhase::Inbound)?;
        self.buffer.release_prefix(consumed);
        Ok(())
    }

    fn bound(&self) -> Result<&ResponseAdapter, TransportError> {
        self.response.as_ref().ok_or(TransportError::NotBound)
    }
}

impl PipelineContext for CallContext {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl fmt::Display for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.builder.method(), self.builder.uri())
    }
}
