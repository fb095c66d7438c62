use std::borrow::Cow;

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Version};
use http_body::Body;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::buffer::{BufferPhase, PooledSequence};
use crate::protocol::{ContentBody, Stage, TransportError, WireResponse};

/// Wraps the wire response of one send attempt.
///
/// Headers are answered from the envelope first, then from the content
/// object. Body bytes are pulled into the call context's [`PooledSequence`]
/// only when asked for, and only as far as asked for.
#[derive(Debug)]
pub struct ResponseAdapter {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    content_headers: HeaderMap,
    body: ContentBody,
    eof: bool,
    // reason of the first failed body read, the body is unusable afterwards
    failure: Option<String>,
}

impl ResponseAdapter {
    pub fn new(response: WireResponse) -> Self {
        let (parts, content) = response.into_parts();
        let (content_headers, body) = content.into_parts();
        let eof = body.is_end_stream();
        Self { status: parts.status, version: parts.version, headers: parts.headers, content_headers, body, eof, failure: None }
    }

    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns true once the body reported its end.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Returns true once a body read failed. Every later read fails as well.
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Looks up a header by name in the envelope, then in the content headers.
    ///
    /// A single value comes back unchanged. Several values are joined with `,`
    /// and reduced to ASCII, every other character becoming `?`. Unknown or
    /// malformed names yield `None`.
    pub fn get_header(&self, name: &str) -> Option<Bytes> {
        let name = HeaderName::from_bytes(name.as_bytes()).ok()?;

        let mut values: Vec<&HeaderValue> = self.headers.get_all(&name).iter().collect();
        if values.is_empty() {
            values = self.content_headers.get_all(&name).iter().collect();
        }

        match values.as_slice() {
            [] => None,
            [single] => Some(verbatim(single)),
            many => Some(join_ascii(many)),
        }
    }

    /// Pulls body frames into `buffer` until it holds at least `min_length`
    /// bytes in total or the body ends.
    ///
    /// Frames are committed whole, so the buffer may end up longer than
    /// `min_length`. Bytes already committed are kept when a read fails, but
    /// the body is never read again: later calls report the same failure.
    pub async fn fill(
        &mut self,
        buffer: &mut PooledSequence,
        min_length: usize,
        cancel: &CancellationToken,
    ) -> Result<(), TransportError> {
        buffer.ensure_phase(BufferPhase::Inbound)?;
        if let Some(reason) = &self.failure {
            return Err(TransportError::failure(Stage::ReadBody, reason.clone()));
        }

        while buffer.len() < min_length && !self.eof {
            let frame = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(TransportError::cancelled(Stage::ReadBody)),
                frame = self.body.frame() => frame,
            };

            match frame {
                Some(Ok(frame)) => {
                    // trailers are not exposed
                    if let Ok(data) = frame.into_data() {
                        buffer.write(&data);
                        trace!(frame = data.len(), buffered = buffer.len(), "buffered response body frame");
                    }
                }
                Some(Err(e)) => {
                    warn!(buffered = buffer.len(), "failed to read response body: {}", e);
                    self.failure = Some(e.to_string());
                    return Err(TransportError::failure(Stage::ReadBody, e));
                }
                None => {
                    self.eof = true;
                    trace!(total = buffer.len(), "response body finished");
                }
            }
        }

        Ok(())
    }
}

fn verbatim(value: &HeaderValue) -> Bytes {
    match String::from_utf8_lossy(value.as_bytes()) {
        Cow::Borrowed(_) => Bytes::copy_from_slice(value.as_bytes()),
        Cow::Owned(replaced) => Bytes::from(replaced),
    }
}

fn join_ascii(values: &[&HeaderValue]) -> Bytes {
    let capacity = values.iter().map(|v| v.len() + 1).sum();
    let mut joined = BytesMut::with_capacity(capacity);

    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            joined.extend_from_slice(b",");
        }
        let decoded = String::from_utf8_lossy(value.as_bytes());
        joined.extend(decoded.chars().map(|ch| u8::try_from(ch).ok().filter(u8::is_ascii).unwrap_or(b'?')));
    }

    joined.freeze()
}
