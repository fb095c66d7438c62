//! Content objects carried by wire requests and responses.
//!
//! A wire message is split in two parts: the envelope (`http::Request` /
//! `http::Response` head) and the content object. The content object owns the
//! body and the headers that describe the body, such as `Content-Type` and
//! `Content-Length`. Keeping them apart mirrors clients that refuse content
//! headers on the envelope.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::{HeaderMap, Request, Response};
use http_body::{Body, Frame, SizeHint};
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;

use crate::protocol::BoxError;

/// A single-use request handed to the client. `None` means no content.
pub type WireRequest = Request<Option<WireContent>>;

/// A response received from the client.
pub type WireResponse = Response<WireContent>;

/// Body plus the headers that belong to it.
#[derive(Debug, Default)]
pub struct WireContent {
    headers: HeaderMap,
    body: ContentBody,
}

impl WireContent {
    pub fn new(body: ContentBody) -> Self {
        Self { headers: HeaderMap::new(), body }
    }

    pub fn with_headers(headers: HeaderMap, body: ContentBody) -> Self {
        Self { headers, body }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &ContentBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut ContentBody {
        &mut self.body
    }

    pub fn into_parts(self) -> (HeaderMap, ContentBody) {
        (self.headers, self.body)
    }
}

/// The body of a content object: either bytes already in memory or a stream.
pub struct ContentBody {
    inner: Kind,
}

enum Kind {
    Once(Option<Bytes>),
    Stream(BoxBody<Bytes, BoxError>),
}

impl ContentBody {
    pub fn empty() -> Self {
        Self { inner: Kind::Once(None) }
    }

    pub fn once(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        Self { inner: Kind::Once(Some(bytes)) }
    }

    pub fn stream<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + Sync + 'static,
        B::Error: Into<BoxError>,
    {
        Self { inner: Kind::Stream(body.map_err(Into::into).boxed()) }
    }

    /// Returns the bytes of an in-memory body, `None` for streams.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.inner {
            Kind::Once(Some(bytes)) => Some(bytes.as_ref()),
            Kind::Once(None) => Some(&[][..]),
            Kind::Stream(_) => None,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.inner, Kind::Stream(_))
    }
}

impl Default for ContentBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ContentBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Kind::Once(None) => f.write_str("ContentBody::Empty"),
            Kind::Once(Some(bytes)) => f.debug_tuple("ContentBody::Once").field(&bytes.len()).finish(),
            Kind::Stream(_) => f.write_str("ContentBody::Stream"),
        }
    }
}

impl From<Bytes> for ContentBody {
    fn from(bytes: Bytes) -> Self {
        Self::once(bytes)
    }
}

impl From<&'static str> for ContentBody {
    fn from(value: &'static str) -> Self {
        Self::once(Bytes::from_static(value.as_bytes()))
    }
}

impl Body for ContentBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().inner {
            Kind::Once(option_bytes) => Poll::Ready(option_bytes.take().map(|bytes| Ok(Frame::data(bytes)))),
            Kind::Stream(box_body) => Pin::new(box_body).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.inner {
            Kind::Once(option_bytes) => option_bytes.is_none(),
            Kind::Stream(box_body) => box_body.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.inner {
            Kind::Once(None) => SizeHint::with_exact(0),
            Kind::Once(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            Kind::Stream(box_body) => box_body.size_hint(),
        }
    }
}

/// An external body stream attached to a call context.
///
/// A stream can only be consumed once, but a request may be sent many times,
/// so the context keeps a source and opens a fresh body for every attempt.
pub trait BodySource: Send + Sync {
    fn open(&self) -> Result<ContentBody, BoxError>;
}

impl<F> BodySource for F
where
    F: Fn() -> ContentBody + Send + Sync,
{
    fn open(&self) -> Result<ContentBody, BoxError> {
        Ok(self())
    }
}
