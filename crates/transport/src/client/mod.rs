//! A small HTTP/1.1 client over plain TCP.
//!
//! [`Http1Client`] opens one connection per request and asks the server to
//! close it afterwards (`connection: close`). There is no pooling and no TLS:
//! only `http://` URIs are accepted. Request bodies must have a known size.
//!
//! Responses are handed back as soon as their head was read; the body is
//! streamed from the connection by [`ResponseBody`] while the caller reads it.

mod body;

pub use body::ResponseBody;

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::header::{CONNECTION, CONTENT_LENGTH};
use http::{HeaderMap, HeaderName, HeaderValue, Request, Response, Uri, Version, header};
use http_body::Body;
use http_body_util::BodyExt;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::codec::{HeaderDecoder, RequestEncoder, ResponseDecoder};
use crate::config::ClientConfig;
use crate::protocol::{
    BoxError, ClientError, ContentBody, Message, ParseError, PayloadItem, PayloadSize, RequestHead, SendError,
    WireContent, WireRequest, WireResponse,
};
use crate::transport::HttpClient;

type RequestMessage = Message<(RequestHead, PayloadSize), Bytes>;

/// Headers that describe the body and travel with the content object.
static CONTENT_HEADERS: [HeaderName; 10] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_ENCODING,
    header::CONTENT_LANGUAGE,
    header::CONTENT_LOCATION,
    header::CONTENT_RANGE,
    header::CONTENT_DISPOSITION,
    header::EXPIRES,
    header::LAST_MODIFIED,
    header::ALLOW,
];

#[derive(Debug, Clone, Default)]
pub struct Http1Client {
    config: ClientConfig,
}

impl Http1Client {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends `request` and waits for the response head.
    pub async fn execute(&self, request: WireRequest) -> Result<WireResponse, ClientError> {
        let authority = authority_of(request.uri())?;

        let stream = timeout(self.config.connect_timeout(), TcpStream::connect(authority.as_str()))
            .await
            .map_err(|_| ClientError::ConnectTimeout { authority: authority.clone() })?
            .map_err(|source| ClientError::Connect { authority: authority.clone(), source })?;
        stream.set_nodelay(true).map_err(SendError::io)?;
        debug!(%authority, "connected");

        let (reader, writer) = stream.into_split();
        let writer = self.write_request(writer, request).await?;

        let decoder = ResponseDecoder::new(HeaderDecoder::new(self.config.max_header_bytes(), self.config.max_header_num()));
        let mut framed_read = FramedRead::with_capacity(reader, decoder, self.config.read_buffer_capacity());

        let (head, payload_size) = match framed_read.next().await {
            Some(Ok(Message::Header(header))) => header,
            Some(Ok(Message::Payload(_))) => return Err(ParseError::invalid_body("received body before response head").into()),
            Some(Err(e)) => return Err(e.into()),
            None => return Err(ClientError::ConnectionClosed),
        };
        debug!(status = head.status().as_u16(), ?payload_size, "received response head");

        let (mut parts, ()) = head.into_parts();
        let content_headers = split_content_headers(&mut parts.headers);
        let body = if payload_size.is_empty() {
            ContentBody::empty()
        } else {
            ContentBody::stream(ResponseBody::new(framed_read, writer))
        };

        Ok(Response::from_parts(parts, WireContent::with_headers(content_headers, body)))
    }

    async fn write_request(&self, writer: OwnedWriteHalf, request: WireRequest) -> Result<OwnedWriteHalf, ClientError> {
        let (parts, content) = request.into_parts();
        let (content_headers, mut body) = content.map(WireContent::into_parts).unwrap_or_default();
        let payload_size = payload_size_of(&body, &content_headers)?;

        let mut head = Request::from_parts(parts, ());
        *head.version_mut() = Version::HTTP_11;
        head.headers_mut().extend(content_headers);
        if !head.headers().contains_key(CONNECTION) {
            head.headers_mut().insert(CONNECTION, HeaderValue::from_static("close"));
        }
        trace!(method = %head.method(), uri = %head.uri(), ?payload_size, "writing request");

        let mut framed_write = FramedWrite::new(writer, RequestEncoder::new());
        framed_write.feed(RequestMessage::Header((head, payload_size))).await?;

        while let Some(frame) = body.frame().await {
            let frame = frame.map_err(SendError::invalid_body)?;
            if let Ok(data) = frame.into_data() {
                framed_write.feed(RequestMessage::Payload(PayloadItem::Chunk(data))).await?;
            }
        }

        framed_write.feed(RequestMessage::Payload(PayloadItem::Eof)).await?;
        SinkExt::<RequestMessage>::flush(&mut framed_write).await?;

        Ok(framed_write.into_inner())
    }
}

#[async_trait]
impl HttpClient for Http1Client {
    async fn send(&self, request: WireRequest, cancel: &CancellationToken) -> Result<WireResponse, BoxError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(io::Error::new(io::ErrorKind::Interrupted, "request cancelled").into()),
            result = self.execute(request) => result.map_err(Into::into),
        }
    }
}

fn authority_of(uri: &Uri) -> Result<String, ClientError> {
    match uri.scheme_str() {
        Some("http") => {}
        Some(scheme) => return Err(ClientError::unsupported_uri(format!("scheme {scheme} is not supported"))),
        None => return Err(ClientError::unsupported_uri("uri has no scheme")),
    }

    let host = uri.host().ok_or_else(|| ClientError::unsupported_uri("uri has no host"))?;
    Ok(format!("{host}:{}", uri.port_u16().unwrap_or(80)))
}

fn payload_size_of(body: &ContentBody, content_headers: &HeaderMap) -> Result<PayloadSize, SendError> {
    if let Some(length) = body.size_hint().exact() {
        return Ok(if length == 0 { PayloadSize::Empty } else { PayloadSize::Length(length) });
    }

    let declared = content_headers.get(CONTENT_LENGTH).and_then(|value| value.to_str().ok()?.trim().parse::<u64>().ok());
    match declared {
        Some(length) => Ok(PayloadSize::Length(length)),
        None => Err(SendError::ChunkedUnsupported),
    }
}

/// Moves the headers describing the body out of `headers`.
pub fn split_content_headers(headers: &mut HeaderMap) -> HeaderMap {
    let mut content_headers = HeaderMap::new();
    for name in &CONTENT_HEADERS {
        if let header::Entry::Occupied(entry) = headers.entry(name) {
            let (name, values) = entry.remove_entry_mult();
            for value in values {
                content_headers.append(name.clone(), value);
            }
        }
    }
    content_headers
}

#[cfg(test)]
mod tests {
    use http::header::{CONTENT_TYPE, SET_COOKIE};

    use super::*;

    #[test]
    fn content_headers_are_split_off() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("5"));
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::ALLOW, HeaderValue::from_static("GET"));
        headers.append(header::ALLOW, HeaderValue::from_static("POST"));

        let content = split_content_headers(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(SET_COOKIE));
        assert_eq!(content.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(content.get_all(header::ALLOW).iter().count(), 2);
    }

    #[test]
    fn only_plain_http_is_supported() {
        assert_eq!(authority_of(&Uri::from_static("http://example.test/items")).unwrap(), "example.test:80");
        assert_eq!(authority_of(&Uri::from_static("http://127.0.0.1:8080/")).unwrap(), "127.0.0.1:8080");
        assert!(matches!(
            authority_of(&Uri::from_static("https://example.test/")),
            Err(ClientError::UnsupportedUri { .. })
        ));
        assert!(matches!(authority_of(&Uri::from_static("/relative")), Err(ClientError::UnsupportedUri { .. })));
    }

    #[test]
    fn payload_size_prefers_exact_hint() {
        let empty = HeaderMap::new();
        assert_eq!(payload_size_of(&ContentBody::from("abc"), &empty).unwrap(), PayloadSize::Length(3));
        assert_eq!(payload_size_of(&ContentBody::empty(), &empty).unwrap(), PayloadSize::Empty);
    }

    #[tokio::test]
    async fn https_fails_without_connecting() {
        let request = Request::get("https://example.test/").body(None).unwrap();
        let err = Http1Client::default().execute(request).await.unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedUri { .. }));
    }
}
