//! Serializes request heads.
//!
//! The request line uses the origin form (`/path?query`). `Content-Length` is
//! rewritten from the payload size so the head never disagrees with the
//! bytes that follow it.

use std::io;
use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};
use http::{HeaderValue, Method, Version, header};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::protocol::{PayloadSize, RequestHead, SendError};

const INIT_HEADER_SIZE: usize = 1024;

#[derive(Debug)]
pub struct HeaderEncoder;

impl Encoder<(RequestHead, PayloadSize)> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (RequestHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut head, payload_size) = item;

        match payload_size {
            PayloadSize::Length(n) if n > 0 => {
                head.headers_mut().insert(header::CONTENT_LENGTH, n.into());
            }
            PayloadSize::Length(_) | PayloadSize::Empty => {
                // servers may refuse a POST or PUT without a length
                if matches!(*head.method(), Method::POST | Method::PUT) {
                    const ZERO_VALUE: HeaderValue = HeaderValue::from_static("0");
                    head.headers_mut().insert(header::CONTENT_LENGTH, ZERO_VALUE);
                } else {
                    head.headers_mut().remove(header::CONTENT_LENGTH);
                }
            }
            PayloadSize::Chunked | PayloadSize::UntilClose => return Err(SendError::ChunkedUnsupported),
        }

        let target = head.uri().path_and_query().map_or("/", |pq| pq.as_str());
        dst.reserve(INIT_HEADER_SIZE);
        match head.version() {
            Version::HTTP_11 => {
                write!(FastWrite(dst), "{} {} HTTP/1.1\r\n", head.method(), target)?;
            }
            v => {
                error!(http_version = ?v, "unsupported http version");
                return Err(io::Error::from(ErrorKind::Unsupported).into());
            }
        }

        for (name, value) in head.headers() {
            dst.put_slice(name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(value.as_ref());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use http::Request;

    use super::*;

    fn encode(head: RequestHead, size: PayloadSize) -> String {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode((head, size), &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap().replace("\r\n", "\n")
    }

    #[test]
    fn get_request_line_uses_origin_form() {
        let head = Request::get("http://example.test:8080/items?page=2")
            .header("host", "example.test:8080")
            .header("x-trace", "abc123")
            .body(())
            .unwrap();

        assert_eq!(
            encode(head, PayloadSize::Empty),
            "GET /items?page=2 HTTP/1.1\nhost: example.test:8080\nx-trace: abc123\n\n"
        );
    }

    #[test]
    fn content_length_follows_payload() {
        let head = Request::post("http://example.test").header("content-length", "99").body(()).unwrap();

        assert_eq!(encode(head, PayloadSize::Length(7)), "POST / HTTP/1.1\ncontent-length: 7\n\n");
    }

    #[test]
    fn empty_put_announces_zero() {
        let head = Request::put("/items/1").body(()).unwrap();
        assert!(encode(head, PayloadSize::Empty).contains("content-length: 0\n"));

        let head = Request::delete("/items/1").header("content-length", "0").body(()).unwrap();
        assert!(!encode(head, PayloadSize::Empty).contains("content-length"));
    }

    #[test]
    fn chunked_is_refused() {
        let head = Request::post("/upload").body(()).unwrap();
        let err = HeaderEncoder.encode((head, PayloadSize::Chunked), &mut BytesMut::new()).unwrap_err();
        assert!(matches!(err, SendError::ChunkedUnsupported));
    }
}
