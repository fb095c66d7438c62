use std::io;
use std::io::ErrorKind;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::codec::body::PayloadEncoder;
use crate::codec::header::HeaderEncoder;
use crate::protocol::{Message, PayloadSize, RequestHead, SendError};

/// Encodes a request as a head followed by payload items.
///
/// The payload must end with [`PayloadItem::Eof`](crate::protocol::PayloadItem::Eof)
/// before the next head can be encoded.
#[derive(Debug)]
pub struct RequestEncoder {
    header_encoder: HeaderEncoder,
    payload_encoder: Option<PayloadEncoder>,
}

impl RequestEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for RequestEncoder {
    fn default() -> Self {
        Self { header_encoder: HeaderEncoder, payload_encoder: None }
    }
}

impl<D: Buf> Encoder<Message<(RequestHead, PayloadSize), D>> for RequestEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Message<(RequestHead, PayloadSize), D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Header((head, payload_size)) => {
                if self.payload_encoder.is_some() {
                    error!("expect payload item but receive request head");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                }

                let payload_encoder = PayloadEncoder::try_from(payload_size)?;
                self.header_encoder.encode((head, payload_size), dst)?;
                self.payload_encoder = Some(payload_encoder);
                Ok(())
            }

            Message::Payload(payload_item) => {
                let Some(payload_encoder) = &mut self.payload_encoder else {
                    error!("expect request head but receive payload item");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                };

                let result = payload_encoder.encode(payload_item, dst);
                if payload_encoder.is_finish() {
                    self.payload_encoder.take();
                }

                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::Request;

    use super::*;
    use crate::protocol::PayloadItem;

    #[test]
    fn head_then_body() {
        let mut encoder = RequestEncoder::new();
        let mut dst = BytesMut::new();
        let head = Request::post("/items").header("host", "example.test").body(()).unwrap();

        encoder.encode(Message::<_, Bytes>::Header((head, PayloadSize::Length(7))), &mut dst).unwrap();
        encoder.encode(Message::<(RequestHead, PayloadSize)>::from(Bytes::from_static(br#"{"a":1}"#)), &mut dst).unwrap();
        encoder.encode(Message::<(RequestHead, PayloadSize), Bytes>::Payload(PayloadItem::Eof), &mut dst).unwrap();

        assert_eq!(&dst[..], &b"POST /items HTTP/1.1\r\nhost: example.test\r\ncontent-length: 7\r\n\r\n{\"a\":1}"[..]);
        assert!(encoder.payload_encoder.is_none());
    }

    #[test]
    fn payload_before_head_is_rejected() {
        let mut encoder = RequestEncoder::new();
        let result = encoder.encode(Message::<(RequestHead, PayloadSize)>::from(Bytes::from_static(b"x")), &mut BytesMut::new());
        assert!(matches!(result, Err(SendError::Io { .. })));
    }

    #[test]
    fn unknown_length_is_rejected_before_writing() {
        let mut encoder = RequestEncoder::new();
        let mut dst = BytesMut::new();
        let head = Request::put("/blob").body(()).unwrap();

        let result = encoder.encode(Message::<_, Bytes>::Header((head, PayloadSize::Chunked)), &mut dst);
        assert!(matches!(result, Err(SendError::ChunkedUnsupported)));
        assert!(dst.is_empty());
    }
}
