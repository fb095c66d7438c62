use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, ResponseHead};

/// Decodes a response as a head followed by payload items, ending with
/// [`PayloadItem::Eof`].
///
/// Bodies delimited by the end of the connection are finished by
/// [`Decoder::decode_eof`], which `FramedRead` calls once the peer closed.
#[derive(Debug)]
pub struct ResponseDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl ResponseDecoder {
    pub fn new(header_decoder: HeaderDecoder) -> Self {
        Self { header_decoder, payload_decoder: None }
    }

    /// Body bytes still expected from the current response, when known.
    pub fn remaining(&self) -> Option<u64> {
        self.payload_decoder.as_ref().and_then(PayloadDecoder::remaining)
    }
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self::new(HeaderDecoder::default())
    }
}

impl ResponseDecoder {
    fn decode_payload(
        &mut self,
        src: &mut BytesMut,
        at_eof: bool,
    ) -> Result<Option<Message<(ResponseHead, PayloadSize)>>, ParseError> {
        let Some(payload_decoder) = &mut self.payload_decoder else {
            return Ok(None);
        };

        let item = if at_eof { payload_decoder.decode_eof(src)? } else { payload_decoder.decode(src)? };
        let message = match item {
            Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
            Some(item @ PayloadItem::Eof) => {
                self.payload_decoder.take();
                Some(Message::Payload(item))
            }
            None => None,
        };
        Ok(message)
    }
}

impl Decoder for ResponseDecoder {
    type Item = Message<(ResponseHead, PayloadSize)>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.payload_decoder.is_some() {
            return self.decode_payload(src, false);
        }

        let message = match self.header_decoder.decode(src)? {
            Some((head, payload_size)) => {
                self.payload_decoder = Some(payload_size.into());
                Some(Message::Header((head, payload_size)))
            }
            None => None,
        };

        Ok(message)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.payload_decoder.is_some() {
            return self.decode_payload(src, true);
        }

        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => Err(ParseError::invalid_header("connection closed inside the response head")),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;

    use super::*;

    fn collect(decoder: &mut ResponseDecoder, buf: &mut BytesMut) -> (Option<ResponseHead>, Vec<u8>, bool) {
        let mut head = None;
        let mut body = Vec::new();
        while let Some(message) = decoder.decode(buf).unwrap() {
            match message {
                Message::Header((h, _)) => head = Some(h),
                Message::Payload(PayloadItem::Chunk(bytes)) => body.extend_from_slice(&bytes),
                Message::Payload(PayloadItem::Eof) => return (head, body, true),
            }
        }
        (head, body, false)
    }

    #[test]
    fn length_delimited_body() {
        let mut buf = BytesMut::from("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");
        let mut decoder = ResponseDecoder::default();

        let (head, body, eof) = collect(&mut decoder, &mut buf);
        assert_eq!(head.unwrap().status(), StatusCode::OK);
        assert_eq!(body, b"hello");
        assert!(eof);
        assert_eq!(decoder.remaining(), None);
    }

    #[test]
    fn chunked_body() {
        let mut buf = BytesMut::from("HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n2\r\nde\r\n0\r\n\r\n");
        let (_, body, eof) = collect(&mut ResponseDecoder::default(), &mut buf);
        assert_eq!(body, b"abcde");
        assert!(eof);
    }

    #[test]
    fn body_until_close() {
        let mut buf = BytesMut::from("HTTP/1.0 200 OK\r\n\r\nstream");
        let mut decoder = ResponseDecoder::default();

        let (_, body, eof) = collect(&mut decoder, &mut buf);
        assert_eq!(body, b"stream");
        assert!(!eof);

        let last = decoder.decode_eof(&mut buf).unwrap().unwrap();
        assert!(matches!(last, Message::Payload(PayloadItem::Eof)));
    }

    #[test]
    fn truncated_head_on_close() {
        let mut buf = BytesMut::from("HTTP/1.1 200 OK\r\nConte");
        let err = ResponseDecoder::default().decode_eof(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeader { .. }));
    }

    #[test]
    fn remaining_tracks_length() {
        let mut buf = BytesMut::from("HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabcd");
        let mut decoder = ResponseDecoder::default();

        assert!(decoder.decode(&mut buf).unwrap().unwrap().is_header());
        assert_eq!(decoder.remaining(), Some(10));
        let chunk = decoder.decode(&mut buf).unwrap().unwrap();
        assert!(matches!(chunk, Message::Payload(PayloadItem::Chunk(ref b)) if b == &Bytes::from_static(b"abcd")));
        assert_eq!(decoder.remaining(), Some(6));
    }
}
