use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;

use crate::codec::body::length_encoder::LengthEncoder;
use crate::protocol::{PayloadItem, PayloadSize, SendError};

/// Writes a request payload with the framing chosen for its head.
///
/// Requests are framed by `Content-Length` only; a payload of unknown size
/// would need chunked encoding, which this encoder refuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEncoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Length(LengthEncoder),
    NoBody,
}

impl PayloadEncoder {
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthEncoder::new(size)) }
    }

    pub fn is_finish(&self) -> bool {
        match &self.kind {
            Kind::Length(encoder) => encoder.is_finish(),
            Kind::NoBody => true,
        }
    }
}

impl TryFrom<PayloadSize> for PayloadEncoder {
    type Error = SendError;

    fn try_from(size: PayloadSize) -> Result<Self, Self::Error> {
        match size {
            PayloadSize::Length(0) | PayloadSize::Empty => Ok(PayloadEncoder::empty()),
            PayloadSize::Length(n) => Ok(PayloadEncoder::fix_length(n)),
            PayloadSize::Chunked | PayloadSize::UntilClose => Err(SendError::ChunkedUnsupported),
        }
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for PayloadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match &mut self.kind {
            Kind::Length(encoder) => encoder.encode(item, dst),
            Kind::NoBody => match item {
                PayloadItem::Chunk(bytes) if bytes.has_remaining() => {
                    Err(SendError::invalid_body("request announced no body but produced data"))
                }
                _ => Ok(()),
            },
        }
    }
}
