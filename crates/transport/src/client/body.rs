use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::StreamExt;
use http_body::{Body, Frame, SizeHint};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::FramedRead;
use tracing::trace;

use crate::codec::ResponseDecoder;
use crate::protocol::{Message, ParseError, PayloadItem};

/// Body of a response read from a connection owned by the body itself.
///
/// The write half is kept so the connection stays fully open until the body
/// is dropped.
#[derive(Debug)]
pub struct ResponseBody {
    framed_read: FramedRead<OwnedReadHalf, ResponseDecoder>,
    _writer: OwnedWriteHalf,
    eof: bool,
}

impl ResponseBody {
    pub(crate) fn new(framed_read: FramedRead<OwnedReadHalf, ResponseDecoder>, writer: OwnedWriteHalf) -> Self {
        Self { framed_read, _writer: writer, eof: false }
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.eof {
            return Poll::Ready(None);
        }

        let frame = match ready!(this.framed_read.poll_next_unpin(cx)) {
            Some(Ok(Message::Payload(PayloadItem::Chunk(bytes)))) => Some(Ok(Frame::data(bytes))),
            Some(Ok(Message::Payload(PayloadItem::Eof))) => {
                trace!("response body finished");
                this.eof = true;
                None
            }
            Some(Ok(Message::Header(_))) => {
                this.eof = true;
                Some(Err(ParseError::invalid_body("received a response head inside the body")))
            }
            Some(Err(e)) => {
                this.eof = true;
                Some(Err(e))
            }
            None => {
                this.eof = true;
                Some(Err(ParseError::invalid_body("connection closed before the body ended")))
            }
        };

        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        self.eof
    }

    fn size_hint(&self) -> SizeHint {
        match self.framed_read.decoder().remaining() {
            Some(remaining) if !self.eof => SizeHint::with_exact(remaining),
            _ if self.eof => SizeHint::with_exact(0),
            _ => SizeHint::default(),
        }
    }
}
