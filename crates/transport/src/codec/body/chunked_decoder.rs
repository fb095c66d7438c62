//! Decoder for `Transfer-Encoding: chunked` response bodies.
//!
//! Chunk extensions and trailer fields are skipped. Every size line, chunk and
//! trailer line must end with CRLF.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{ParseError, PayloadItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: State,
    chunk_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// First hex digit of the chunk size
    SizeStart,
    /// Further hex digits of the chunk size
    Size,
    /// Whitespace after the size
    SizeLws,
    /// Chunk extension, ignored
    Extension,
    /// LF ending the size line
    SizeLf,
    /// Chunk data
    Data,
    /// CR after the chunk data
    DataCr,
    /// LF after the chunk data
    DataLf,
    /// Start of a trailer line, or the final CR
    EndCr,
    /// Inside a trailer field, ignored
    Trailer,
    /// LF ending a trailer field
    TrailerLf,
    /// Final LF
    EndLf,
    /// Last chunk and trailers consumed
    Done,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: State::SizeStart, chunk_size: 0 }
    }

    /// Advances over one byte, or over a run of data bytes in the `Data` state.
    fn step(&mut self, src: &mut BytesMut) -> Result<(State, Option<Bytes>), ParseError> {
        if self.state == State::Data {
            let len = usize::try_from(self.chunk_size).map_or(src.len(), |size| size.min(src.len()));
            let data = src.split_to(len).freeze();
            self.chunk_size -= data.len() as u64;

            let next = if self.chunk_size == 0 { State::DataCr } else { State::Data };
            return Ok((next, Some(data)));
        }

        let byte = src.get_u8();
        let next = match (self.state, byte) {
            (State::SizeStart | State::Size, b) if b.is_ascii_hexdigit() => {
                let digit = u64::from(hex_value(b));
                self.chunk_size = self
                    .chunk_size
                    .checked_mul(16)
                    .and_then(|size| size.checked_add(digit))
                    .ok_or_else(|| ParseError::invalid_body("chunk size overflow"))?;
                State::Size
            }
            (State::Size | State::SizeLws, b'\t' | b' ') => State::SizeLws,
            (State::Size | State::SizeLws, b';') => State::Extension,
            (State::Size | State::SizeLws | State::Extension, b'\r') => State::SizeLf,
            (State::Extension, b'\n') => return Err(ParseError::invalid_body("chunk extension contains a bare LF")),
            (State::Extension, _) => State::Extension,
            (State::SizeLf, b'\n') if self.chunk_size == 0 => State::EndCr,
            (State::SizeLf, b'\n') => State::Data,
            (State::DataCr, b'\r') => State::DataLf,
            (State::DataLf, b'\n') => State::SizeStart,
            (State::EndCr, b'\r') => State::EndLf,
            (State::Trailer, b'\r') => State::TrailerLf,
            (State::EndCr | State::Trailer, _) => State::Trailer,
            (State::TrailerLf, b'\n') => State::EndCr,
            (State::EndLf, b'\n') => State::Done,
            (state, b) => {
                return Err(ParseError::invalid_body(format!("unexpected byte 0x{b:02x} in chunked body at {state:?}")));
            }
        };

        Ok((next, None))
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if self.state == State::Done {
                trace!("finished reading chunked body");
                return Ok(Some(PayloadItem::Eof));
            }

            if src.is_empty() {
                return Ok(None);
            }

            let (next, data) = self.step(src)?;
            self.state = next;

            if let Some(bytes) = data {
                trace!(len = bytes.len(), "read chunk data");
                return Ok(Some(PayloadItem::Chunk(bytes)));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None => Err(ParseError::invalid_body("connection closed inside a chunked body")),
        }
    }
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}
