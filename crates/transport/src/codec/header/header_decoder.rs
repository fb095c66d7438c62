//! Parses response heads.
//!
//! Parsing is done by `httparse` against the read buffer. The byte ranges of
//! header names and values are recorded first, then the head bytes are split
//! off and frozen so values share the buffer instead of being copied.
//!
//! Interim `1xx` responses are consumed and skipped; the decoder only yields
//! the final response head together with the payload framing it announces.

use bytes::BytesMut;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderName, HeaderValue, Response, StatusCode, Version};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::{debug, trace};

use crate::config::DEFAULT_MAX_HEADER_NUM;
use crate::ensure;
use crate::protocol::{ParseError, PayloadSize, ResponseHead};

/// Decoder for HTTP/1.x response heads.
#[derive(Debug, Clone)]
pub struct HeaderDecoder {
    max_header_bytes: usize,
    max_header_num: usize,
}

impl HeaderDecoder {
    pub fn new(max_header_bytes: usize, max_header_num: usize) -> Self {
        Self { max_header_bytes, max_header_num: max_header_num.min(DEFAULT_MAX_HEADER_NUM) }
    }

    fn decode_once(&self, src: &mut BytesMut) -> Result<Option<(ResponseHead, PayloadSize)>, ParseError> {
        let mut headers = [httparse::EMPTY_HEADER; DEFAULT_MAX_HEADER_NUM];
        let mut resp = httparse::Response::new(&mut headers[..self.max_header_num]);

        let parsed = resp.parse(src).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(self.max_header_num),
            Error::Version => ParseError::InvalidVersion(None),
            Error::Status => ParseError::InvalidStatus,
            e => ParseError::invalid_header(e.to_string()),
        })?;

        let head_len = match parsed {
            Status::Complete(head_len) => head_len,
            Status::Partial => {
                ensure!(
                    src.len() <= self.max_header_bytes,
                    ParseError::too_large_header(src.len(), self.max_header_bytes)
                );
                return Ok(None);
            }
        };

        trace!(head_len, "parsed response head");
        ensure!(head_len <= self.max_header_bytes, ParseError::too_large_header(head_len, self.max_header_bytes));

        let version = match resp.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            v => return Err(ParseError::InvalidVersion(v)),
        };
        let status = resp.code.and_then(|code| StatusCode::from_u16(code).ok()).ok_or(ParseError::InvalidStatus)?;

        let header_count = resp.headers.len();
        let mut indices = [HeaderIndex::EMPTY; DEFAULT_MAX_HEADER_NUM];
        HeaderIndex::record(src, resp.headers, &mut indices);

        let head_bytes = src.split_to(head_len).freeze();

        let mut head = Response::new(());
        *head.status_mut() = status;
        *head.version_mut() = version;

        let headers = head.headers_mut();
        headers.reserve(header_count);
        for index in &indices[..header_count] {
            let name = HeaderName::from_bytes(&head_bytes[index.name.0..index.name.1]).map_err(ParseError::invalid_header)?;
            let value = HeaderValue::from_maybe_shared(head_bytes.slice(index.value.0..index.value.1))
                .map_err(ParseError::invalid_header)?;
            headers.append(name, value);
        }

        let payload_size = parse_payload(&head)?;
        Ok(Some((head, payload_size)))
    }
}

impl Default for HeaderDecoder {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_HEADER_BYTES, DEFAULT_MAX_HEADER_NUM)
    }
}

impl Decoder for HeaderDecoder {
    type Item = (ResponseHead, PayloadSize);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.decode_once(src)? {
                Some((head, _)) if head.status().is_informational() => {
                    debug!(status = head.status().as_u16(), "skipped interim response");
                }
                other => return Ok(other),
            }
        }
    }
}

/// Byte ranges of one header's name and value inside the read buffer.
#[derive(Clone, Copy)]
struct HeaderIndex {
    name: (usize, usize),
    value: (usize, usize),
}

impl HeaderIndex {
    const EMPTY: HeaderIndex = HeaderIndex { name: (0, 0), value: (0, 0) };

    fn record(bytes: &[u8], headers: &[httparse::Header<'_>], indices: &mut [HeaderIndex]) {
        let base = bytes.as_ptr() as usize;
        for (header, index) in headers.iter().zip(indices.iter_mut()) {
            let name_start = header.name.as_ptr() as usize - base;
            index.name = (name_start, name_start + header.name.len());
            let value_start = header.value.as_ptr() as usize - base;
            index.value = (value_start, value_start + header.value.len());
        }
    }
}

/// Picks the payload framing of a response.
///
/// Responses to `HEAD` are not sent by this client, so only the status and
/// the framing headers matter.
fn parse_payload(head: &ResponseHead) -> Result<PayloadSize, ParseError> {
    let status = head.status();
    if status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
        return Ok(PayloadSize::Empty);
    }

    let te_header = head.headers().get(TRANSFER_ENCODING);
    let cl_header = head.headers().get(CONTENT_LENGTH);

    match (te_header, cl_header) {
        (Some(_), Some(_)) => {
            Err(ParseError::invalid_content_length("transfer-encoding and content-length both present in headers"))
        }
        (Some(te_value), None) if is_chunked(te_value) => Ok(PayloadSize::Chunked),
        (Some(_), None) | (None, None) => Ok(PayloadSize::UntilClose),
        (None, Some(cl_value)) => {
            let cl_str = cl_value.to_str().map_err(|_| ParseError::invalid_content_length("value can't to_str"))?;
            let length = cl_str
                .trim()
                .parse::<u64>()
                .map_err(|_| ParseError::invalid_content_length(format!("value {cl_str} is not u64")))?;
            Ok(if length == 0 { PayloadSize::Empty } else { PayloadSize::Length(length) })
        }
    }
}

/// Chunked must be the last transfer coding to delimit the body.
fn is_chunked(value: &HeaderValue) -> bool {
    value.as_bytes().rsplit(|b| *b == b',').next().is_some_and(|last| last.trim_ascii().eq_ignore_ascii_case(b"chunked"))
}
