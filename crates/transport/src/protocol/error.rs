use std::fmt;
use std::io;

use thiserror::Error;

use crate::buffer::BufferPhase;

/// Boxed error type used at the client seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The step of an exchange in which a failure happened.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Materializing the wire request from the call context
    Build,
    /// Handing the request to the client and waiting for the response head
    Send,
    /// Pulling response body bytes into the pooled buffer
    ReadBody,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Build => "build",
            Stage::Send => "send",
            Stage::ReadBody => "read body",
        };
        f.write_str(name)
    }
}

/// Errors surfaced to the pipeline by the transport.
///
/// No variant is retried inside this crate; the policy layer decides.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unsupported http method: {method}")]
    UnsupportedMethod { method: String },

    #[error("header {name} rejected: {reason}")]
    HeaderRejected { name: String, reason: String },

    #[error("failed to copy already validated header {name} into the wire request")]
    HeaderCopyFailed { name: String },

    #[error("request has both a buffered body and a body stream")]
    ConflictingContentSource,

    #[error("cancelled during {stage}")]
    Cancelled { stage: Stage },

    #[error("transport failure during {stage}: {source}")]
    TransportFailure {
        stage: Stage,
        #[source]
        source: BoxError,
    },

    #[error("call context was not created by the http transport")]
    IncompatibleContext,

    #[error("committed {committed} bytes but only {acquired} were acquired")]
    CommitOverflow { committed: usize, acquired: usize },

    #[error("cannot acquire {requested} more bytes after {committed} committed ones")]
    AcquireOverflow { committed: usize, requested: usize },

    #[error("body buffer is in the {actual:?} phase, expected {expected:?}")]
    BufferPhase { expected: BufferPhase, actual: BufferPhase },

    #[error("no response has been bound to the call context")]
    NotBound,
}

impl TransportError {
    pub fn header_rejected<N: ToString, R: ToString>(name: N, reason: R) -> Self {
        Self::HeaderRejected { name: name.to_string(), reason: reason.to_string() }
    }

    pub fn header_copy_failed<N: ToString>(name: N) -> Self {
        Self::HeaderCopyFailed { name: name.to_string() }
    }

    pub fn cancelled(stage: Stage) -> Self {
        Self::Cancelled { stage }
    }

    pub fn failure<E: Into<BoxError>>(stage: Stage, source: E) -> Self {
        Self::TransportFailure { stage, source: source.into() }
    }

    pub fn commit_overflow(committed: usize, acquired: usize) -> Self {
        Self::CommitOverflow { committed, acquired }
    }

    /// Returns true if the caller aborted the exchange, as opposed to a network fault.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Errors raised while decoding a response from the wire.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid http status")]
    InvalidStatus,

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Errors raised while writing a request to the wire.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("body of unknown length needs chunked transfer-encoding, which is not supported")]
    ChunkedUnsupported,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Top level error of the bundled HTTP/1.1 client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: SendError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: ParseError,
    },

    #[error("connect to {authority} failed: {source}")]
    Connect {
        authority: String,
        #[source]
        source: io::Error,
    },

    #[error("timed out connecting to {authority}")]
    ConnectTimeout { authority: String },

    #[error("unsupported uri: {reason}")]
    UnsupportedUri { reason: String },

    #[error("connection closed before the response head was received")]
    ConnectionClosed,
}

impl ClientError {
    pub fn unsupported_uri<S: ToString>(str: S) -> Self {
        Self::UnsupportedUri { reason: str.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn failure_keeps_source() {
        let error = TransportError::failure(Stage::Send, io::Error::from(io::ErrorKind::ConnectionRefused));
        assert!(!error.is_cancelled());
        assert!(error.to_string().starts_with("transport failure during send"));
        assert!(error.source().is_some());
    }

    #[test]
    fn cancelled_is_distinguished() {
        let error = TransportError::cancelled(Stage::ReadBody);
        assert!(error.is_cancelled());
        assert_eq!(error.to_string(), "cancelled during read body");
    }
}
