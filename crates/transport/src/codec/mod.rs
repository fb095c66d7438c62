//! HTTP/1.1 client codec.
//!
//! The codec works in the direction of a client: [`RequestEncoder`] writes a
//! request head and its body, [`ResponseDecoder`] reads a response head and
//! its body. Both exchange [`Message`](crate::protocol::Message) values and
//! are driven by `tokio_util`'s `FramedWrite` / `FramedRead`.
//!
//! # Limits
//!
//! - Response heads are limited in size and header count, see
//!   [`ClientConfig`](crate::config::ClientConfig)
//! - Request bodies are written with `Content-Length` only
//! - Only HTTP/1.0 and HTTP/1.1 responses are understood

mod body;
mod header;
mod request_encoder;
mod response_decoder;

pub use body::{PayloadDecoder, PayloadEncoder};
pub use header::{HeaderDecoder, HeaderEncoder};
pub use request_encoder::RequestEncoder;
pub use response_decoder::ResponseDecoder;
