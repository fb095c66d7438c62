//! An asynchronous HTTP transport adapter
//!
//! This crate sits between a transport agnostic request pipeline (retry,
//! logging and authentication stages) and a concrete HTTP client. It turns a
//! call context into a wire request, sends it, and exposes the wire response
//! back through the same context.
//!
//! # Features
//!
//! - Retry safe requests: every send builds a fresh, independent wire request
//! - Request bodies written into pooled buffers, or taken from a body stream
//! - Content headers kept apart from the message envelope
//! - Length gated, incremental reads of the response body
//! - Cancellation of sends and body reads through a `CancellationToken`
//! - A bundled HTTP/1.1 client over plain TCP
//!
//! # Example
//!
//! ```no_run
//! use micro_transport::client::Http1Client;
//! use micro_transport::protocol::RequestMethod;
//! use micro_transport::transport::HttpTransport;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::new(Http1Client::default());
//!
//!     let uri = "http://127.0.0.1:8080/items".parse()?;
//!     let mut ctx = transport.create_context(RequestMethod::Post, uri, CancellationToken::new());
//!     ctx.add_header("Content-Type", "application/json")?;
//!
//!     let body = br#"{"a":1}"#;
//!     ctx.acquire_write_buffer(body.len())?.copy_from_slice(body);
//!     ctx.commit_write(body.len())?;
//!
//!     transport.send(&mut ctx).await?;
//!
//!     println!("status: {}", ctx.status()?);
//!     let content = ctx.read_content(usize::MAX).await?;
//!     println!("body: {}", String::from_utf8_lossy(content));
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`buffer`]: the pooled byte sequence and its pool
//! - [`request`]: accumulates a request and materializes wire requests
//! - [`response`]: header lookup and incremental body reads on a wire response
//! - [`context`]: the per-exchange call context
//! - [`transport`]: the client seam, the per-attempt driver and the transport
//! - [`codec`] and [`client`]: the bundled HTTP/1.1 client
//! - [`config`]: settings of the transport and the client
//! - [`protocol`]: shared message, content and error types

pub mod buffer;
pub mod client;
pub mod codec;
pub mod config;
pub mod context;
pub mod protocol;
pub mod request;
pub mod response;
pub mod transport;

mod utils;
pub(crate) use utils::ensure;
