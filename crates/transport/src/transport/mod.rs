//! Sending call contexts through an HTTP client.
//!
//! - [`HttpClient`]: the client seam, one async `send` per wire request
//! - [`TransportDriver`]: the per-attempt state machine
//! - [`HttpTransport`]: creates contexts and runs drivers for the pipeline

mod client;
mod driver;
mod http_transport;

pub use client::HttpClient;
#[cfg(test)]
pub use client::MockHttpClient;
pub use driver::DriverPhase;
pub use driver::TransportDriver;
pub use http_transport::HttpTransport;
