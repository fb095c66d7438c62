//! Payload codecs.
//!
//! Responses are decoded by [`PayloadDecoder`], which handles `Content-Length`,
//! chunked and read-until-close bodies. Requests are encoded by
//! [`PayloadEncoder`], which only writes `Content-Length` framed bodies.

mod chunked_decoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
