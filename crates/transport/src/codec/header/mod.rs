//! Head codecs: [`HeaderEncoder`] writes request heads, [`HeaderDecoder`]
//! parses response heads.

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeaderEncoder;
