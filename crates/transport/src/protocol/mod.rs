//! Protocol types shared by the transport, the codec and the bundled client.
//!
//! - **Wire messages** ([`content`]): [`WireRequest`], [`WireResponse`] and the
//!   [`WireContent`] object that carries a body plus its content headers.
//! - **Methods** ([`method`]): the pipeline's [`RequestMethod`] and its wire mapping.
//! - **Heads** ([`head`]): [`RequestHead`] and [`ResponseHead`] exchanged with the codec.
//! - **Payload framing** ([`message`]): [`Message`], [`PayloadItem`] and
//!   [`PayloadSize`] as produced and consumed by the codec.
//! - **Errors** ([`error`]): [`TransportError`] for the pipeline, and
//!   [`ParseError`] / [`SendError`] / [`ClientError`] for the HTTP/1.1 client.

mod content;
pub use content::BodySource;
pub use content::ContentBody;
pub use content::WireContent;
pub use content::WireRequest;
pub use content::WireResponse;

mod method;
pub use method::RequestMethod;

mod head;
pub use head::RequestHead;
pub use head::ResponseHead;

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod error;
pub use error::BoxError;
pub use error::ClientError;
pub use error::ParseError;
pub use error::SendError;
pub use error::Stage;
pub use error::TransportError;
