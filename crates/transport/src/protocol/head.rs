use http::{Request, Response};

/// Head of an outgoing request: method, uri, version and every header that
/// goes on the wire, content headers included.
pub type RequestHead = Request<()>;

/// Head of a received response, before the content headers are split off.
pub type ResponseHead = Response<()>;
