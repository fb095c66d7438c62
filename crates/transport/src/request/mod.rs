//! Request side of the transport.
//!
//! [`RequestBuilder`] collects headers, the content header slots and the body
//! source of a call context, and copy-constructs a fresh wire request from
//! them on every send attempt.

mod builder;

pub use builder::RequestBuilder;
