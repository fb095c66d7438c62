//! Response side of the transport.

mod adapter;

pub use adapter::ResponseAdapter;
