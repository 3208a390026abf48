//! HTTP transport layer.

mod http;

pub use http::{HttpTransport, TransportError};
