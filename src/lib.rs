//! wireprobe — a protocol-literal HTTP/1.1 and WebSocket test probe.
//!
//! This crate exists to let a test suite exercise a server's wire behavior,
//! including edge cases a regular HTTP client would normalize away: header
//! casing, chunked transfer framing, partial reads, premature closes,
//! deliberately malformed bytes.
//!
//! The core is [`RawHttpConnection`]: one TCP socket, blocking I/O, explicit
//! primitives to send a framed request, parse a response head, read body
//! bytes and assert a peer-initiated close. [`helpers`] and [`ws`] are thin
//! convenience layers on top for tests that do not care about the wire.
//!
//! Not a production client: no pooling, no TLS, no HTTP/2, no redirects.

pub mod config;
pub mod error;
pub mod helpers;
pub mod http;
pub mod net;
pub mod ws;

pub use error::{ProbeError, Result};
pub use http::headers::HeaderMap;
pub use http::response::Response;
pub use net::connection::RawHttpConnection;
