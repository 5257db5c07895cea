//! Parsed HTTP response head.
//!
//! Only the head: the body is never consumed while parsing, callers read it
//! separately through the connection so that tests stay in control of every
//! body byte (fixed-length reads, chunk-by-chunk reads, or none at all).

use crate::error::{ProbeError, Result};
use crate::http::headers::HeaderMap;

#[derive(Debug)]
pub struct Response {
    /// Protocol version as it appeared on the wire, e.g. `"1.1"`.
    pub version: String,
    pub status: u16,
    /// Reason phrase with trailing CR/LF stripped, nothing else.
    pub description: String,
    pub headers: HeaderMap,
}

/// Tokenizes a status line into `(version, status, description)`.
///
/// Deliberately literal, equivalent to the pattern
/// `HTTP/(\S+) (\S+) (.*)`: three mandatory parts, no RFC 7230 grammar.
/// Fuzzing tests depend on this staying inspectable and strict.
pub(crate) fn parse_status_line(line: &str) -> Result<(String, u16, String)> {
    let malformed = || ProbeError::Protocol(format!("malformed status line {line:?}"));

    let rest = line.strip_prefix("HTTP/").ok_or_else(malformed)?;
    let mut parts = rest.splitn(3, ' ');

    let version = parts.next().filter(|v| !v.is_empty()).ok_or_else(malformed)?;
    let status = parts.next().ok_or_else(malformed)?;
    let description = parts.next().ok_or_else(malformed)?;

    let status: u16 = status.parse().map_err(|_| malformed())?;
    let description = description.trim_end_matches(['\r', '\n']).to_string();

    Ok((version.to_string(), status, description))
}
