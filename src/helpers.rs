//! Convenience request helpers.
//!
//! Thin glue over [`RawHttpConnection`] for the common case where a test just
//! wants "do a GET, give me status/headers/body". Anything that needs to
//! observe or inject wire-level details should use the connection directly.

use url::Url;

use crate::config::config;
use crate::error::{ProbeError, Result};
use crate::http::headers::HeaderMap;
use crate::net::connection::RawHttpConnection;

/// A fully loaded response: head plus body, connection already closed.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub description: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

pub fn get(url: &str) -> Result<HttpResponse> {
    request("GET", url, &[], None)
}

pub fn post(url: &str, body: &[u8]) -> Result<HttpResponse> {
    request("POST", url, &[], Some(body))
}

pub fn options(url: &str) -> Result<HttpResponse> {
    request("OPTIONS", url, &[], None)
}

/// Performs one request/response cycle over a fresh connection, reads the
/// whole body and closes.
pub fn request(
    method: &str,
    url: &str,
    headers: &[(&str, &str)],
    body: Option<&[u8]>,
) -> Result<HttpResponse> {
    let (mut conn, target) = open_for(url)?;
    let head = conn.request(method, &target, headers, body, "1.1")?;
    let body = read_body(&mut conn, &head.headers)?;
    conn.close()?;

    Ok(HttpResponse {
        status: head.status,
        description: head.description,
        headers: head.headers,
        body,
    })
}

/// A response whose head has been parsed while the body is still streaming.
///
/// The socket read timeout is disabled so slow endpoints (heartbeats,
/// long-poll) can be drained at their own pace.
pub struct StreamingResponse {
    conn: RawHttpConnection,
    pub status: u16,
    pub description: String,
    pub headers: HeaderMap,
}

impl StreamingResponse {
    /// Returns the next best-effort segment of the body, or `None` once the
    /// peer closes, at which point the connection is released.
    pub fn read(&mut self) -> Result<Option<Vec<u8>>> {
        let data = self.conn.read_some()?;
        if data.is_empty() {
            self.conn.close()?;
            return Ok(None);
        }
        Ok(Some(data))
    }

    /// Direct access to the underlying connection, for chunk-wise reads or
    /// close assertions mid-stream.
    pub fn conn(&mut self) -> &mut RawHttpConnection {
        &mut self.conn
    }

    pub fn close(mut self) -> Result<()> {
        self.conn.close()
    }
}

/// Like [`request`] but returns as soon as the head is parsed, leaving the
/// body on the socket.
pub fn request_streaming(
    method: &str,
    url: &str,
    headers: &[(&str, &str)],
    body: Option<&[u8]>,
) -> Result<StreamingResponse> {
    let (mut conn, target) = open_for(url)?;
    let head = conn.request(method, &target, headers, body, "1.1")?;
    conn.set_read_timeout(None)?;

    Ok(StreamingResponse {
        conn,
        status: head.status,
        description: head.description,
        headers: head.headers,
    })
}

fn open_for(url: &str) -> Result<(RawHttpConnection, String)> {
    let url = Url::parse(url).map_err(|e| ProbeError::Protocol(format!("bad url {url:?}: {e}")))?;
    if url.scheme() != "http" {
        return Err(ProbeError::Protocol(format!(
            "unsupported scheme {:?}",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .ok_or_else(|| ProbeError::Protocol(format!("url {url} has no host")))?;
    let port = url.port_or_known_default().unwrap_or(80);

    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target = format!("{target}?{query}");
    }

    let conn = RawHttpConnection::open(host, port, config().connect_timeout)?;
    Ok((conn, target))
}

fn read_body(conn: &mut RawHttpConnection, headers: &HeaderMap) -> Result<Vec<u8>> {
    let chunked = headers
        .get("Transfer-Encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"));

    if chunked {
        let mut body = Vec::new();
        loop {
            let chunk = conn.read_chunk()?;
            if chunk.is_empty() {
                break;
            }
            body.extend_from_slice(&chunk);
        }
        return Ok(body);
    }

    if let Some(length) = headers.get("Content-Length") {
        let length: usize = length
            .trim()
            .parse()
            .map_err(|_| ProbeError::Protocol(format!("bad Content-Length {length:?}")))?;
        if length == 0 {
            return Ok(Vec::new());
        }
        return conn.read(length);
    }

    // No framing header: drain until the peer closes.
    let mut body = Vec::new();
    loop {
        let part = conn.read_some()?;
        if part.is_empty() {
            break;
        }
        body.extend_from_slice(&part);
    }
    Ok(body)
}
