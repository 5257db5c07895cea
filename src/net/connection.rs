//! Raw HTTP/1.1 client over a plain TCP socket.
//!
//! This module implements the probe's only real machinery. It speaks
//! HTTP/1.1 directly on the byte stream:
//! - request line and header serialization, CRLF-terminated,
//! - status-line and header-block parsing,
//! - fixed-length and chunked body reads,
//! - closed-socket detection.
//!
//! No higher-level HTTP library sits in between, so nothing normalizes away
//! the details a protocol test wants to observe or inject: header casing,
//! malformed status lines, partial reads, premature closes.
//!
//! One instance owns one socket. Usage is strictly blocking request/response,
//! one operation at a time; callers that need concurrency serialize access
//! themselves.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, trace};

use crate::config::config;
use crate::error::{ProbeError, Result};
use crate::http::headers::HeaderMap;
use crate::http::response::{Response, parse_status_line};

/// Reads one line, byte at a time, up to and including the `\n` terminator.
///
/// A single-byte read loop never consumes past the line boundary, which
/// matters here: anything after the blank line separating head from body
/// belongs to the body and must stay in the socket for later reads.
fn read_line<R: Read>(reader: &mut R) -> Result<String> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        let n = reader.read(&mut byte)?;
        if n == 0 {
            return Err(ProbeError::ConnectionClosed);
        }
        line.push(byte[0]);
        if byte[0] == b'\n' {
            break;
        }
    }

    Ok(String::from_utf8_lossy(&line).into_owned())
}

pub struct RawHttpConnection {
    // None once close() has run; every later operation fails.
    stream: Option<TcpStream>,
    host: String,
    port: u16,
}

impl RawHttpConnection {
    /// Establishes the TCP connection and applies the configured
    /// per-operation socket timeouts.
    pub fn open(host: &str, port: u16, connect_timeout: Duration) -> Result<Self> {
        let addr = format!("{host}:{port}");

        let mut last_err = None;
        let mut stream = None;
        let sock_addrs = addr.to_socket_addrs().map_err(|e| ProbeError::Connect {
            addr: addr.clone(),
            source: e,
        })?;
        for sock_addr in sock_addrs {
            match TcpStream::connect_timeout(&sock_addr, connect_timeout) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }

        let stream = match stream {
            Some(s) => s,
            None => {
                return Err(ProbeError::Connect {
                    addr,
                    source: last_err.unwrap_or_else(|| {
                        io::Error::new(io::ErrorKind::NotFound, "no address resolved")
                    }),
                });
            }
        };

        stream.set_read_timeout(Some(config().io_timeout))?;
        stream.set_write_timeout(Some(config().io_timeout))?;
        debug!(%addr, "raw http connection established");

        Ok(Self {
            stream: Some(stream),
            host: host.to_string(),
            port,
        })
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream> {
        self.stream.as_mut().ok_or(ProbeError::UsedAfterClose)
    }

    /// Sends one framed HTTP request and blocks until the full response head
    /// has been parsed. The body is not consumed; use [`read`](Self::read),
    /// [`read_some`](Self::read_some) or [`read_chunk`](Self::read_chunk).
    ///
    /// Framing rules:
    /// - a POST with an absent body gets an empty body, so Content-Length is
    ///   always computable for POST;
    /// - `Host` is forced to this connection's endpoint (bare host on port
    ///   80, `host:port` otherwise), overwriting any caller value;
    /// - whenever a body is present, even empty, `Content-Length` is set to
    ///   its exact byte length; with no body the caller is responsible.
    pub fn request(
        &mut self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
        http_version: &str,
    ) -> Result<Response> {
        let mut header_map = HeaderMap::from_pairs(headers.iter().copied());

        let body = if body.is_none() && method == "POST" {
            Some("".as_bytes())
        } else {
            body
        };

        let host_value = if self.port == 80 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        };
        header_map.set("Host", &host_value);

        if let Some(body) = body {
            header_map.set("Content-Length", &body.len().to_string());
        }

        let mut head = format!("{method} {path} HTTP/{http_version}\r\n");
        head.push_str(&header_map.stringify());
        head.push_str("\r\n");

        trace!(method, path, "sending request head");
        self.send(head.as_bytes())?;
        if let Some(body) = body
            && !body.is_empty()
        {
            self.send(body)?;
        }

        self.read_response_head()
    }

    fn read_response_head(&mut self) -> Result<Response> {
        let status_line = read_line(self.stream_mut()?)?;
        trace!(line = %status_line.trim_end(), "status line");
        let (version, status, description) = parse_status_line(&status_line)?;

        let mut headers = HeaderMap::new();
        loop {
            let line = read_line(self.stream_mut()?)?;
            if line == "\r\n" || line == "\n" {
                break;
            }
            match line.split_once(':') {
                Some((name, value)) => {
                    headers.set(name, value.trim_start().trim_end_matches(['\r', '\n']));
                }
                // No colon: keep the whole line as a name with an empty value.
                None => headers.set(line.trim_end_matches(['\r', '\n']), ""),
            }
        }

        Ok(Response {
            version,
            status,
            description,
            headers,
        })
    }

    /// Reads exactly `size` bytes, looping over as many socket reads as it
    /// takes. Fails with [`ProbeError::ConnectionClosed`] if the peer closes
    /// before the count is reached.
    pub fn read(&mut self, size: usize) -> Result<Vec<u8>> {
        let stream = self.stream_mut()?;
        let mut data = vec![0u8; size];
        let mut filled = 0;

        while filled < size {
            let n = stream.read(&mut data[filled..])?;
            if n == 0 {
                return Err(ProbeError::ConnectionClosed);
            }
            filled += n;
        }

        Ok(data)
    }

    /// One best-effort read of whatever is available, up to the configured
    /// ceiling. Returns an empty buffer at end of stream; never blocks for
    /// more than a single underlying read.
    pub fn read_some(&mut self) -> Result<Vec<u8>> {
        let mut data = vec![0u8; config().recv_ceiling];
        let n = self.stream_mut()?.read(&mut data)?;
        data.truncate(n);
        Ok(data)
    }

    /// Decodes exactly one chunk of a chunked transfer encoding: hexadecimal
    /// size line, then `size + 2` bytes with the trailing CRLF stripped.
    /// Chunk extensions and the trailer section are not supported.
    pub fn read_chunk(&mut self) -> Result<Vec<u8>> {
        let line = read_line(self.stream_mut()?)?;
        let size = usize::from_str_radix(line.trim_end_matches(['\r', '\n']), 16)
            .map_err(|_| ProbeError::Protocol(format!("bad chunk size line {line:?}")))?;

        let mut data = self.read(size + 2)?;
        data.truncate(size);
        Ok(data)
    }

    /// Asserts that the peer has closed the connection.
    ///
    /// Probes with a one-byte read under a short timeout. An EOF means the
    /// peer closed and `Ok(true)` is returned. Pending data or silence past
    /// the probe window violates the caller's expectation and fails with
    /// [`ProbeError::ConnectionNotClosed`]; tests assert closure, they do not
    /// merely query it.
    pub fn is_closed(&mut self) -> Result<bool> {
        let stream = self.stream_mut()?;
        let previous_timeout = stream.read_timeout()?;
        stream.set_read_timeout(Some(config().close_probe_timeout))?;

        let mut byte = [0u8; 1];
        let probe = stream.read(&mut byte);
        stream.set_read_timeout(previous_timeout)?;

        match probe {
            Ok(0) => Ok(true),
            Ok(_) => Err(ProbeError::ConnectionNotClosed),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Err(ProbeError::ConnectionNotClosed)
            }
            Err(e) => Err(ProbeError::Socket(e)),
        }
    }

    /// Writes raw bytes to the socket. Used by the request machinery and
    /// directly by tests that inject deliberately malformed data.
    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        self.stream_mut()?.write_all(data)?;
        Ok(())
    }

    /// Overrides the per-operation read timeout for this connection.
    /// `None` disables it, which streaming readers rely on.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.stream_mut()?.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Shuts the socket down and releases it. Not idempotent: any further
    /// operation, including a second close, fails with
    /// [`ProbeError::UsedAfterClose`].
    pub fn close(&mut self) -> Result<()> {
        let stream = self.stream.take().ok_or(ProbeError::UsedAfterClose)?;
        stream.shutdown(Shutdown::Both)?;
        debug!(host = %self.host, port = self.port, "raw http connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_line_stops_at_the_first_newline() {
        let mut cursor = Cursor::new(&b"abc\r\ndef"[..]);
        let line = read_line(&mut cursor).unwrap();
        assert_eq!(line, "abc\r\n");
        // The bytes after the terminator must still be unconsumed.
        assert_eq!(cursor.position(), 5);
    }

    #[test]
    fn read_line_handles_bare_lf() {
        let mut cursor = Cursor::new(&b"\nrest"[..]);
        assert_eq!(read_line(&mut cursor).unwrap(), "\n");
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn read_line_fails_on_eof_before_newline() {
        let mut cursor = Cursor::new(&b"no terminator"[..]);
        assert!(matches!(
            read_line(&mut cursor),
            Err(ProbeError::ConnectionClosed)
        ));
    }
}
