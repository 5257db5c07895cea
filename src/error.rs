//! Error taxonomy for the probe.
//!
//! Every failure is surfaced to the immediate caller; there is no retry or
//! recovery logic anywhere in the crate. A protocol violation should fail the
//! test that triggered it, not be papered over.

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProbeError>;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// TCP connect failure or timeout while opening a connection.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Malformed status line, unparseable response head, bad chunk size line
    /// or an unusable URL.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The peer closed the socket while a definite byte count was still
    /// expected. Also raised when a WebSocket receive hits the closed
    /// sentinel.
    #[error("peer closed the connection mid-read")]
    ConnectionClosed,

    /// `is_closed` found the peer still alive: it either delivered data or
    /// stayed silent past the probe timeout.
    #[error("peer did not close the connection")]
    ConnectionNotClosed,

    /// Generic socket-level I/O failure.
    #[error("socket error: {0}")]
    Socket(#[from] io::Error),

    /// An operation was attempted on a connection that was already closed.
    #[error("connection used after close")]
    UsedAfterClose,

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// No WebSocket message arrived within the receive timeout.
    #[error("timed out waiting for a websocket message")]
    RecvTimeout,
}
