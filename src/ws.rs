//! Minimal WebSocket test client.
//!
//! One dedicated reader thread per connection drains incoming frames into a
//! queue; `recv` takes from that queue with a timeout. When the stream ends,
//! the reader pushes a distinguished closed sentinel, which `recv` surfaces
//! as [`ProbeError::ConnectionClosed`]. The sentinel is a separate queue item
//! variant, so it can never collide with a valid message payload.

use std::io;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;
use tungstenite::Message;
use tungstenite::protocol::WebSocket;
use tungstenite::stream::MaybeTlsStream;

use crate::config::config;
use crate::error::{ProbeError, Result};

// Read timeout on the underlying socket; bounds how long the reader thread
// holds the socket lock and how fast it notices the closing flag.
const READER_POLL_INTERVAL: Duration = Duration::from_millis(100);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

enum Incoming {
    Message(String),
    // Stream-end sentinel, distinct from any message.
    Closed,
}

pub struct WsTestClient {
    socket: Arc<Mutex<Socket>>,
    incoming: Receiver<Incoming>,
    closing: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl WsTestClient {
    /// Performs the WebSocket handshake against `url` (`ws://...`) and starts
    /// the reader thread.
    pub fn connect(url: &str) -> Result<Self> {
        let (socket, _response) = tungstenite::connect(url)?;
        if let MaybeTlsStream::Plain(stream) = socket.get_ref() {
            stream.set_read_timeout(Some(READER_POLL_INTERVAL))?;
        }
        debug!(url, "websocket test client connected");

        let socket = Arc::new(Mutex::new(socket));
        let closing = Arc::new(AtomicBool::new(false));
        let (tx, rx) = channel();

        let reader = thread::spawn({
            let socket = Arc::clone(&socket);
            let closing = Arc::clone(&closing);
            move || reader_loop(&socket, &closing, &tx)
        });

        Ok(Self {
            socket,
            incoming: rx,
            closing,
            reader: Some(reader),
        })
    }

    pub fn send(&self, text: &str) -> Result<()> {
        let mut socket = self.socket.lock().expect("websocket mutex poisoned");
        socket.send(Message::text(text))?;
        Ok(())
    }

    /// Takes the next message from the queue, waiting up to the configured
    /// receive timeout. The closed sentinel becomes
    /// [`ProbeError::ConnectionClosed`]; an empty queue after the timeout
    /// becomes [`ProbeError::RecvTimeout`].
    pub fn recv(&self) -> Result<String> {
        match self.incoming.recv_timeout(config().ws_recv_timeout) {
            Ok(Incoming::Message(message)) => Ok(message),
            Ok(Incoming::Closed) => Err(ProbeError::ConnectionClosed),
            Err(_) => Err(ProbeError::RecvTimeout),
        }
    }

    /// Starts the close handshake and joins the reader thread.
    pub fn close(mut self) -> Result<()> {
        self.closing.store(true, Ordering::Relaxed);
        {
            let mut socket = self.socket.lock().expect("websocket mutex poisoned");
            match socket.close(None) {
                Ok(()) => {}
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {}
                Err(e) => return Err(e.into()),
            }
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        debug!("websocket test client closed");
        Ok(())
    }
}

fn reader_loop(socket: &Mutex<Socket>, closing: &AtomicBool, queue: &Sender<Incoming>) {
    loop {
        // Hold the lock only for one read so sends can interleave.
        let frame = {
            let mut socket = match socket.lock() {
                Ok(socket) => socket,
                Err(_) => return,
            };
            socket.read()
        };

        match frame {
            Ok(Message::Text(text)) => {
                if queue.send(Incoming::Message(text.as_str().to_owned())).is_err() {
                    return;
                }
            }
            Ok(Message::Binary(data)) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                if queue.send(Incoming::Message(text)).is_err() {
                    return;
                }
            }
            Ok(Message::Close(_)) => {
                let _ = queue.send(Incoming::Closed);
                return;
            }
            // Ping/pong and raw frames carry nothing for the test.
            Ok(_) => {}
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                if closing.load(Ordering::Relaxed) {
                    return;
                }
            }
            Err(_) => {
                let _ = queue.send(Incoming::Closed);
                return;
            }
        }
    }
}
