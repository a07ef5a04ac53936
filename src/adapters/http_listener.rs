//! HTTP listener adapter.
//!
//! Implements [`ConnectionListener`] and [`Connection`] on top of
//! `std::net`.  ESP-IDF provides `std::net` over lwIP, so the same code
//! runs on target and on the host.
//!
//! ## Connection model
//!
//! 1. `bind()` opens a non-blocking TCP listener on `0.0.0.0:<port>`.
//! 2. `poll_for_connection()` accepts at most one waiting client and
//!    returns immediately when there is none.
//! 3. Accepted sockets are switched to blocking writes bounded by
//!    [`WRITE_TIMEOUT`], so a stalled client cannot hold the loop.
//! 4. `close()` drains whatever request bytes already arrived (never
//!    blocking) and shuts the socket down.  The request itself is never
//!    parsed; every client gets the same page.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use log::{debug, info, warn};

use crate::app::ports::{Connection, ConnectionListener};
use crate::error::ConnectionError;

/// Upper bound on a single blocking socket write.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Largest request prefix drained before close.
const DRAIN_LIMIT: usize = 1024;

// ───────────────────────────────────────────────────────────────
// Listener
// ───────────────────────────────────────────────────────────────

pub struct HttpListener {
    listener: TcpListener,
}

impl HttpListener {
    /// Bind on all interfaces.  Pass port `0` to let the OS pick a free
    /// port (use [`local_addr()`](Self::local_addr) to discover it).
    pub fn bind(port: u16) -> std::io::Result<Self> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        info!("HTTP: listening on port {}", port);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl ConnectionListener for HttpListener {
    type Connection = TcpConnection;

    fn poll_for_connection(&mut self) -> Option<TcpConnection> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                // Accepted sockets may inherit non-blocking mode.
                if let Err(e) = stream
                    .set_nonblocking(false)
                    .and_then(|()| stream.set_write_timeout(Some(WRITE_TIMEOUT)))
                {
                    warn!("HTTP: failed to configure client socket from {}: {}", peer, e);
                    return None;
                }
                info!("HTTP: new client {}", peer);
                Some(TcpConnection {
                    stream: Some(stream),
                    peer,
                })
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("HTTP: accept error: {}", e);
                None
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Connection
// ───────────────────────────────────────────────────────────────

pub struct TcpConnection {
    stream: Option<TcpStream>,
    peer: SocketAddr,
}

impl TcpConnection {
    /// Remote address of the client.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Discard request bytes that already arrived so the close is a clean
    /// FIN rather than a reset.
    fn drain_pending(stream: &mut TcpStream) {
        if stream.set_nonblocking(true).is_err() {
            return;
        }
        let mut buf = [0u8; 128];
        let mut drained = 0;
        while drained < DRAIN_LIMIT {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => drained += n,
            }
        }
        debug!("HTTP: drained {} request bytes", drained);
    }
}

impl Connection for TcpConnection {
    fn write(&mut self, data: &[u8]) -> Result<usize, ConnectionError> {
        let stream = self.stream.as_mut().ok_or(ConnectionError::Closed)?;
        match stream.write(data) {
            Ok(n) => Ok(n),
            Err(e) => {
                debug!("HTTP: write to {} failed: {}", self.peer, e);
                Err(ConnectionError::Io)
            }
        }
    }

    fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.flush();
            Self::drain_pending(&mut stream);
            let _ = stream.shutdown(Shutdown::Both);
            debug!("HTTP: closed {}", self.peer);
        }
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        self.close();
    }
}

// ───────────────────────────────────────────────────────────────
// Tests (host only)
// ───────────────────────────────────────────────────────────────
