//! Port traits: the hexagonal boundary between the status loop and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ StatusServer (domain)
//! ```
//!
//! Driven adapters (Wi-Fi link, TCP listener, clock, diagnostic log)
//! implement these traits.  The [`StatusServer`](super::service::StatusServer)
//! consumes them via generics, so the loop never touches the network stack
//! or the system timer directly.

use core::net::Ipv4Addr;

use crate::error::{ConnectionError, LinkError};

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: network interface ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Network link state and recovery.
pub trait LinkPort {
    /// Whether the station is associated and has an address.
    fn is_connected(&self) -> bool;

    /// Start one reconnection attempt.  Does not wait for completion.
    fn reconnect(&mut self) -> Result<(), LinkError>;

    /// Local address, for diagnostics only.
    fn local_ip(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// Connection ports (driven adapter: TCP server ↔ domain)
// ───────────────────────────────────────────────────────────────

/// A single accepted client byte stream.
pub trait Connection {
    /// Write some of `data`; returns the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, ConnectionError>;

    /// Terminate the connection.  Idempotent.
    fn close(&mut self);
}

/// Non-blocking connection acceptance.
pub trait ConnectionListener {
    type Connection: Connection;

    /// Return a waiting client, or `None` if nobody is connecting.
    fn poll_for_connection(&mut self) -> Option<Self::Connection>;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic time and blocking delay.
///
/// `now_ms` must share its time base with the pulse ISR timestamps.
pub trait TimePort {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Block the calling task for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → diagnostic log)
// ───────────────────────────────────────────────────────────────

/// The loop emits structured [`AppEvent`]s through this port.  Adapters
/// decide where they go (serial log, nowhere).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// `None` discards every event; this is the disabled-diagnostics sink.
impl<S: EventSink> EventSink for Option<S> {
    fn emit(&mut self, event: &AppEvent) {
        if let Some(sink) = self {
            sink.emit(event);
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: &AppEvent) {
        (**self).emit(event);
    }
}
