//! Outbound application events.
//!
//! The [`StatusServer`](super::service::StatusServer) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  They replace ad-hoc
//! serial prints: with diagnostics disabled the sink is `None` and they
//! cost nothing.

use core::net::Ipv4Addr;

use crate::error::{ConnectionError, LinkError};
use crate::status_page::StatusSnapshot;

/// Structured events emitted by the status loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The loop is starting (carries the listening port and address if known).
    Started { port: u16, ip: Option<Ipv4Addr> },

    /// The link was found down; a reconnect is being attempted.
    LinkLost,

    /// The reconnect call itself failed.
    ReconnectFailed(LinkError),

    /// The link is up again after one or more down iterations.
    LinkRestored(Option<Ipv4Addr>),

    /// A client received the status page.
    ClientServed(StatusSnapshot),

    /// Writing the page failed; the connection was dropped.
    WriteFailed(ConnectionError),

    /// The client connection was closed.
    ClientDisconnected,
}
