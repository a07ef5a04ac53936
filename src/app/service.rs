//! Status server: the hexagonal core.
//!
//! [`StatusServer`] is the only place the pulse counter, the flow
//! evaluator and the page renderer meet.  All I/O flows through port
//! traits, making the whole loop testable with mock adapters.
//!
//! ```text
//!  LinkPort ──────────▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  ConnectionListener ─▶│         StatusServer         │
//!  TimePort ──────────▶ │ snapshot · evaluate · render │ ──▶ Connection
//!  PulseCounter ──────▶ └──────────────────────────────┘
//! ```
//!
//! One iteration walks `CheckLink → PollConnection → Serve | Idle`.  A
//! down link short-circuits the iteration after a reconnect attempt and a
//! fixed backoff; an idle iteration sleeps `idle_poll_ms`.  A failed write
//! closes the connection and is not retried.

use log::{debug, info, warn};

use crate::config::{FLOW_TIMEOUT_MS, SystemConfig};
use crate::error::ConnectionError;
use crate::flow_state::FlowState;
use crate::sensors::flow::PulseCounter;
use crate::status_page::{self, StatusSnapshot};

use super::events::AppEvent;
use super::ports::{Connection, ConnectionListener, EventSink, LinkPort, TimePort};

/// Position within one loop iteration.
#[derive(Debug)]
pub enum LoopState<C> {
    CheckLink,
    PollConnection,
    Serve(C),
    Idle,
}

/// How an iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Link was down; reconnect attempted, nothing served.
    LinkDown,
    /// No client waiting; the loop slept `idle_poll_ms`.
    Idle,
    /// A client received the page rendered from this snapshot.
    Served(StatusSnapshot),
    /// The page could not be delivered; the connection was closed.
    WriteFailed(ConnectionError),
}

// ───────────────────────────────────────────────────────────────
// StatusServer
// ───────────────────────────────────────────────────────────────

/// The request loop.  Owns its adapters; borrows the pulse counter.
pub struct StatusServer<'c, L, A, T, S> {
    counter: &'c PulseCounter,
    link: L,
    listener: A,
    clock: T,
    sink: S,
    http_port: u16,
    reconnect_backoff_ms: u32,
    idle_poll_ms: u32,
    link_down: bool,
    iterations: u64,
    served: u64,
}

impl<'c, L, A, T, S> StatusServer<'c, L, A, T, S>
where
    L: LinkPort,
    A: ConnectionListener,
    T: TimePort,
    S: EventSink,
{
    pub fn new(
        config: &SystemConfig,
        counter: &'c PulseCounter,
        link: L,
        listener: A,
        clock: T,
        sink: S,
    ) -> Self {
        Self {
            counter,
            link,
            listener,
            clock,
            sink,
            http_port: config.http_port,
            reconnect_backoff_ms: config.reconnect_backoff_ms,
            idle_poll_ms: config.idle_poll_ms,
            link_down: false,
            iterations: 0,
            served: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the server.  Call once before the first iteration.
    pub fn start(&mut self) {
        let ip = self.link.local_ip();
        info!("StatusServer started on port {} (ip={:?})", self.http_port, ip);
        self.sink.emit(&AppEvent::Started {
            port: self.http_port,
            ip,
        });
    }

    /// Run forever.  `after_iteration` is called once per iteration (the
    /// firmware feeds the task watchdog there).
    pub fn run(&mut self, mut after_iteration: impl FnMut(&Outcome)) -> ! {
        loop {
            let outcome = self.run_once();
            after_iteration(&outcome);
        }
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one iteration of the state machine.
    pub fn run_once(&mut self) -> Outcome {
        self.iterations = self.iterations.wrapping_add(1);
        let mut state = LoopState::CheckLink;
        loop {
            state = match state {
                LoopState::CheckLink => {
                    if !self.link.is_connected() {
                        return self.recover_link();
                    }
                    if self.link_down {
                        self.link_down = false;
                        let ip = self.link.local_ip();
                        info!("Link restored (ip={:?})", ip);
                        self.sink.emit(&AppEvent::LinkRestored(ip));
                    }
                    LoopState::PollConnection
                }
                LoopState::PollConnection => match self.listener.poll_for_connection() {
                    Some(conn) => LoopState::Serve(conn),
                    None => LoopState::Idle,
                },
                LoopState::Serve(conn) => return self.serve(conn),
                LoopState::Idle => {
                    // accept() and is_up() never block; yield the core.
                    self.clock.delay_ms(self.idle_poll_ms);
                    return Outcome::Idle;
                }
            };
        }
    }

    /// Snapshot the counter and derive what the page would show right now.
    pub fn current_status(&self) -> StatusSnapshot {
        // Counter first, clock second: a pulse landing in between only
        // makes the timestamp newer than `now_ms`, which still reads active.
        let pulses = self.counter.snapshot();
        let now_ms = self.clock.now_ms();
        let flow = FlowState::evaluate(pulses.last_pulse_ms, now_ms, FLOW_TIMEOUT_MS);
        StatusSnapshot {
            pulse_count: pulses.count,
            uptime_secs: now_ms / 1000,
            active: flow.active,
        }
    }

    fn recover_link(&mut self) -> Outcome {
        if !self.link_down {
            warn!("Link down, attempting reconnect");
        }
        self.link_down = true;
        self.sink.emit(&AppEvent::LinkLost);
        if let Err(e) = self.link.reconnect() {
            debug!("reconnect attempt failed: {}", e);
            self.sink.emit(&AppEvent::ReconnectFailed(e));
        }
        self.clock.delay_ms(self.reconnect_backoff_ms);
        Outcome::LinkDown
    }

    fn serve(&mut self, mut conn: A::Connection) -> Outcome {
        let snapshot = self.current_status();
        let page = status_page::render(&snapshot);
        let result = write_all(&mut conn, page.as_bytes());
        conn.close();

        let outcome = match result {
            Ok(()) => {
                self.served = self.served.wrapping_add(1);
                self.sink.emit(&AppEvent::ClientServed(snapshot));
                Outcome::Served(snapshot)
            }
            Err(e) => {
                warn!("status page write failed: {}", e);
                self.sink.emit(&AppEvent::WriteFailed(e));
                Outcome::WriteFailed(e)
            }
        };
        self.sink.emit(&AppEvent::ClientDisconnected);
        outcome
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn listener(&self) -> &A {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut A {
        &mut self.listener
    }

    pub fn clock_mut(&mut self) -> &mut T {
        &mut self.clock
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Iterations run so far.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Pages delivered successfully so far.
    pub fn served(&self) -> u64 {
        self.served
    }
}

/// Write every byte of `data`.  Errors are returned as-is, never retried; a
/// connection that accepts zero bytes is treated as dead.
fn write_all(conn: &mut impl Connection, mut data: &[u8]) -> Result<(), ConnectionError> {
    while !data.is_empty() {
        match conn.write(data)? {
            0 => return Err(ConnectionError::WriteZero),
            n => data = &data[n.min(data.len())..],
        }
    }
    Ok(())
}
