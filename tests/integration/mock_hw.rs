//! Mock adapters for integration tests.
//!
//! Each mock records every port call so tests can assert on the full
//! history without touching a real network stack or timer.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::rc::Rc;

use flowwatch::app::events::AppEvent;
use flowwatch::app::ports::{Connection, ConnectionListener, EventSink, LinkPort, TimePort};
use flowwatch::error::{ConnectionError, LinkError};

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PortCall {
    IsConnected,
    Reconnect,
    Poll,
    Write(usize),
    Close,
    Delay(u32),
}

pub type CallLog = Rc<RefCell<Vec<PortCall>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

// ── MockLink ──────────────────────────────────────────────────

pub struct MockLink {
    pub up: bool,
    /// Link state after the next reconnect call.
    pub up_after_reconnect: bool,
    pub reconnect_result: Result<(), LinkError>,
    log: CallLog,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new(up: bool, log: CallLog) -> Self {
        Self {
            up,
            up_after_reconnect: false,
            reconnect_result: Ok(()),
            log,
        }
    }
}

impl LinkPort for MockLink {
    fn is_connected(&self) -> bool {
        self.log.borrow_mut().push(PortCall::IsConnected);
        self.up
    }

    fn reconnect(&mut self) -> Result<(), LinkError> {
        self.log.borrow_mut().push(PortCall::Reconnect);
        self.up = self.up_after_reconnect;
        self.reconnect_result
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        self.up.then_some(Ipv4Addr::new(10, 0, 0, 7))
    }
}

// ── MockConnection / MockListener ─────────────────────────────

/// What the next accepted connection does on write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WriteBehaviour {
    Accept,
    Fail,
    Zero,
}

pub struct MockConnection {
    behaviour: WriteBehaviour,
    out: Rc<RefCell<Vec<u8>>>,
    log: CallLog,
}

impl Connection for MockConnection {
    fn write(&mut self, data: &[u8]) -> Result<usize, ConnectionError> {
        self.log.borrow_mut().push(PortCall::Write(data.len()));
        match self.behaviour {
            WriteBehaviour::Accept => {
                self.out.borrow_mut().extend_from_slice(data);
                Ok(data.len())
            }
            WriteBehaviour::Fail => Err(ConnectionError::Io),
            WriteBehaviour::Zero => Ok(0),
        }
    }

    fn close(&mut self) {
        self.log.borrow_mut().push(PortCall::Close);
    }
}

pub struct MockListener {
    pending: VecDeque<WriteBehaviour>,
    /// Bytes written by the most recent connection.
    pub last_response: Rc<RefCell<Vec<u8>>>,
    log: CallLog,
}

#[allow(dead_code)]
impl MockListener {
    pub fn new(log: CallLog) -> Self {
        Self {
            pending: VecDeque::new(),
            last_response: Rc::new(RefCell::new(Vec::new())),
            log,
        }
    }

    /// Queue a client that will show up on the next poll.
    pub fn queue_client(&mut self, behaviour: WriteBehaviour) {
        self.pending.push_back(behaviour);
    }

    pub fn response_text(&self) -> String {
        String::from_utf8(self.last_response.borrow().clone()).unwrap()
    }
}

impl ConnectionListener for MockListener {
    type Connection = MockConnection;

    fn poll_for_connection(&mut self) -> Option<MockConnection> {
        self.log.borrow_mut().push(PortCall::Poll);
        let behaviour = self.pending.pop_front()?;
        self.last_response.borrow_mut().clear();
        Some(MockConnection {
            behaviour,
            out: Rc::clone(&self.last_response),
            log: Rc::clone(&self.log),
        })
    }
}

// ── FakeClock ─────────────────────────────────────────────────

/// Manually driven clock; `delay_ms` advances it.
pub struct FakeClock {
    pub now_ms: u64,
    log: CallLog,
}

#[allow(dead_code)]
impl FakeClock {
    pub fn new(now_ms: u64, log: CallLog) -> Self {
        Self { now_ms, log }
    }

    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
    }
}

impl TimePort for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(PortCall::Delay(ms));
        self.now_ms += u64::from(ms);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
