//! Integration tests: StatusServer loop against mock ports.

use flowwatch::app::events::AppEvent;
use flowwatch::app::service::{Outcome, StatusServer};
use flowwatch::config::SystemConfig;
use flowwatch::error::{ConnectionError, LinkError};
use flowwatch::sensors::flow::PulseCounter;
use flowwatch::status_page::StatusSnapshot;

use super::mock_hw::{
    CallLog, FakeClock, MockLink, MockListener, PortCall, RecordingSink, WriteBehaviour, call_log,
};

type Server<'c> = StatusServer<'c, MockLink, MockListener, FakeClock, RecordingSink>;

fn server(counter: &PulseCounter, link_up: bool, now_ms: u64) -> (Server<'_>, CallLog) {
    let log = call_log();
    let s = StatusServer::new(
        &SystemConfig::default(),
        counter,
        MockLink::new(link_up, log.clone()),
        MockListener::new(log.clone()),
        FakeClock::new(now_ms, log.clone()),
        RecordingSink::default(),
    );
    (s, log)
}

// ── Flow scenarios ────────────────────────────────────────────

#[test]
fn no_pulses_after_three_seconds_reports_off() {
    let counter = PulseCounter::new();
    let (mut s, _) = server(&counter, true, 3_000);
    s.listener_mut().queue_client(WriteBehaviour::Accept);

    let outcome = s.run_once();

    assert_eq!(
        outcome,
        Outcome::Served(StatusSnapshot {
            pulse_count: 0,
            uptime_secs: 3,
            active: false,
        })
    );
    let page = s.listener().response_text();
    assert!(page.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(page.contains("color:red;'>Off</p>"));
}

#[test]
fn recent_pulse_reports_on() {
    let counter = PulseCounter::new();
    counter.on_pulse(0);
    let (mut s, _) = server(&counter, true, 500);
    s.listener_mut().queue_client(WriteBehaviour::Accept);

    let outcome = s.run_once();

    assert!(matches!(outcome, Outcome::Served(StatusSnapshot { active: true, .. })));
    assert!(s.listener().response_text().contains("color:green;'>On</p>"));
}

#[test]
fn stale_pulse_reports_off() {
    let counter = PulseCounter::new();
    counter.on_pulse(0);
    let (mut s, _) = server(&counter, true, 2_500);
    s.listener_mut().queue_client(WriteBehaviour::Accept);

    assert!(matches!(s.run_once(), Outcome::Served(StatusSnapshot { active: false, .. })));
}

#[test]
fn state_is_rederived_on_every_request() {
    let counter = PulseCounter::new();
    counter.on_pulse(1_000);
    let (mut s, _) = server(&counter, true, 1_500);

    s.listener_mut().queue_client(WriteBehaviour::Accept);
    assert!(matches!(s.run_once(), Outcome::Served(StatusSnapshot { active: true, .. })));

    s.clock_mut().advance(3_000);
    s.listener_mut().queue_client(WriteBehaviour::Accept);
    assert!(matches!(s.run_once(), Outcome::Served(StatusSnapshot { active: false, .. })));

    counter.on_pulse(4_600);
    s.clock_mut().advance(100);
    s.listener_mut().queue_client(WriteBehaviour::Accept);
    assert!(matches!(s.run_once(), Outcome::Served(StatusSnapshot { active: true, .. })));
}

#[test]
fn page_shows_pulse_count_and_uptime() {
    let counter = PulseCounter::new();
    for t in 0..17 {
        counter.on_pulse(60_000 + t * 10);
    }
    let (mut s, _) = server(&counter, true, 65_432);
    s.listener_mut().queue_client(WriteBehaviour::Accept);
    s.run_once();

    let page = s.listener().response_text();
    assert!(page.contains("<p>Pulses detected: 17</p>"));
    assert!(page.contains("<p>Uptime: 65 seconds</p>"));
}

#[test]
fn identical_state_serves_identical_bytes() {
    let counter = PulseCounter::new();
    counter.on_pulse(10);
    let (mut s, _) = server(&counter, true, 20);

    s.listener_mut().queue_client(WriteBehaviour::Accept);
    s.run_once();
    let first = s.listener().response_text();

    s.listener_mut().queue_client(WriteBehaviour::Accept);
    s.run_once();
    assert_eq!(first, s.listener().response_text());
}

// ── Loop state machine ────────────────────────────────────────

#[test]
fn idle_when_no_client_is_waiting() {
    let counter = PulseCounter::new();
    let (mut s, log) = server(&counter, true, 0);

    assert_eq!(s.run_once(), Outcome::Idle);
    assert_eq!(
        *log.borrow(),
        vec![PortCall::IsConnected, PortCall::Poll, PortCall::Delay(10)]
    );
}

#[test]
fn idle_iterations_yield_between_polls() {
    let counter = PulseCounter::new();
    let log = call_log();
    let mut config = SystemConfig::default();
    config.idle_poll_ms = 25;
    let mut s = StatusServer::new(
        &config,
        &counter,
        MockLink::new(true, log.clone()),
        MockListener::new(log.clone()),
        FakeClock::new(0, log.clone()),
        RecordingSink::default(),
    );

    for _ in 0..1_000 {
        assert_eq!(s.run_once(), Outcome::Idle);
    }
    let delays = log.borrow().iter().filter(|c| **c == PortCall::Delay(25)).count();
    assert_eq!(delays, 1_000);
    assert_eq!(s.current_status().uptime_secs, 25);
}

#[test]
fn link_down_reconnects_without_polling_or_serving() {
    let counter = PulseCounter::new();
    let (mut s, log) = server(&counter, false, 0);
    s.listener_mut().queue_client(WriteBehaviour::Accept);

    assert_eq!(s.run_once(), Outcome::LinkDown);
    assert_eq!(
        *log.borrow(),
        vec![PortCall::IsConnected, PortCall::Reconnect, PortCall::Delay(1_000)]
    );
    assert_eq!(s.sink().events, vec![AppEvent::LinkLost]);
    assert_eq!(s.served(), 0);
}

#[test]
fn link_down_is_retried_every_iteration() {
    let counter = PulseCounter::new();
    let (mut s, log) = server(&counter, false, 0);

    for _ in 0..5 {
        assert_eq!(s.run_once(), Outcome::LinkDown);
    }
    let reconnects = log.borrow().iter().filter(|c| **c == PortCall::Reconnect).count();
    assert_eq!(reconnects, 5);
    assert_eq!(s.iterations(), 5);
}

#[test]
fn failed_reconnect_is_reported_and_still_backs_off() {
    let counter = PulseCounter::new();
    let (mut s, log) = server(&counter, false, 0);
    s.link_mut().reconnect_result = Err(LinkError::ConnectFailed);

    assert_eq!(s.run_once(), Outcome::LinkDown);
    assert!(log.borrow().contains(&PortCall::Delay(1_000)));
    assert_eq!(
        s.sink().events,
        vec![AppEvent::LinkLost, AppEvent::ReconnectFailed(LinkError::ConnectFailed)]
    );
}

#[test]
fn queued_client_is_served_once_link_recovers() {
    let counter = PulseCounter::new();
    let (mut s, _) = server(&counter, false, 0);
    s.link_mut().up_after_reconnect = true;
    s.listener_mut().queue_client(WriteBehaviour::Accept);

    assert_eq!(s.run_once(), Outcome::LinkDown);
    assert!(matches!(s.run_once(), Outcome::Served(_)));
    assert!(s.sink().events.iter().any(|e| matches!(e, AppEvent::LinkRestored(Some(_)))));
}

#[test]
fn write_failure_closes_connection_and_loop_continues() {
    let counter = PulseCounter::new();
    let (mut s, log) = server(&counter, true, 0);
    s.listener_mut().queue_client(WriteBehaviour::Fail);
    s.listener_mut().queue_client(WriteBehaviour::Accept);

    assert_eq!(s.run_once(), Outcome::WriteFailed(ConnectionError::Io));
    {
        let calls = log.borrow();
        let writes = calls.iter().filter(|c| matches!(c, PortCall::Write(_))).count();
        assert_eq!(writes, 1, "a failed write must not be retried");
        assert_eq!(calls.last(), Some(&PortCall::Close));
    }
    assert!(s.sink().events.contains(&AppEvent::WriteFailed(ConnectionError::Io)));

    assert!(matches!(s.run_once(), Outcome::Served(_)));
    assert_eq!(s.served(), 1);
}

#[test]
fn zero_byte_write_counts_as_failure() {
    let counter = PulseCounter::new();
    let (mut s, log) = server(&counter, true, 0);
    s.listener_mut().queue_client(WriteBehaviour::Zero);

    assert_eq!(s.run_once(), Outcome::WriteFailed(ConnectionError::WriteZero));
    assert_eq!(log.borrow().last(), Some(&PortCall::Close));
}

#[test]
fn served_connection_is_always_closed() {
    let counter = PulseCounter::new();
    let (mut s, log) = server(&counter, true, 0);
    s.listener_mut().queue_client(WriteBehaviour::Accept);
    s.run_once();

    let calls = log.borrow();
    assert_eq!(calls.iter().filter(|c| **c == PortCall::Close).count(), 1);
    assert_eq!(calls.last(), Some(&PortCall::Close));
    assert_eq!(s.sink().events.last(), Some(&AppEvent::ClientDisconnected));
}

#[test]
fn start_announces_port_and_address() {
    let counter = PulseCounter::new();
    let (mut s, _) = server(&counter, true, 0);
    s.start();
    assert_eq!(
        s.sink().events,
        vec![AppEvent::Started {
            port: 80,
            ip: Some(std::net::Ipv4Addr::new(10, 0, 0, 7)),
        }]
    );
}

#[test]
fn disabled_diagnostics_sink_is_accepted() {
    let counter = PulseCounter::new();
    let log = call_log();
    let mut s = StatusServer::new(
        &SystemConfig::default(),
        &counter,
        MockLink::new(true, log.clone()),
        MockListener::new(log.clone()),
        FakeClock::new(0, log.clone()),
        None::<RecordingSink>,
    );
    s.listener_mut().queue_client(WriteBehaviour::Accept);
    assert!(matches!(s.run_once(), Outcome::Served(_)));
    assert!(s.sink().is_none());
}
