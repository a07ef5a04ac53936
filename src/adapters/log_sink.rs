//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing loop events to the `log` facade
//! (the ESP-IDF logger on target, which goes to UART / USB-CDC).  With
//! diagnostics disabled the firmware passes `None::<LogEventSink>` instead.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { port, ip } => match ip {
                Some(ip) => info!("START | serving http://{}:{}/", ip, port),
                None => info!("START | serving on port {} (no address yet)", port),
            },
            AppEvent::LinkLost => {
                warn!("LINK  | WiFi disconnected, attempting reconnect...");
            }
            AppEvent::ReconnectFailed(e) => {
                warn!("LINK  | reconnect failed: {}", e);
            }
            AppEvent::LinkRestored(ip) => {
                info!("LINK  | WiFi connected, ip={:?}", ip);
            }
            AppEvent::ClientServed(s) => {
                info!(
                    "HTTP  | served pulses={} uptime={}s water={}",
                    s.pulse_count,
                    s.uptime_secs,
                    s.label(),
                );
            }
            AppEvent::WriteFailed(e) => {
                warn!("HTTP  | write failed: {}", e);
            }
            AppEvent::ClientDisconnected => {
                info!("HTTP  | client disconnected");
            }
        }
    }
}
