//! HTTP status page rendering.
//!
//! Produces the complete response (status line, headers and HTML body) in a
//! fixed-capacity stack buffer.  Output depends only on the
//! [`StatusSnapshot`], so identical snapshots always render identical bytes.

use core::fmt::Write as _;

use crate::config::REFRESH_INTERVAL_SECS;

/// Buffer size for a rendered page.  The template plus the widest possible
/// `u32` count and `u64` uptime fit with headroom.
pub const PAGE_CAPACITY: usize = 1024;

/// Everything the page shows, captured once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub pulse_count: u32,
    pub uptime_secs: u64,
    pub active: bool,
}

impl StatusSnapshot {
    /// Textual status label.
    pub fn label(&self) -> &'static str {
        if self.active { "On" } else { "Off" }
    }

    /// CSS colour cue for the status label.
    pub fn colour(&self) -> &'static str {
        if self.active { "green" } else { "red" }
    }
}

/// A rendered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPage {
    buf: heapless::String<PAGE_CAPACITY>,
}

impl StatusPage {
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        self.buf.as_str()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Render the response for `snapshot`.
pub fn render(snapshot: &StatusSnapshot) -> StatusPage {
    let mut buf: heapless::String<PAGE_CAPACITY> = heapless::String::new();
    // Cannot overflow: PAGE_CAPACITY covers the template at maximum field
    // widths (see `max_width_fields_fit`).
    let _ = write!(
        buf,
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Connection: close\r\n\
         \r\n\
         <!DOCTYPE html><html><head><meta charset='UTF-8'>\
         <meta http-equiv='refresh' content='{refresh}'>\
         <title>Water Leak Detector</title></head>\r\n\
         <body><h1>Water Leak Detector</h1>\r\n\
         <p>Pulses detected: {pulses}</p>\r\n\
         <p>Uptime: {uptime} seconds</p>\r\n\
         <h2>Status:</h2>\r\n\
         <p style='font-size:28px;color:{colour};'>{label}</p>\r\n\
         <p>This page refreshes every {refresh} seconds.</p>\r\n\
         </body></html>\r\n",
        refresh = REFRESH_INTERVAL_SECS,
        pulses = snapshot.pulse_count,
        uptime = snapshot.uptime_secs,
        colour = snapshot.colour(),
        label = snapshot.label(),
    );
    StatusPage { buf }
}
