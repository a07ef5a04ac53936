//! YF-S201 hall-effect water flow sensor: pulse counter.
//!
//! The sensor outputs one pulse per ~2.22 mL of water.  The GPIO ISR calls
//! [`flow_isr_handler`] on every rising edge, which records the pulse and
//! its timestamp in [`FLOW_PULSES`].  The main loop reads both fields with
//! [`PulseCounter::snapshot`].
//!
//! Both sides go through `critical_section::with`.  On ESP-IDF that masks
//! interrupts (and takes the cross-core spinlock), so the ISR cannot land
//! between the two field reads and the snapshot never pairs a new count
//! with an old timestamp.  The critical section covers the field copy
//! only; callers evaluate and render outside it.

use core::cell::Cell;

use critical_section::Mutex;

/// A consistent copy of the counter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseSnapshot {
    /// Pulses seen since boot (wraps after `u32::MAX`).
    pub count: u32,
    /// Monotonic boot-relative time of the most recent pulse.  Stays at 0
    /// (boot) until the first pulse arrives.
    pub last_pulse_ms: u64,
}

impl PulseSnapshot {
    const BOOT: Self = Self {
        count: 0,
        last_pulse_ms: 0,
    };
}

/// ISR-written, main-loop-read pulse counter.
///
/// Exposes exactly one producer operation ([`on_pulse`](Self::on_pulse))
/// and one consumer operation ([`snapshot`](Self::snapshot)); nothing else
/// can touch the fields.
pub struct PulseCounter {
    state: Mutex<Cell<PulseSnapshot>>,
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseCounter {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(PulseSnapshot::BOOT)),
        }
    }

    /// Record one pulse observed at `now_ms`.
    ///
    /// ISR-safe: bounded, no allocation, no logging.  A timestamp older
    /// than the stored one is clamped so `last_pulse_ms` never goes back.
    pub fn on_pulse(&self, now_ms: u64) {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let prev = cell.get();
            cell.set(PulseSnapshot {
                count: prev.count.wrapping_add(1),
                last_pulse_ms: prev.last_pulse_ms.max(now_ms),
            });
        });
    }

    /// Copy both fields with the pulse interrupt excluded.
    pub fn snapshot(&self) -> PulseSnapshot {
        critical_section::with(|cs| self.state.borrow(cs).get())
    }
}

/// The board's single flow counter.  `static` because ISR callbacks in
/// ESP-IDF cannot capture closures.
pub static FLOW_PULSES: PulseCounter = PulseCounter::new();

/// Called from the GPIO ISR on each rising edge of the flow sensor.
///
/// `now_ms` must come from the same clock the main loop uses
/// (`esp_timer_get_time() / 1000`).
pub fn flow_isr_handler(now_ms: u64) {
    FLOW_PULSES.on_pulse(now_ms);
}
