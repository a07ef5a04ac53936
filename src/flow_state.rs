//! Flow-active derivation.
//!
//! Pulses only ever *assert* flow; the sensor has no "stopped" signal.
//! Flow is considered stopped once no pulse has arrived for the timeout
//! window.  The state is recomputed from a fresh counter snapshot on every
//! request and never stored.

/// Derived flow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowState {
    pub active: bool,
}

impl FlowState {
    /// Evaluate the state at `now_ms` given the last pulse time.
    pub fn evaluate(last_pulse_ms: u64, now_ms: u64, timeout_ms: u64) -> Self {
        Self {
            active: evaluate(last_pulse_ms, now_ms, timeout_ms),
        }
    }
}

/// `true` iff `now_ms - last_pulse_ms <= timeout_ms`.
///
/// A pulse timestamp later than `now_ms` (the ISR fired between the clock
/// read and the snapshot) counts as zero elapsed time.
pub fn evaluate(last_pulse_ms: u64, now_ms: u64, timeout_ms: u64) -> bool {
    now_ms.saturating_sub(last_pulse_ms) <= timeout_ms
}
