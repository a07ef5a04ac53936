//! Monotonic clock adapter.
//!
//! Implements [`TimePort`].
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` (the same
//!   counter the flow ISR timestamps with) and FreeRTOS task delay.
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` and
//!   `thread::sleep` for host-side simulation.

use crate::app::ports::TimePort;

/// Boot-relative millisecond clock.
pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot.  Also safe to call from ISR context.
    #[cfg(target_os = "espidf")]
    pub fn uptime_us() -> u64 {
        // SAFETY: esp_timer_get_time reads the RTC-backed high-resolution
        // timer; no preconditions, ISR-safe.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }
}

impl TimePort for MonotonicClock {
    #[cfg(target_os = "espidf")]
    fn now_ms(&self) -> u64 {
        Self::uptime_us() / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    #[cfg(target_os = "espidf")]
    fn delay_ms(&mut self, ms: u32) {
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
