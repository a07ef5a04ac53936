//! One-shot flow-sensor GPIO and interrupt setup.
//!
//! Configures the sensor pin as an input and registers the rising-edge ISR
//! using raw ESP-IDF sys calls.  Called once from `main()` before the
//! status loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::error::HwInitError;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── GPIO input ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_flow_input() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::FLOW_SENSOR_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        // The sensor drives the line; no internal pull.
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
    };
    // SAFETY: Called once from main() before the loop; single-threaded.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as esp_err_t {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    info!("hw_init: flow sensor input on GPIO{}", pins::FLOW_SENSOR_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_flow_input() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): flow input init skipped");
    Ok(())
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn flow_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: esp_timer_get_time is an RTC counter read; safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u64;
    crate::sensors::flow::flow_isr_handler(now_ms);
}

/// Install the GPIO ISR service and register the flow pulse handler.
/// Call after [`init_flow_input`].
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable).  The handler only
    // touches the critical-section-guarded pulse counter.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as esp_err_t && ret != ESP_ERR_INVALID_STATE as esp_err_t {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let ret = gpio_isr_handler_add(
            pins::FLOW_SENSOR_GPIO,
            Some(flow_gpio_isr),
            core::ptr::null_mut(),
        );
        if ret != ESP_OK as esp_err_t {
            return Err(HwInitError::IsrHandlerFailed(ret));
        }
        gpio_intr_enable(pins::FLOW_SENSOR_GPIO);
    }
    info!("hw_init: ISR service installed (flow, rising edge)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}

// ── Combined bring-up ─────────────────────────────────────────

/// Configure the sensor input and attach the pulse ISR.
pub fn init_flow_sensor() -> crate::error::Result<()> {
    init_flow_input()?;
    init_isr_service()?;
    Ok(())
}
