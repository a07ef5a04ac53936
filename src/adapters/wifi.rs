//! WiFi station-mode link adapter.
//!
//! Implements [`LinkPort`]: the network link the status loop checks
//! every iteration.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via
//!   `esp_idf_svc::wifi::BlockingWifi`.
//! - **all other targets**: simulation with a controllable link for
//!   host-side tests.
//!
//! ## Reconnection policy
//!
//! The adapter never retries on its own.  The status loop calls
//! [`LinkPort::reconnect`] once per iteration while the link is down and
//! sleeps a fixed backoff in between.

use core::cell::Cell;
use core::net::Ipv4Addr;

use log::{info, warn};

use crate::app::ports::LinkPort;
use crate::error::LinkError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), LinkError> {
    if ssid.is_empty() {
        return Err(LinkError::NoCredentials);
    }
    if ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(LinkError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), LinkError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(LinkError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi link
// ───────────────────────────────────────────────────────────────

pub struct WifiLink {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    /// Attempts in the current outage; cleared once the link reads up.
    reconnect_attempts: Cell<u32>,

    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,

    /// Simulation: whether the fake link is up.
    #[cfg(not(target_os = "espidf"))]
    sim_up: bool,
    /// Simulation: reconnect attempts that should still fail.
    #[cfg(not(target_os = "espidf"))]
    sim_failures_left: u32,
}

impl WifiLink {
    // ── Constructors (platform-specific) ──────────────────────

    /// Wrap an already-constructed driver.  Validates the credentials but
    /// does not associate; call [`connect`](Self::connect) next.
    #[cfg(target_os = "espidf")]
    pub fn new(
        wifi: BlockingWifi<EspWifi<'static>>,
        ssid: &str,
        password: &str,
    ) -> Result<Self, LinkError> {
        let (ssid, password) = Self::credentials(ssid, password)?;
        Ok(Self {
            ssid,
            password,
            reconnect_attempts: Cell::new(0),
            wifi,
        })
    }

    /// Create a simulated link (starts down).
    #[cfg(not(target_os = "espidf"))]
    pub fn new(ssid: &str, password: &str) -> Result<Self, LinkError> {
        let (ssid, password) = Self::credentials(ssid, password)?;
        Ok(Self {
            ssid,
            password,
            reconnect_attempts: Cell::new(0),
            sim_up: false,
            sim_failures_left: 0,
        })
    }

    fn credentials(
        ssid: &str,
        password: &str,
    ) -> Result<(heapless::String<32>, heapless::String<64>), LinkError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut s: heapless::String<32> = heapless::String::new();
        s.push_str(ssid).map_err(|()| LinkError::InvalidSsid)?;
        let mut p: heapless::String<64> = heapless::String::new();
        p.push_str(password).map_err(|()| LinkError::InvalidPassword)?;
        Ok((s, p))
    }

    /// SSID this link associates with.
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Reconnect attempts since the link was last seen up.
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.get()
    }

    /// No password configured; associate without authentication.
    pub fn is_open_network(&self) -> bool {
        self.password.is_empty()
    }

    // ── Initial association ───────────────────────────────────

    /// Configure, start and associate, blocking until the interface has
    /// an address.
    #[cfg(target_os = "espidf")]
    pub fn connect(&mut self) -> Result<(), LinkError> {
        let auth_method = if self.is_open_network() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|()| LinkError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|()| LinkError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        self.wifi
            .set_configuration(&config)
            .map_err(|_| LinkError::DriverFailed)?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|_| LinkError::DriverFailed)?;
            info!("WiFi: driver started");
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        self.wifi.connect().map_err(|_| LinkError::ConnectFailed)?;
        self.wifi.wait_netif_up().map_err(|_| LinkError::ConnectFailed)?;
        self.reconnect_attempts.set(0);
        info!("WiFi: connected, ip={:?}", self.local_ip());
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn connect(&mut self) -> Result<(), LinkError> {
        self.sim_up = true;
        self.reconnect_attempts.set(0);
        let auth = if self.is_open_network() { "open" } else { "WPA2" };
        info!("WiFi(sim): connected to '{}' ({})", self.ssid, auth);
        Ok(())
    }

    // ── Simulation controls ───────────────────────────────────

    /// Force the simulated link up or down.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_sim_link(&mut self, up: bool) {
        self.sim_up = up;
    }

    /// Make the next `n` reconnect attempts fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn fail_next_reconnects(&mut self, n: u32) {
        self.sim_failures_left = n;
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_up
    }

    #[cfg(target_os = "espidf")]
    fn platform_reconnect(&mut self) -> Result<(), LinkError> {
        // Non-blocking: kicks off association; the loop's backoff covers
        // the time it takes to complete.
        self.wifi
            .wifi_mut()
            .connect()
            .map_err(|_| LinkError::ConnectFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_reconnect(&mut self) -> Result<(), LinkError> {
        if self.sim_failures_left > 0 {
            self.sim_failures_left -= 1;
            return Err(LinkError::ConnectFailed);
        }
        self.sim_up = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_local_ip(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
            .filter(|ip| !ip.is_unspecified())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_local_ip(&self) -> Option<Ipv4Addr> {
        self.sim_up.then_some(Ipv4Addr::new(192, 168, 4, 2))
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort
// ───────────────────────────────────────────────────────────────

impl LinkPort for WifiLink {
    fn is_connected(&self) -> bool {
        let up = self.platform_is_connected();
        if up {
            let attempts = self.reconnect_attempts.replace(0);
            if attempts > 0 {
                info!("WiFi: link up after {} reconnect attempt(s)", attempts);
            }
        }
        up
    }

    fn reconnect(&mut self) -> Result<(), LinkError> {
        let attempt = self.reconnect_attempts.get().saturating_add(1);
        self.reconnect_attempts.set(attempt);
        info!("WiFi: reconnect attempt {}", attempt);
        let result = self.platform_reconnect();
        if let Err(e) = result {
            warn!("WiFi: reconnect attempt {} failed: {}", attempt, e);
        }
        result
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        self.platform_local_ip()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
