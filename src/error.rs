//! Unified error types for the FlowWatch firmware.
//!
//! Each port has its own small error enum so adapters stay decoupled;
//! they all convert into [`Error`] for the boot path (sensor bring-up,
//! config load, WiFi association).  All
//! variants are `Copy` so the control loop can hand them to the event
//! sink without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Boot-time failure from any subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The network link is unavailable or could not be brought up.
    Link(LinkError),
    /// Delivering bytes to a client failed.
    Connection(ConnectionError),
    /// Configuration is invalid or could not be parsed.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    HwInit(HwInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Connection(e) => write!(f, "connection: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::HwInit(e) => write!(f, "hw init: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No SSID configured at build time.
    NoCredentials,
    /// SSID must be 1-32 printable ASCII bytes.
    InvalidSsid,
    /// Password must be empty (open network) or 8-64 bytes.
    InvalidPassword,
    /// The driver reported a failure while associating.
    ConnectFailed,
    /// The driver itself could not be started.
    DriverFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes, or empty for open)"),
            Self::ConnectFailed => write!(f, "WiFi connection failed"),
            Self::DriverFailed => write!(f, "WiFi driver failure"),
        }
    }
}

impl std::error::Error for LinkError {}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Connection errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    /// Socket-level I/O failure (reset, broken pipe, timeout).
    Io,
    /// The peer accepted zero bytes; treated as a dead connection.
    WriteZero,
    /// The connection was already closed.
    Closed,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "socket I/O error"),
            Self::WriteZero => write!(f, "peer accepted zero bytes"),
            Self::Closed => write!(f, "connection already closed"),
        }
    }
}

impl std::error::Error for ConnectionError {}

impl From<ConnectionError> for Error {
    fn from(e: ConnectionError) -> Self {
        Self::Connection(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The override document is not valid JSON for [`SystemConfig`](crate::config::SystemConfig).
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "config document malformed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Peripheral init errors
// ---------------------------------------------------------------------------

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrHandlerFailed(i32),
}

impl fmt::Display for HwInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrHandlerFailed(rc) => write!(f, "GPIO ISR handler registration failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::HwInit(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
