//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements          | Connects to              |
//! |-----------------|---------------------|--------------------------|
//! | `http_listener` | ConnectionListener  | lwIP / host TCP sockets  |
//! |                 | Connection          |                          |
//! | `log_sink`      | EventSink           | Serial log output        |
//! | `time`          | TimePort            | ESP32 high-res timer     |
//! | `wifi`          | LinkPort            | ESP-IDF WiFi STA         |

pub mod http_listener;
pub mod log_sink;
pub mod time;
pub mod wifi;
