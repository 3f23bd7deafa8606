//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements      | Connects to                     |
//! |---------------|-----------------|---------------------------------|
//! | `device_id`   | -               | eFuse MAC → device serial       |
//! | `http_client` | ChunkTransport  | ESP-IDF HTTPS client + CA bundle|
//! | `nvs`         | KvStorePort     | NVS / in-memory store           |
//! | `uart`        | ConsolePort     | UART driver / in-memory line    |
//! | `wifi`        | WifiPort        | ESP-IDF WiFi STA / scripted sim |

pub mod device_id;
pub mod http_client;
pub mod nvs;
pub mod uart;
pub mod wifi;
