//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements           | Connects to              |
//! |------------|----------------------|--------------------------|
//! | `hardware` | SensorPort           | ESP32 ADC1               |
//! |            | ActuatorPort         | Relay GPIO               |
//! | `log_sink` | EventSink            | Serial log output        |
//! | `mqtt`     | MessagingPort        | ESP-IDF MQTT client      |
//! |            | SessionPort          |                          |
//! | `nvs`      | StoragePort          | NVS / in-memory store    |
//! | `system`   | RestartPort          | `esp_restart()`          |
//! | `time`     | ClockPort, DelayNs   | ESP32 system timer       |
//! | `wifi`     | LinkPort             | ESP-IDF WiFi STA         |

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod system;
pub mod time;
pub mod wifi;
