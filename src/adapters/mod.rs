//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to              |
//! |-------------|--------------------|--------------------------|
//! | `ble`       | LinkPort           | Bluedroid GATT server    |
//! | `hardware`  | SensorPort         | SCD30 over I2C           |
//! |             | ActuatorPort       | LEDC servo, LED GPIO     |
//! | `log_sink`  | EventSink          | Serial log output        |
//! | `nvs`       | StoragePort        | NVS / in-memory store    |
//! | `time`      | -                  | ESP32 system timer       |
//! | `device_id` | -                  | eFuse factory MAC        |

pub mod ble;
pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
