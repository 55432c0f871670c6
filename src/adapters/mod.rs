//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements        | Connects to                     |
//! |---------------|-------------------|---------------------------------|
//! | `hardware`    | FrontEndPort      | Heater / clamp / bias pins      |
//! |               | SettleTimerPort   | esp_timer one-shot              |
//! |               | AdcPort           | ADC1 oneshot burst              |
//! | `hid`         | HidPort           | Holder, lever, target buttons   |
//! | `log_display` | DisplayPort       | Serial log output               |
//! | `log_sink`    | EventSink         | Serial log output               |
//! | `time`        | TickSource        | ESP32 system timer              |

pub mod hardware;
pub mod hid;
pub mod log_display;
pub mod log_sink;
pub mod time;
