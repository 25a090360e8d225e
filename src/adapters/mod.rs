//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements            | Connects to                 |
//! |----------------|-----------------------|-----------------------------|
//! | `config_file`  | ConfigPort            | JSON file on disk           |
//! | `log_sink`     | EventSink             | Console log                 |
//! |                | DisplaySink, AudioSink| Console stand-in outputs    |
//! | `serial`       | DeviceLink            | USB serial microcontroller  |
//! | `stdin_quit`   | QuitSignal            | Operator terminal           |
//! | `thread_clock` | Clock                 | Worker threads + channel    |

pub mod config_file;
pub mod log_sink;
#[cfg(feature = "host")]
pub mod serial;
pub mod stdin_quit;
pub mod thread_clock;
