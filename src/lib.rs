//! wifiscan: discovers nearby Wi-Fi networks, ranks them by signal strength
//! and supervises timeout-bounded connection attempts.
//!
//! The [`Engine`] owns a periodic [`scanner::ScanScheduler`] and a
//! [`supervisor::ConnectionSupervisor`] that share one serialized radio
//! handle. Both report through a non-blocking [`notify::EventStream`].

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod network;
pub mod notify;
pub mod radio;
pub mod scanner;
pub mod store;
pub mod supervisor;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{ConfigError, EngineError, StoreError, WifiError, WifiResult};
pub use network::{RankedNetwork, aggregate};
pub use notify::{Event, EventStream, Notifier};
pub use radio::{LinkStatus, NetworkObservation, Radio};
pub use supervisor::SupervisorState;
