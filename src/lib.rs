// lib.rs

pub use std::time::Duration;

mod config;
pub use config::*;

mod state;
pub use state::*;

mod retry;
pub use retry::*;

mod wifi;
pub use wifi::*;

mod mqtt;
pub use mqtt::*;

mod sensor;
pub use sensor::*;

mod publisher;
pub use publisher::*;

mod actuator;
pub use actuator::*;

mod subscriber;
pub use subscriber::*;

pub const FW_VERSION: &str = env!("CARGO_PKG_VERSION");

// EOF
