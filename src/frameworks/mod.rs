// Frameworks layer: runtime bootstrap, configuration and the WebSocket transport.

pub mod agent;
pub mod config;
pub mod roster;
#[cfg(feature = "tls")]
pub mod tls;
