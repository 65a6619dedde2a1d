pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use frameworks::agent::run_with_config;
pub use interface_adapters::protocol::{DecodeError, decode_server_message, encode_client_message};
pub use use_cases::decide::decide;
