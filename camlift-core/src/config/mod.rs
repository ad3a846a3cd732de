//! Configuration
//!
//! Lift configuration types and the `lift.toml` parser.

pub mod toml;
pub mod types;

pub use self::toml::{parse_config, ParseError};
pub use types::*;
