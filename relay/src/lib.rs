//! convrelay
//!
//! Conversational conversion relay: parses `<amount> <from> to <to>`
//! commands, converts physical units or currencies, and formats replies.

pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod reply;

pub use command::{parse, parse_command, Command};
pub use config::{BankConfig, LogFormat, RatesConfig, RelayConfig};
pub use dispatcher::ConversionDispatcher;
pub use error::{RelayError, RelayResult};
pub use metrics::{Metrics, MetricsSnapshot, SharedMetrics};
