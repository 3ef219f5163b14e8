//! convrelay Common Types
//!
//! Shared types used across the convrelay crates: currency codes, the
//! conversion request/result pair exchanged with the host, request
//! identifiers, and the clock abstraction used for cache expiry.

pub mod currency;
pub mod conversion;
pub mod identifiers;
pub mod time;

pub use currency::*;
pub use conversion::*;
pub use identifiers::*;
pub use time::*;
