//! convrelay Units
//!
//! Static catalog of length, mass and volume units with their SI scale
//! factors, and a converter that refuses to mix categories.
//!
//! # Example
//!
//! ```rust
//! use convrelay_units::UnitConverter;
//!
//! let converter = UnitConverter::default();
//! assert_eq!(converter.convert(5.0, "km", "m"), Some(5000.0));
//! assert_eq!(converter.convert(5.0, "kg", "m"), None);
//! ```

pub mod catalog;
pub mod converter;

pub use catalog::{UnitCatalog, UnitCategory, UnitDef};
pub use converter::UnitConverter;
