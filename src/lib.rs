//! param2json - converts legacy `.param` simulation parameter files to JSON
//!
//! The [`converter`] module holds the single-pass line converter; the other
//! modules supply the files to convert and report the results.

pub mod commands;
pub mod configuration;
pub mod converter;
pub mod errors;
pub mod manifest;

// Re-export commonly used types
pub use configuration::Settings;
pub use converter::{convert_str, ConvertStats, Converter, Dialect, ParamValue};
pub use errors::{ConvertError, Result};
pub use manifest::ConversionJob;
