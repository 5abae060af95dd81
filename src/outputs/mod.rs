//! Output generation.
//!
//! - [`json`]: writes a [`crate::models::MatchNews`] document for the
//!   reporting tool
//!
//! Without an output directory the binary prints the same document to stdout.

pub mod json;
