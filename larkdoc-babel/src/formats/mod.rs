//! Format implementations
//!
//! Markdown is the only text representation the block model is converted to and from.

pub mod markdown;
