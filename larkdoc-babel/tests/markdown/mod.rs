//! Markdown format tests
//!
//! Tests for bidirectional Markdown ↔ block tree conversion.

mod export;
mod mentions;
mod table;
