//! Logic shared by the import and export directions.

pub mod links;
pub mod style;
pub mod table;

/// Recursion ceiling for every tree walk. Reaching it truncates the subtree
/// being walked instead of failing.
pub const MAX_DEPTH: usize = 100;
