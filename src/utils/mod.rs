//!
//! Utility module for the wallet sync engine.
//!
//! Re-exports amount formatting and quantity parsing helpers used throughout the codebase.
/// Utility functions for formatting and display
pub mod index;
/// Parsing of indexer quantities (decimal or `0x` hex strings)
pub mod quantity;

pub use index::format_token_amount;
pub use quantity::{parse_quantity, parse_quantity_u64};
