//! # Chain Data Structures
//!
//! Records read back from the native chain: transfers seen by the indexer,
//! content listings and payments held by the paywall contract.

pub mod content;
pub mod transaction;

pub use content::*;
pub use transaction::*;
