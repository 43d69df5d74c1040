//! # Payment Access
//!
//! Contract-first access checks with a direct-transfer fallback.

pub mod matcher;
pub mod verifier;

pub use matcher::*;
pub use verifier::*;
