//! Protocol-level address types shared across the cache layer.

pub mod types;

pub use types::*;
