//! Key/value storage contracts, JSON codec helpers and the safe-set store.

pub mod codec;
pub mod error;
pub mod store;
pub mod tiers;
