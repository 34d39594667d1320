//! Write policy for file-backed stores.

mod durability;

pub use durability::DurabilityMode;
