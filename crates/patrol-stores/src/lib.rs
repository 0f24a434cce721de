//! # Patrol Stores
//!
//! Record store implementations for the patrol runtime:
//! - MemoryStore: order-preserving in-memory collections for development
//!   and testing
//! - JsonStore: four flat JSON array files, rewritten in full after every
//!   mutation
//!
//! Both implement the four store traits from patrol-core. Ids are assigned
//! from a counter seeded with the max id seen at load, so deleting a
//! record never frees its id for reuse within a process lifetime.

mod json;
mod memory;

pub use json::JsonStore;
pub use memory::MemoryStore;

// Re-export core traits for convenience
pub use patrol_core::store::{EquipmentStore, FactoryStore, StoreError, TaskStore, UserStore};
