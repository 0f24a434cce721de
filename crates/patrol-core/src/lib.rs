//! # Patrol Core
//!
//! Core abstractions and deterministic logic for the patrol inspection bot.
//!
//! This crate contains:
//! - User / Factory / Equipment / Task definitions
//! - Record store and message dispatcher abstractions
//! - The conversational registration state machine
//! - Directory CRUD and the daily assignment engine
//!
//! This crate does NOT care about:
//! - How messages arrive (webhook transport)
//! - How records hit disk (see patrol-stores)
//! - Delivery mechanics of replies and pushes (see patrol-channels)

pub mod assign;
pub mod directory;
pub mod dispatch;
pub mod registration;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::assign::{AssignmentEngine, ROUTINE_INSPECTION};
    pub use crate::directory::DirectoryService;
    pub use crate::dispatch::{DispatchError, MessageDispatcher};
    pub use crate::registration::{
        InMemorySessionStore, RegistrationFlow, RegistrationOutcome, RegistrationSession,
        RegistrationStep, SessionStore, TempFields,
    };
    pub use crate::store::{EquipmentStore, FactoryStore, StoreError, TaskStore, UserStore};
    pub use crate::types::{
        Equipment, EquipmentId, NewTask, Priority, Role, Task, TaskId, TaskStatus, User, UserId,
    };
}

// Re-export key types at crate root
pub use assign::{AssignmentEngine, ROUTINE_INSPECTION};
pub use directory::DirectoryService;
pub use dispatch::{DispatchError, MessageDispatcher};
pub use registration::{RegistrationFlow, RegistrationOutcome, SessionStore};
pub use store::{EquipmentStore, FactoryStore, StoreError, TaskStore, UserStore};
pub use types::{Equipment, NewTask, Priority, Role, Task, TaskStatus, User};
