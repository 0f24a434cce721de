//! Conversational registration.
//!
//! A seven-step sign-up flow: name, role, primary factory, its priority,
//! an optional second factory with its own priority, then a single user
//! record is written. Session state is ephemeral and lost on restart by
//! design.

mod flow;
mod session;

pub use flow::{RegistrationFlow, RegistrationOutcome};
pub use session::{
    InMemorySessionStore, RegistrationSession, RegistrationStep, SessionStore, TempFields,
};
