//! # Patrol Channels
//!
//! Message routing and delivery for the patrol bot:
//! - MessageRouter: the command surface, admin gating, and registration
//!   dispatch
//! - LineDispatcher: LINE Messaging API delivery
//! - LogDispatcher: tracing-only delivery for tokenless local runs

mod line;
mod log;
mod router;

pub use line::LineDispatcher;
pub use log::LogDispatcher;
pub use router::{ChannelError, MessageRouter};
