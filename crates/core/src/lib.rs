//! Core logic including the websearch control loop, tool execution, chat
//! sessions and thread checkpoints.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
mod chat;
pub mod checkpoint;
pub mod conversation;
mod error;
mod model_client;
pub mod tool;

pub use agent::{
    Agent, AgentBuilder, AgentRun, DEFAULT_STEP_LIMIT, Node,
    SEARCH_SYSTEM_PROMPT, route,
};
pub use chat::{ChatSession, ChatSessionBuilder};
pub use error::Error;
