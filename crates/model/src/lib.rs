//! Provider-agnostic types for talking to chat models.
//!
//! Every flow in this workspace speaks to the model through the types
//! defined here, so swapping the hosted endpoint for another provider (or
//! for a scripted one in tests) never touches the control loop.
//!
//! The crate only describes data and contracts. Transport, retries and
//! bookkeeping belong to the implementors and their callers.

#![deny(missing_docs)]

mod error;
mod message;
mod provider;
mod request;
mod response;

pub use error::*;
pub use message::*;
pub use provider::*;
pub use request::*;
pub use response::*;
