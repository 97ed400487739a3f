//! Websearch and chat flows over a hosted chat model and Tavily search.
//!
//! The crate includes two CLI tools, `websearch` and `chatbot`. The pieces
//! they are made of are also usable as a library.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod config;
pub mod prompt;
pub mod tools;

/// Re-exports of [`orchestrations_core`] crate.
pub mod core {
    pub use orchestrations_core::*;
}
