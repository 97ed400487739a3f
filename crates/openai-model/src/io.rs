//! Byte and event streams for the streaming completion endpoint.

mod chunks;
mod sse;

pub use chunks::{Chunks, Error as ChunksError};
pub use sse::Sse;
