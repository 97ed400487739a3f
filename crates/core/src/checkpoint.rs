//! Saving and restoring conversations by thread.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::conversation::Conversation;

/// Error type for checkpoint operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckpointError {
    /// The thread id was empty.
    ThreadIdRequired,
    /// The conversation could not be encoded or decoded.
    Serialization(String),
    /// The backing storage failed.
    Storage(String),
}

impl Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::ThreadIdRequired => {
                write!(f, "thread id required")
            }
            CheckpointError::Serialization(msg) => {
                write!(f, "serialization: {msg}")
            }
            CheckpointError::Storage(msg) => write!(f, "storage: {msg}"),
        }
    }
}

impl StdError for CheckpointError {}

/// Saves and loads the latest conversation of a thread.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Replaces the saved conversation of the thread.
    async fn put(
        &self,
        thread_id: &str,
        conversation: &Conversation,
    ) -> Result<(), CheckpointError>;

    /// Loads the saved conversation of the thread, if any.
    async fn get(
        &self,
        thread_id: &str,
    ) -> Result<Option<Conversation>, CheckpointError>;
}

/// A checkpointer that keeps threads in memory.
///
/// Nothing survives the process. Clones share the same threads.
#[derive(Clone, Default)]
pub struct MemoryCheckpointer {
    threads: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryCheckpointer {
    /// Creates an empty checkpointer.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ids of all saved threads, sorted.
    pub async fn thread_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> =
            self.threads.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl Checkpointer for MemoryCheckpointer {
    async fn put(
        &self,
        thread_id: &str,
        conversation: &Conversation,
    ) -> Result<(), CheckpointError> {
        if thread_id.is_empty() {
            return Err(CheckpointError::ThreadIdRequired);
        }
        let value = serde_json::to_value(conversation)
            .map_err(|err| CheckpointError::Serialization(err.to_string()))?;
        self.threads.write().await.insert(thread_id.to_owned(), value);
        trace!("saved {} messages to thread {thread_id}", conversation.len());
        Ok(())
    }

    async fn get(
        &self,
        thread_id: &str,
    ) -> Result<Option<Conversation>, CheckpointError> {
        if thread_id.is_empty() {
            return Err(CheckpointError::ThreadIdRequired);
        }
        let Some(value) = self.threads.read().await.get(thread_id).cloned()
        else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|err| CheckpointError::Serialization(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use orchestrations_model::ModelMessage;

    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let checkpointer = MemoryCheckpointer::new();
        assert_eq!(checkpointer.get("1").await, Ok(None));

        let conversation = Conversation::from_messages(vec![
            ModelMessage::user("Hi"),
            ModelMessage::assistant("Hello!"),
        ]);
        checkpointer.put("1", &conversation).await.unwrap();
        assert_eq!(checkpointer.get("1").await, Ok(Some(conversation.clone())));
        assert_eq!(checkpointer.get("2").await, Ok(None));

        let shared = checkpointer.clone();
        shared
            .put("2", &Conversation::with_user_input("Bye"))
            .await
            .unwrap();
        assert_eq!(checkpointer.thread_ids().await, ["1", "2"]);
    }

    #[tokio::test]
    async fn test_thread_id_required() {
        let checkpointer = MemoryCheckpointer::new();
        assert_eq!(
            checkpointer.put("", &Conversation::default()).await,
            Err(CheckpointError::ThreadIdRequired)
        );
        assert_eq!(
            checkpointer.get("").await,
            Err(CheckpointError::ThreadIdRequired)
        );
    }
}
