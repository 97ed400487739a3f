//! Conversation-related types.

use orchestrations_model::{AssistantMessage, ModelMessage};
use serde::{Deserialize, Serialize};

/// An ordered, append-only list of messages.
///
/// A conversation belongs to exactly one control loop run or chat session.
/// Only this crate appends to it; callers get read access.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<ModelMessage>,
}

impl Conversation {
    /// Creates a conversation that starts with one user message.
    #[inline]
    pub fn with_user_input<S: Into<String>>(input: S) -> Self {
        Self {
            messages: vec![ModelMessage::user(input)],
        }
    }

    /// Creates a conversation from existing history.
    #[inline]
    pub fn from_messages(messages: Vec<ModelMessage>) -> Self {
        Self { messages }
    }

    /// Returns all messages in order.
    #[inline]
    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    /// Returns the most recent message.
    #[inline]
    pub fn last(&self) -> Option<&ModelMessage> {
        self.messages.last()
    }

    /// Returns the most recent assistant message, wherever it is.
    pub fn last_assistant(&self) -> Option<&AssistantMessage> {
        self.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::Assistant(msg) => Some(msg),
            _ => None,
        })
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if there are no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consumes the conversation and returns its messages.
    #[inline]
    pub fn into_messages(self) -> Vec<ModelMessage> {
        self.messages
    }

    #[inline]
    pub(crate) fn push(&mut self, msg: ModelMessage) {
        self.messages.push(msg);
    }

    #[inline]
    pub(crate) fn extend(&mut self, msgs: impl IntoIterator<Item = ModelMessage>) {
        self.messages.extend(msgs);
    }

    #[inline]
    pub(crate) fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use orchestrations_model::ToolCallResult;

    use super::*;

    #[test]
    fn test_last_assistant_skips_tool_results() {
        let mut conversation = Conversation::with_user_input("Hi");
        assert!(conversation.last_assistant().is_none());

        conversation.push(ModelMessage::assistant("Hello!"));
        conversation.push(ModelMessage::Tool(ToolCallResult {
            id: "call_0".to_owned(),
            content: "[]".to_owned(),
        }));
        assert_eq!(conversation.last_assistant().unwrap().content, "Hello!");
        assert!(matches!(conversation.last(), Some(ModelMessage::Tool(_))));
    }

    #[test]
    fn test_serialized_as_message_list() {
        let conversation = Conversation::from_messages(vec![
            ModelMessage::user("Hi"),
            ModelMessage::assistant("Hello!"),
        ]);
        let value = serde_json::to_value(&conversation).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        let back: Conversation = serde_json::from_value(value).unwrap();
        assert_eq!(back, conversation);
    }
}
