use std::sync::Arc;

use orchestrations_model::{ModelMessage, ModelProvider, ModelRequest};

use crate::Error;
use crate::checkpoint::Checkpointer;
use crate::conversation::Conversation;
use crate::model_client::ModelClient;

/// A multi-turn chat with the model, without tools.
///
/// Each successful turn appends the user message and the answer to the
/// history. A failed turn leaves the history untouched.
pub struct ChatSession {
    model_client: ModelClient,
    system_prompt: Option<String>,
    conversation: Conversation,
    checkpoint: Option<(Arc<dyn Checkpointer>, String)>,
    on_transcript: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl ChatSession {
    /// Returns the history of this session.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Sends one user message and returns the assistant's answer.
    pub async fn send_message<S: Into<String>>(
        &mut self,
        input: S,
    ) -> Result<String, Error> {
        let user_msg = ModelMessage::user(input);

        let mut messages = Vec::with_capacity(self.conversation.len() + 2);
        if let Some(prompt) = &self.system_prompt {
            messages.push(ModelMessage::system(prompt.as_str()));
        }
        messages.extend_from_slice(self.conversation.messages());
        messages.push(user_msg.clone());

        let on_transcript = self.on_transcript.clone();
        let resp = self
            .model_client
            .send_request(
                ModelRequest {
                    messages,
                    tools: vec![],
                },
                move |delta| {
                    if let Some(on_transcript) = &on_transcript {
                        on_transcript(&delta);
                    }
                },
            )
            .await?;
        if resp.message.has_tool_calls() {
            warn!("ignoring tool calls in a chat turn");
        }
        let answer = resp.message.content.clone();

        let len = self.conversation.len();
        self.conversation.push(user_msg);
        self.conversation
            .push(ModelMessage::assistant(resp.message.content));

        if let Some((checkpointer, thread_id)) = &self.checkpoint {
            if let Err(err) =
                checkpointer.put(thread_id, &self.conversation).await
            {
                error!("failed to save thread {thread_id}: {err}");
                self.conversation.truncate(len);
                return Err(err.into());
            }
        }
        Ok(answer)
    }
}

/// [`ChatSession`] builder.
pub struct ChatSessionBuilder {
    model_client: ModelClient,
    system_prompt: Option<String>,
    checkpoint: Option<(Arc<dyn Checkpointer>, String)>,
    on_transcript: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl ChatSessionBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            system_prompt: None,
            checkpoint: None,
            on_transcript: None,
        }
    }

    /// Sets a system prompt sent before the history on every turn.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Saves the history to `checkpointer` under `thread_id` after every
    /// turn, and restores it when the session is built.
    #[inline]
    pub fn with_checkpointer<C, S>(
        mut self,
        checkpointer: C,
        thread_id: S,
    ) -> Self
    where
        C: Checkpointer + 'static,
        S: Into<String>,
    {
        self.checkpoint = Some((Arc::new(checkpointer), thread_id.into()));
        self
    }

    /// Attaches a callback to be invoked with every streamed text delta.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_transcript = Some(Arc::new(on_transcript));
        self
    }

    /// Builds the session, restoring its thread if one was saved.
    pub async fn build(self) -> Result<ChatSession, Error> {
        let Self {
            model_client,
            system_prompt,
            checkpoint,
            on_transcript,
        } = self;

        let conversation = match &checkpoint {
            Some((checkpointer, thread_id)) => {
                let restored = checkpointer.get(thread_id).await?;
                if let Some(restored) = &restored {
                    debug!(
                        "restored {} messages from thread {thread_id}",
                        restored.len()
                    );
                }
                restored.unwrap_or_default()
            }
            None => Conversation::default(),
        };

        Ok(ChatSession {
            model_client,
            system_prompt,
            conversation,
            checkpoint,
            on_transcript,
        })
    }
}

#[cfg(test)]
mod tests {
    use orchestrations_model::ErrorKind;
    use orchestrations_test_model::{PresetResponse, TestModelProvider};

    use super::*;
    use crate::checkpoint::MemoryCheckpointer;

    #[tokio::test]
    async fn test_multi_turn() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_assistant_turn(PresetResponse::text("Hi Ana!"));
        model_provider
            .add_assistant_turn(PresetResponse::text("Your name is Ana."));

        let mut session =
            ChatSessionBuilder::with_model_provider(model_provider.clone())
                .build()
                .await
                .unwrap();
        assert_eq!(session.send_message("I am Ana.").await.unwrap(), "Hi Ana!");
        assert_eq!(
            session.send_message("What is my name?").await.unwrap(),
            "Your name is Ana."
        );
        assert_eq!(session.conversation().len(), 4);

        let requests = model_provider.requests();
        assert_eq!(
            requests[1].messages,
            [
                ModelMessage::user("I am Ana."),
                ModelMessage::assistant("Hi Ana!"),
                ModelMessage::user("What is my name?"),
            ]
        );
        assert!(requests[1].tools.is_empty());
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_history() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_assistant_turn(PresetResponse::text("Hello!"));
        model_provider.add_failed_turn(ErrorKind::Moderated);

        let mut session =
            ChatSessionBuilder::with_model_provider(model_provider)
                .with_system_prompt("Be brief.")
                .build()
                .await
                .unwrap();
        session.send_message("Hi").await.unwrap();
        let err = session.send_message("Say something bad").await.unwrap_err();

        assert_eq!(err.model_error_kind(), Some(ErrorKind::Moderated));
        assert_eq!(
            session.conversation().messages(),
            [ModelMessage::user("Hi"), ModelMessage::assistant("Hello!")]
        );
    }

    #[tokio::test]
    async fn test_blank_message() {
        let mut model_provider = TestModelProvider::default();
        model_provider
            .add_assistant_turn(PresetResponse::text("How can I help?"));

        let mut session =
            ChatSessionBuilder::with_model_provider(model_provider.clone())
                .build()
                .await
                .unwrap();
        assert_eq!(session.send_message("").await.unwrap(), "How can I help?");
        assert_eq!(
            model_provider.requests()[0].messages,
            [ModelMessage::user("")]
        );
        assert_eq!(session.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_restore_thread() {
        let checkpointer = MemoryCheckpointer::new();

        let mut model_provider = TestModelProvider::default();
        model_provider.add_assistant_turn(PresetResponse::text("Hi Ana!"));
        model_provider
            .add_assistant_turn(PresetResponse::text("Your name is Ana."));

        let mut session =
            ChatSessionBuilder::with_model_provider(model_provider.clone())
                .with_checkpointer(checkpointer.clone(), "1")
                .build()
                .await
                .unwrap();
        session.send_message("I am Ana.").await.unwrap();
        drop(session);

        let mut session =
            ChatSessionBuilder::with_model_provider(model_provider.clone())
                .with_checkpointer(checkpointer.clone(), "1")
                .build()
                .await
                .unwrap();
        assert_eq!(session.conversation().len(), 2);
        assert_eq!(
            session.send_message("What is my name?").await.unwrap(),
            "Your name is Ana."
        );

        let other = ChatSessionBuilder::with_model_provider(model_provider)
            .with_checkpointer(checkpointer.clone(), "2")
            .build()
            .await
            .unwrap();
        assert!(other.conversation().is_empty());

        let saved = checkpointer.get("1").await.unwrap().unwrap();
        assert_eq!(saved.len(), 4);
    }
}
