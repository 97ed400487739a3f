mod builder;
mod routing;

use std::sync::Arc;

use orchestrations_model::{ModelMessage, ModelRequest};

use crate::Error;
use crate::conversation::Conversation;
use crate::model_client::ModelClient;
use crate::tool::Executor as ToolExecutor;
pub use builder::AgentBuilder;
pub use routing::{Node, route};

/// The default number of node executions allowed in one run.
pub const DEFAULT_STEP_LIMIT: usize = 25;

/// The instruction that precedes every websearch conversation.
pub const SEARCH_SYSTEM_PROMPT: &str = "You are a helpful assistant that can \
search the web for information. Use the search tool to find relevant \
information when needed. Always cite your sources and provide a concise \
summary of the information you find.";

pub(crate) type TranscriptFn = Arc<dyn Fn(&str) + Send + Sync>;

/// The websearch agent.
///
/// A run alternates between calling the model and executing the tools it
/// asks for, until the model answers without requesting any tool. Steps
/// never mutate the conversation they are given; they return the messages
/// to append and the loop appends them in order.
pub struct Agent {
    pub(crate) model_client: ModelClient,
    pub(crate) tool_executor: ToolExecutor,
    pub(crate) system_prompt: Option<String>,
    pub(crate) step_limit: Option<usize>,
    pub(crate) on_transcript: Option<TranscriptFn>,
}

/// The outcome of a finished run.
#[derive(Clone, Debug)]
pub struct AgentRun {
    /// Every message of the run, starting with the user input.
    pub conversation: Conversation,
    /// How many times the model was called.
    pub agent_steps: usize,
    /// How many times tools were executed.
    pub tool_steps: usize,
}

impl AgentRun {
    /// Returns the content of the last assistant message.
    #[inline]
    pub fn answer(&self) -> Option<&str> {
        self.conversation
            .last_assistant()
            .map(|msg| msg.content.as_str())
    }

    /// Returns the total number of steps executed.
    #[inline]
    pub fn steps(&self) -> usize {
        self.agent_steps + self.tool_steps
    }
}

impl Agent {
    /// Returns the step limit, or `None` if the loop is unbounded.
    #[inline]
    pub fn step_limit(&self) -> Option<usize> {
        self.step_limit
    }

    /// Runs the loop for a single user input.
    pub async fn run<S: Into<String>>(
        &self,
        input: S,
    ) -> Result<AgentRun, Error> {
        self.resume(Conversation::with_user_input(input)).await
    }

    /// Runs the loop on an existing conversation, starting with a model
    /// call.
    pub async fn resume(
        &self,
        conversation: Conversation,
    ) -> Result<AgentRun, Error> {
        let mut run = AgentRun {
            conversation,
            agent_steps: 0,
            tool_steps: 0,
        };

        let mut node = Node::Agent;
        while node != Node::End {
            if let Some(limit) = self.step_limit {
                if run.steps() >= limit {
                    warn!("stopping after {limit} steps without an answer");
                    return Err(Error::StepLimitExceeded { limit });
                }
            }

            debug!("step {}: {node:?}", run.steps() + 1);
            node = match node {
                Node::Agent => {
                    let update =
                        self.call_model(run.conversation.messages()).await?;
                    run.conversation.push(update);
                    run.agent_steps += 1;
                    route(run.conversation.messages())
                }
                Node::Tools => {
                    let update =
                        self.call_tools(run.conversation.messages()).await;
                    run.conversation.extend(update);
                    run.tool_steps += 1;
                    Node::Agent
                }
                Node::End => Node::End,
            };
        }

        info!(
            "run finished after {} model calls and {} tool steps",
            run.agent_steps, run.tool_steps
        );
        Ok(run)
    }

    async fn call_model(
        &self,
        messages: &[ModelMessage],
    ) -> Result<ModelMessage, Error> {
        let mut request_messages = Vec::with_capacity(messages.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            request_messages.push(ModelMessage::system(prompt.as_str()));
        }
        request_messages.extend_from_slice(messages);

        let req = ModelRequest {
            messages: request_messages,
            tools: self.tool_executor.definitions(),
        };
        let on_transcript = self.on_transcript.clone();
        let resp = self
            .model_client
            .send_request(req, move |delta| {
                if let Some(on_transcript) = &on_transcript {
                    on_transcript(&delta);
                }
            })
            .await?;
        trace!("model finished with {:?}", resp.finish_reason);
        Ok(ModelMessage::Assistant(resp.message))
    }

    async fn call_tools(&self, messages: &[ModelMessage]) -> Vec<ModelMessage> {
        let Some(ModelMessage::Assistant(msg)) = messages.last() else {
            return vec![];
        };
        self.tool_executor
            .handle_requests(&msg.tool_calls)
            .await
            .into_iter()
            .map(ModelMessage::Tool)
            .collect()
    }
}
