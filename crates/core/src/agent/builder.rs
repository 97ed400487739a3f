use std::sync::Arc;

use orchestrations_model::ModelProvider;

use super::{Agent, DEFAULT_STEP_LIMIT, SEARCH_SYSTEM_PROMPT, TranscriptFn};
use crate::model_client::ModelClient;
use crate::tool::{AnyTool, Executor as ToolExecutor, Tool, ToolObject};

/// [`Agent`] builder.
pub struct AgentBuilder {
    model_client: ModelClient,
    system_prompt: Option<String>,
    step_limit: Option<usize>,
    on_transcript: Option<TranscriptFn>,
    tools: Vec<Box<dyn ToolObject>>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    ///
    /// The agent starts with the search system prompt and a limit of
    /// [`DEFAULT_STEP_LIMIT`] steps.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            system_prompt: Some(SEARCH_SYSTEM_PROMPT.to_owned()),
            step_limit: Some(DEFAULT_STEP_LIMIT),
            on_transcript: None,
            tools: vec![],
        }
    }

    /// Replaces the system prompt.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sends requests without a system prompt.
    #[inline]
    pub fn without_system_prompt(mut self) -> Self {
        self.system_prompt = None;
        self
    }

    /// Sets the maximum number of steps in one run.
    #[inline]
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Removes the step limit.
    ///
    /// A model that keeps requesting tools will then loop forever.
    #[inline]
    pub fn without_step_limit(mut self) -> Self {
        self.step_limit = None;
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

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.push(Box::new(AnyTool(tool)));
        self
    }

    /// Builds the agent.
    pub fn build(self) -> Agent {
        let Self {
            model_client,
            system_prompt,
            step_limit,
            on_transcript,
            tools,
        } = self;

        Agent {
            model_client,
            tool_executor: ToolExecutor::with_tools(tools),
            system_prompt,
            step_limit,
            on_transcript,
        }
    }
}
