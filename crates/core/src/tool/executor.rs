use orchestrations_model::{ModelTool, ToolCallRequest, ToolCallResult};
use tracing::Instrument;

use crate::tool::{Error, ToolObject};

/// An executor that handles tool call requests from the model.
///
/// Tools keep their registration order, so the definitions bound to every
/// request are stable.
pub struct Executor {
    tools: Vec<Box<dyn ToolObject>>,
}

impl Executor {
    pub fn with_tools(tools: Vec<Box<dyn ToolObject>>) -> Self {
        let mut deduped: Vec<Box<dyn ToolObject>> =
            Vec::with_capacity(tools.len());
        for tool in tools {
            // A later registration replaces an earlier one with the same name.
            deduped.retain(|existing| existing.name() != tool.name());
            deduped.push(tool);
        }
        Self { tools: deduped }
    }

    #[inline]
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    /// Runs the requests one by one and returns exactly one result per
    /// request, in request order.
    pub async fn handle_requests(
        &self,
        requests: &[ToolCallRequest],
    ) -> Vec<ToolCallResult> {
        let mut results = Vec::with_capacity(requests.len());
        for req in requests {
            let outcome = match self.find(&req.name) {
                Some(tool) => {
                    trace!(
                        "running a tool ({}) with args: {:?}",
                        req.id, req.arguments
                    );
                    let span = debug_span!("tool execute", name = %req.name);
                    tool.execute(req.arguments.clone()).instrument(span).await
                }
                None => {
                    warn!("tool not found: {}", req.name);
                    Err(Error::not_found().with_reason(format!(
                        "{} is not a valid tool, try one of [{}].",
                        req.name,
                        self.names().join(", ")
                    )))
                }
            };
            let content = match outcome {
                Ok(output) => output,
                Err(err) => {
                    debug!("tool call {} failed: {}", req.id, err.reason());
                    err.to_string()
                }
            };
            results.push(ToolCallResult {
                id: req.id.clone(),
                content,
            });
        }
        results
    }

    fn find(&self, name: &str) -> Option<&dyn ToolObject> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .map(|tool| tool.as_ref())
    }

    fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }
}
