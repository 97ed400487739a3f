use orchestrations_model::ModelMessage;

/// A node of the websearch control loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Node {
    /// Calls the model with the conversation so far.
    Agent,
    /// Runs the tool calls requested by the last assistant message.
    Tools,
    /// Stops the loop.
    End,
}

/// Decides which node runs next, based only on the last message.
///
/// - An assistant message without tool calls ends the loop.
/// - A tool result hands the turn back to the model.
/// - Anything else, including an assistant message that requests tools,
///   goes to the tool node.
pub fn route(messages: &[ModelMessage]) -> Node {
    match messages.last() {
        Some(ModelMessage::Assistant(msg)) if !msg.has_tool_calls() => Node::End,
        Some(ModelMessage::Tool(_)) => Node::Agent,
        _ => Node::Tools,
    }
}
