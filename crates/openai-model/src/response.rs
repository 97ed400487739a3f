use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use orchestrations_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};
use pin_project_lite::pin_project;
use serde_json::Value;

use crate::Error;
use crate::io::Sse;
use crate::proto::{ChatCompletionChunk, ToolCall};

struct PartialState {
    sse: Sse,
    id: Option<String>,
    // Tool calls are streamed as fragments keyed by `index`, and they are
    // only complete once the choice has a finish reason.
    tool_calls: Vec<ToolCall>,
    pending_tool_calls: VecDeque<usize>,
    // This field will be cleared after the response returns the complete event.
    pending_finish_reason: Option<ModelFinishReason>,
    finished: bool,
}

impl PartialState {
    fn finish_choice(&mut self, reason: Option<ModelFinishReason>) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.pending_tool_calls.extend(0..self.tool_calls.len());
        self.pending_finish_reason = reason;
    }

    fn merge_tool_call(&mut self, fragment: ToolCall) {
        let Some(partial) = self
            .tool_calls
            .iter_mut()
            .find(|t| t.index == fragment.index)
        else {
            self.tool_calls.push(fragment);
            return;
        };
        if let Some(id) = fragment.id {
            partial.id.get_or_insert_default().push_str(&id);
        }
        if let Some(ty) = fragment.r#type {
            partial.r#type.get_or_insert_default().push_str(&ty);
        }
        if let Some(function) = fragment.function {
            let partial_func = partial.function.get_or_insert_default();
            if let Some(name) = function.name {
                partial_func.name.get_or_insert_default().push_str(&name);
            }
            if let Some(arguments) = function.arguments {
                partial_func
                    .arguments
                    .get_or_insert_default()
                    .push_str(&arguments);
            }
        }
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    /// A streamed chat completion.
    pub struct OpenAIResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl OpenAIResponse {
    #[inline]
    pub(crate) fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            id: None,
            tool_calls: Default::default(),
            pending_tool_calls: Default::default(),
            pending_finish_reason: Default::default(),
            finished: false,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(
    mut partial_state: PartialState,
) -> Result<(Option<ModelResponseEvent>, PartialState), Error> {
    loop {
        // Queued events go out before anything new is read. Tool calls
        // always precede the completion event.
        if let Some(idx) = partial_state.pending_tool_calls.pop_front() {
            let request = to_request(&partial_state.tool_calls[idx]);
            return Ok((Some(ModelResponseEvent::ToolCall(request)), partial_state));
        }
        if let Some(reason) = partial_state.pending_finish_reason.take() {
            return Ok((Some(ModelResponseEvent::Completed(reason)), partial_state));
        }

        let sse_event = match partial_state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                if partial_state.finished {
                    return Ok((None, partial_state));
                }
                // The stream ended without a finish reason; flush what we have.
                partial_state.finish_choice(None);
                continue;
            }
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {sse_event}");
        if sse_event == "[DONE]" {
            partial_state.finish_choice(None);
            if partial_state.pending_tool_calls.is_empty()
                && partial_state.pending_finish_reason.is_none()
            {
                return Ok((None, partial_state));
            }
            continue;
        }

        let mut chunk = serde_json::from_str::<ChatCompletionChunk>(&sse_event)
            .map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::UnexpectedResponse)
            })?;
        if !chunk.id.is_empty()
            && partial_state.id.get_or_insert_with(|| chunk.id.clone())
                != &chunk.id
        {
            return Err(Error::new(
                "chunk id mismatch",
                ErrorKind::UnexpectedResponse,
            ));
        }

        // The trailing usage chunk has no choices.
        let Some(choice) = chunk.choices.pop() else {
            continue;
        };

        if let Some(tool_calls) = choice.delta.tool_calls {
            for fragment in tool_calls {
                partial_state.merge_tool_call(fragment);
            }
        }
        if let Some(finish_reason) = choice.finish_reason {
            let reason = match finish_reason.as_str() {
                "tool_calls" | "function_call" => ModelFinishReason::ToolCalls,
                "length" => ModelFinishReason::Length,
                "content_filter" => {
                    return Err(Error::new(
                        "the response was filtered by the provider",
                        ErrorKind::Moderated,
                    ));
                }
                _ => ModelFinishReason::Stop,
            };
            partial_state.finish_choice(Some(reason));
        }

        // Text goes out immediately, queued events follow on the next poll.
        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
            return Ok((
                Some(ModelResponseEvent::MessageDelta(content)),
                partial_state,
            ));
        }
    }
}

fn to_request(tool_call: &ToolCall) -> ToolCallRequest {
    let id = tool_call.id.clone().unwrap_or_default();
    let function = tool_call.function.clone().unwrap_or_default();
    let raw_arguments = function.arguments.unwrap_or_default();
    let arguments = if raw_arguments.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str::<Value>(&raw_arguments).unwrap_or_else(|err| {
            warn!("tool call ({id}) has malformed arguments: {err}");
            Value::String(raw_arguments)
        })
    };
    ToolCallRequest {
        id,
        name: function.name.unwrap_or_default(),
        arguments,
    }
}
