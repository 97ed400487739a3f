use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use orchestrations_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};
use serde_json::json;
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the last user message word by word, or asks for a search when
/// the message starts with `search `.
#[derive(Debug)]
struct FakeModelResponse {
    pending: VecDeque<ModelResponseEvent>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl FakeModelResponse {
    fn new(input: &str) -> Self {
        let mut pending = VecDeque::new();
        if let Some(query) = input.strip_prefix("search ") {
            pending.push_back(ModelResponseEvent::ToolCall(ToolCallRequest {
                id: "call_0".to_owned(),
                name: "search".to_owned(),
                arguments: json!({ "query": query }),
            }));
            pending.push_back(ModelResponseEvent::Completed(
                ModelFinishReason::ToolCalls,
            ));
        } else {
            let text = format!("You said {input}");
            let mut words = text.split(' ').peekable();
            while let Some(word) = words.next() {
                let mut word = word.to_owned();
                if words.peek().is_some() {
                    word.push(' ');
                }
                pending.push_back(ModelResponseEvent::MessageDelta(word));
            }
            pending
                .push_back(ModelResponseEvent::Completed(ModelFinishReason::Stop));
        }
        Self {
            pending,
            sleep: None,
        }
    }
}

impl ModelResponse for FakeModelResponse {
    type Error = FakeModelProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        let sleep = this
            .sleep
            .get_or_insert_with(|| Box::pin(sleep(Duration::from_millis(1))));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;
        Poll::Ready(Ok(this.pending.pop_front()))
    }
}

struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;
    type Response = FakeModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let last_user = req.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::User { content } => Some(content.as_str()),
            _ => None,
        });
        let result = match last_user {
            Some(input) => Ok(FakeModelResponse::new(input)),
            None => Err(FakeModelProviderError(ErrorKind::Other)),
        };
        ready(result)
    }
}

mod tests {
    use std::future::poll_fn;

    use super::*;

    async fn collect(
        mut resp: FakeModelResponse,
    ) -> (String, Vec<ToolCallRequest>, Option<ModelFinishReason>) {
        let mut text = String::new();
        let mut tool_calls = vec![];
        let mut finish_reason = None;
        loop {
            let event = poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx))
                .await
                .unwrap();
            match event {
                Some(ModelResponseEvent::MessageDelta(delta)) => {
                    text.push_str(&delta);
                }
                Some(ModelResponseEvent::ToolCall(req)) => tool_calls.push(req),
                Some(ModelResponseEvent::Completed(reason)) => {
                    finish_reason = Some(reason);
                }
                None => break,
            }
        }
        (text, tool_calls, finish_reason)
    }

    #[tokio::test]
    async fn test_completion() {
        let req = ModelRequest {
            messages: vec![
                ModelMessage::system("Be nice."),
                ModelMessage::user("Good morning"),
            ],
            tools: vec![],
        };
        let resp = FakeModelProvider.send_request(&req).await.unwrap();
        let (text, tool_calls, finish_reason) = collect(resp).await;

        assert_eq!(text, "You said Good morning");
        assert!(tool_calls.is_empty());
        assert_eq!(finish_reason, Some(ModelFinishReason::Stop));
    }

    #[tokio::test]
    async fn test_tool_call() {
        let req = ModelRequest {
            messages: vec![ModelMessage::user("search rust news")],
            tools: vec![],
        };
        let resp = FakeModelProvider.send_request(&req).await.unwrap();
        let (text, tool_calls, finish_reason) = collect(resp).await;

        assert!(text.is_empty());
        assert_eq!(tool_calls.len(), 1);
        assert_eq!(tool_calls[0].arguments, json!({ "query": "rust news" }));
        assert_eq!(finish_reason, Some(ModelFinishReason::ToolCalls));
    }

    #[tokio::test]
    async fn test_error() {
        let req = ModelRequest {
            messages: vec![],
            tools: vec![],
        };
        let err = FakeModelProvider.send_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
