//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use orchestrations_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: VecDeque<ModelResponseEvent>,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if this.events.is_empty() {
            return Poll::Ready(Ok(None));
        }

        let delay = this.delay;
        let sleep = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        Poll::Ready(Ok(this.events.pop_front()))
    }
}

#[derive(Clone)]
enum Turn {
    Respond(PresetResponse),
    Fail(ErrorKind),
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond to a request. A request is answered by the turn
/// whose index equals the number of assistant messages already in the
/// request, so the same script replays identically for the same history.
/// If there are no enough turns in the script, an error will be returned,
/// unless the last turn is set to repeat.
///
/// Every request is recorded and can be inspected with
/// [`requests`](Self::requests).
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Vec<Turn>,
    repeat_last: bool,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl TestModelProvider {
    /// Adds the response of the next assistant turn.
    #[inline]
    pub fn add_assistant_turn(&mut self, preset: PresetResponse) {
        self.script.push(Turn::Respond(preset));
    }

    /// Makes the next assistant turn fail with the given kind of error.
    #[inline]
    pub fn add_failed_turn(&mut self, kind: ErrorKind) {
        self.script.push(Turn::Fail(kind));
    }

    /// Answers every turn past the end of the script with the last turn.
    #[inline]
    pub fn repeat_last_turn(&mut self) {
        self.repeat_last = true;
    }

    /// Sets the delay before each streamed event.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every request received so far, shared across clones.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn select_turn(&self, req: &ModelRequest) -> Option<&Turn> {
        let turn_idx = req
            .messages
            .iter()
            .filter(|msg| matches!(msg, ModelMessage::Assistant(_)))
            .count();
        match self.script.get(turn_idx) {
            Some(turn) => Some(turn),
            None if self.repeat_last => self.script.last(),
            None => None,
        }
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }

        let result = match self.select_turn(req) {
            None => Err(Error {
                message: "no enough turns",
                kind: ErrorKind::Other,
            }),
            Some(Turn::Fail(kind)) => Err(Error {
                message: "scripted failure",
                kind: *kind,
            }),
            Some(Turn::Respond(preset)) => {
                let mut events: VecDeque<_> = preset
                    .events
                    .iter()
                    .map(|event| match event {
                        PresetEvent::MessageDelta(msg) => {
                            ModelResponseEvent::MessageDelta(msg.clone())
                        }
                        PresetEvent::ToolCall(req) => {
                            ModelResponseEvent::ToolCall(req.clone())
                        }
                    })
                    .collect();
                events.push_back(ModelResponseEvent::Completed(
                    if preset.has_tool_calls() {
                        ModelFinishReason::ToolCalls
                    } else {
                        ModelFinishReason::Stop
                    },
                ));
                Ok(TestModelResponse {
                    events,
                    delay: self.delay.unwrap_or(Duration::from_millis(1)),
                    sleep: None,
                })
            }
        };
        ready(result)
    }
}
