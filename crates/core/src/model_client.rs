use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use orchestrations_model::{
    AssistantMessage, ModelFinishReason, ModelProvider, ModelRequest,
    ModelResponse, ModelResponseEvent,
};
use tracing::Instrument;

use crate::Error;

type SendRequestResult = Result<ModelClientResponse, Error>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, Box<dyn Fn(String) + Send + 'static>)
        -> BoxedSendRequestFuture + Send + Sync
>;

/// A wrapper around a model provider that folds the streamed events into
/// a complete assistant message and provides a type-erased interface for
/// the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // `ModelClient` has no generic parameter, so `P` is erased here.
        let handler_fn: HandlerFn = Arc::new(move |req, on_transcript| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err, on_transcript).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and returns the completed response.
    ///
    /// `on_transcript` is called with every text delta as it arrives.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_transcript: impl Fn(String) + Send + 'static,
    ) -> SendRequestResult {
        (self.handler_fn)(req, Box::new(on_transcript)).await
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug)]
pub struct ModelClientResponse {
    /// The assistant message assembled from the stream.
    pub message: AssistantMessage,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_transcript: Box<dyn Fn(String) + Send + 'static>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(Error::Model(Box::new(err)));
        }
    };

    let mut message = AssistantMessage::default();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(Error::Model(Box::new(err)));
            }
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                message.content.push_str(&delta);
                on_transcript(delta);
            }
            ModelResponseEvent::ToolCall(req) => {
                message.tool_calls.push(req);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    if message.content.is_empty()
        && message.tool_calls.is_empty()
        && finish_reason.is_none()
    {
        warn!("the response ended without any message");
        return Err(Error::UnexpectedResponse(
            "the stream ended without a message".to_owned(),
        ));
    }
    if finish_reason == Some(ModelFinishReason::Length) {
        warn!("the response was truncated by the token limit");
    }

    trace!("finished a request");

    Ok(ModelClientResponse {
        message,
        finish_reason,
    })
}
