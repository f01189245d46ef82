//! SSE adapter turning a raw byte stream into stamped job events.
//!
//! The grading service emits one `data: {json}` frame per event. Frames
//! that fail to decode surface as `parse`-kind errors so the consumer can
//! log and skip them without tearing the stream down; transport failures
//! surface as `network`-kind errors. Receipt timestamps are stamped here,
//! at the transport edge.

use std::pin::Pin;

use eventsource_stream::{EventStream, EventStreamError, Eventsource};
use futures_util::Stream;
use gradex_types::{ReceivedEvent, parse_event};

use super::{ApiError, ApiResult};

/// Decodes a job's event stream frame by frame.
pub struct JobEventSource<S> {
    inner: EventStream<S>,
}

impl<S> JobEventSource<S> {
    pub fn new(stream: S) -> Self
    where
        S: Eventsource,
    {
        Self {
            inner: stream.eventsource(),
        }
    }
}

impl<S, E> Stream for JobEventSource<S>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = ApiResult<ReceivedEvent>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;

        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(frame))) => Poll::Ready(Some(decode_frame(&frame.data))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(classify_stream_error(&e)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

fn decode_frame(data: &str) -> ApiResult<ReceivedEvent> {
    let event = parse_event(data).map_err(|e| ApiError::parse(e.to_string()))?;
    Ok(ReceivedEvent::received_now(event))
}

fn classify_stream_error<E>(e: &EventStreamError<E>) -> ApiError
where
    E: std::error::Error,
{
    match e {
        EventStreamError::Transport(e) => ApiError::network(format!("Stream connection error: {e}")),
        EventStreamError::Utf8(e) => ApiError::parse(format!("SSE stream error: {e}")),
        EventStreamError::Parser(e) => ApiError::parse(format!("SSE stream error: {e}")),
    }
}
