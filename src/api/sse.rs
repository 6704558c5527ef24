use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use std::convert::Infallible;

use crate::bridge::SseMessage;

/// Create an SSE response from a stream of bridge messages.
///
/// Each message becomes one `data:` event; the bridge itself emits the
/// trailing `[DONE]` marker.
pub fn sse_response<S>(stream: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = SseMessage> + Send + 'static,
{
    use futures::StreamExt;

    let event_stream = stream.map(|message| Ok(Event::default().data(message.to_data())));

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}
