//! Agent adapter trait: the boundary between the gateway and the model
//!
//! Everything past this module sees only typed [`ResponseEvent`]s; the wire
//! format of the upstream provider stays inside the implementation.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::Span;

use crate::error::Result;
use crate::types::{ResponseAccumulator, ResponseEvent};

pub mod openai;
pub mod sse;

pub use openai::OpenAiAgent;

/// Lazy, single-pass sequence of agent output.
///
/// The stream ends after the agent signals completion. A failure is yielded
/// as a terminal `Err` item; a stream that ends without one closed normally.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<ResponseEvent>> + Send>>;

/// Task used by the default health probe
pub const PROBE_TASK: &str = "Hello";

/// Poll `stream` with `span` entered, so every event it logs belongs to the span.
///
/// The span is entered only for the duration of each poll and never held
/// across a suspension point.
pub fn instrument_stream<S>(stream: S, span: Span) -> impl Stream<Item = S::Item> + Send + 'static
where
    S: Stream + Send + 'static,
{
    let mut stream = Box::pin(stream);
    futures::stream::poll_fn(move |cx| {
        let _entered = span.enter();
        stream.poll_next_unpin(cx)
    })
}

/// Core trait for conversational agents
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name used in logs
    fn name(&self) -> &str;

    /// Start a streaming run for `task`.
    ///
    /// Nothing is sent upstream until the returned stream is first polled.
    fn invoke_streaming(&self, task: &str) -> ResponseStream;

    /// Run `task` to completion and return the assembled response text.
    ///
    /// Default implementation drains [`Agent::invoke_streaming`] through the
    /// same reduction the stream bridge uses. Agents with a cheaper batch
    /// call should override this.
    async fn invoke(&self, task: &str) -> Result<String> {
        let mut events = self.invoke_streaming(task);
        let mut acc = ResponseAccumulator::new();
        while let Some(event) = events.next().await {
            acc.apply(event?);
        }
        Ok(acc.into_text())
    }

    /// Check that the agent can reach its model.
    ///
    /// Default implementation runs [`PROBE_TASK`] through [`Agent::invoke`].
    async fn probe(&self) -> Result<()> {
        self.invoke(PROBE_TASK).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;

    struct FixedAgent {
        events: Vec<ResponseEvent>,
        fail: bool,
    }

    impl Agent for FixedAgent {
        fn name(&self) -> &str {
            "fixed"
        }

        fn invoke_streaming(&self, _task: &str) -> ResponseStream {
            let mut items: Vec<Result<ResponseEvent>> =
                self.events.iter().cloned().map(Ok).collect();
            if self.fail {
                items.push(Err(ChatError::Upstream("boom".to_string())));
            }
            Box::pin(futures::stream::iter(items))
        }
    }

    #[tokio::test]
    async fn test_default_invoke_matches_bridge_reduction() {
        let agent = FixedAgent {
            events: vec![
                ResponseEvent::Delta("Hel".into()),
                ResponseEvent::Delta("lo".into()),
                ResponseEvent::FinalMessage("Hello world".into()),
            ],
            fail: false,
        };
        assert_eq!(agent.invoke("hi").await.unwrap(), "Hello world");
    }

    #[tokio::test]
    async fn test_default_invoke_propagates_failure() {
        let agent = FixedAgent {
            events: vec![ResponseEvent::Delta("partial".into())],
            fail: true,
        };
        let err = agent.invoke("hi").await.unwrap_err();
        assert!(matches!(err, ChatError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_default_probe() {
        let ok = FixedAgent {
            events: vec![],
            fail: false,
        };
        assert!(ok.probe().await.is_ok());

        let failing = FixedAgent {
            events: vec![],
            fail: true,
        };
        assert!(failing.probe().await.is_err());
    }

    #[test]
    fn test_instrument_stream_polls_inside_span() {
        let subscriber = tracing_subscriber::registry();
        tracing::subscriber::with_default(subscriber, || {
            let inner = futures::stream::iter(0..2)
                .map(|_| Span::current().metadata().map(|m| m.name()));
            let span = tracing::info_span!("a3s.chat.test");
            let names: Vec<_> =
                futures::executor::block_on(instrument_stream(inner, span).collect());
            assert_eq!(names, vec![Some("a3s.chat.test"), Some("a3s.chat.test")]);
            assert!(Span::current().is_none());
        });
    }
}
