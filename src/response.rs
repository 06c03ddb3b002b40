//! Response handling for completions.

use crate::accumulator::ResponseAccumulator;
use crate::types::{FinishReason, StreamEvent, Usage};
use crate::Error;
use futures_util::stream::{Stream, StreamExt};
use std::pin::Pin;

/// A lazy, finite stream of generated text chunks.
///
/// Yields each chunk as soon as it is decoded. A transport failure ends the
/// stream with a single `Err`; chunks yielded before it remain valid.
/// Dropping the stream releases the underlying connection.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>;

/// The raw event stream behind a [`Response`].
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, Error>> + Send>>;

/// A complete, buffered response.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteResponse {
    pub content: String,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<Usage>,
}

/// Response from a provider that can be streamed or buffered.
pub struct Response {
    stream: EventStream,
}

impl Response {
    /// Create a new response from a stream of events.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<StreamEvent, Error>> + Send + 'static,
    {
        Self {
            stream: Box::pin(stream),
        }
    }

    /// Create an already-complete response, as returned by a non-streaming call.
    pub fn from_complete(complete: CompleteResponse) -> Self {
        let events = vec![
            Ok(StreamEvent::ContentDelta {
                delta: complete.content,
            }),
            Ok(StreamEvent::Done {
                finish_reason: complete.finish_reason,
                usage: complete.usage,
            }),
        ];
        Self::from_stream(futures_util::stream::iter(events))
    }

    /// Buffer the entire response by consuming the stream.
    pub async fn buffer(mut self) -> Result<CompleteResponse, Error> {
        let mut accumulator = ResponseAccumulator::new();

        while let Some(event) = self.stream.next().await {
            accumulator.process_event(event?);
        }

        Ok(accumulator.finalize())
    }

    /// Get just the text content (convenience method).
    pub async fn text(self) -> Result<String, Error> {
        Ok(self.buffer().await?.content)
    }

    /// Stream only the text chunks, skipping empty deltas and completion markers.
    pub fn text_stream(self) -> TextStream {
        Box::pin(self.stream.filter_map(|event| async move {
            match event {
                Ok(StreamEvent::ContentDelta { delta }) if !delta.is_empty() => Some(Ok(delta)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn delta(text: &str) -> Result<StreamEvent, Error> {
        Ok(StreamEvent::ContentDelta {
            delta: text.to_string(),
        })
    }

    #[tokio::test]
    async fn test_response_buffering() {
        let events = vec![
            delta("Test "),
            delta("response"),
            Ok(StreamEvent::Done {
                finish_reason: Some(FinishReason::Stop),
                usage: None,
            }),
        ];

        let response = Response::from_stream(stream::iter(events));
        let complete = response.buffer().await.unwrap();
        assert_eq!(complete.content, "Test response");
        assert_eq!(complete.finish_reason, Some(FinishReason::Stop));
    }

    #[tokio::test]
    async fn test_from_complete_round_trips() {
        let complete = CompleteResponse {
            content: "Hello".to_string(),
            finish_reason: Some(FinishReason::Stop),
            usage: Some(Usage::default()),
        };

        let buffered = Response::from_complete(complete.clone())
            .buffer()
            .await
            .unwrap();
        assert_eq!(buffered, complete);
    }

    #[tokio::test]
    async fn test_text_stream_skips_markers() {
        let events = vec![
            delta("a"),
            delta(""),
            delta("b"),
            Ok(StreamEvent::Done {
                finish_reason: None,
                usage: None,
            }),
        ];

        let chunks: Vec<String> = Response::from_stream(stream::iter(events))
            .text_stream()
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_text_stream_keeps_chunks_before_failure() {
        let events = vec![
            delta("partial "),
            delta("output"),
            Err(Error::network("connection reset")),
        ];

        let mut chunks = Response::from_stream(stream::iter(events)).text_stream();
        assert_eq!(chunks.next().await.unwrap().unwrap(), "partial ");
        assert_eq!(chunks.next().await.unwrap().unwrap(), "output");
        assert!(matches!(chunks.next().await, Some(Err(Error::Network(_)))));
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn test_buffer_surfaces_error() {
        let events = vec![delta("partial"), Err(Error::network("reset"))];
        let result = Response::from_stream(stream::iter(events)).text().await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
