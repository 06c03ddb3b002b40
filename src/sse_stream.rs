//! Stream adapter for parsing SSE (Server-Sent Events) from byte chunks.

use crate::Error;
use futures_util::{Stream, StreamExt};
use memchr::memmem;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Upper bound on bytes buffered while waiting for an event separator.
const MAX_BUFFER_BYTES: usize = 1_000_000;

/// A Server-Sent Events (SSE) event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    /// Event type (optional).
    pub event_type: Option<String>,
    /// Event data, multiple `data:` lines joined with `\n`.
    pub data: String,
}

impl SseEvent {
    /// Check if this is the `[DONE]` sentinel that ends an OpenAI-style stream.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}

/// A stream adapter that parses SSE events from a byte stream.
/// Maintains internal state to handle events split across chunks.
pub struct SseStream<S> {
    inner: S,
    /// Raw bytes not yet terminated by a blank line.
    buffer: Vec<u8>,
    /// Parsed events ready to be yielded.
    events: VecDeque<SseEvent>,
    /// Set once the inner stream ended or failed.
    finished: bool,
}

impl<S> SseStream<S> {
    /// Create a new SSE stream from a byte stream.
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: Vec::new(),
            events: VecDeque::new(),
            finished: false,
        }
    }

    /// Move every complete event in the buffer onto the event queue.
    fn parse_buffer(&mut self) -> Result<(), Error> {
        let separator = b"\n\n";
        let finder = memmem::Finder::new(separator);
        let mut start = 0;

        while let Some(pos) = finder.find(&self.buffer[start..]) {
            let event_end = start + pos;
            let event_text = std::str::from_utf8(&self.buffer[start..event_end])
                .map_err(|e| Error::streaming(format!("Invalid UTF-8 in SSE event: {e}")))?;

            if let Some(event) = Self::parse_single_event(event_text) {
                self.events.push_back(event);
            }

            start = event_end + separator.len();
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        Ok(())
    }

    /// Parse a single complete SSE event from its text representation.
    fn parse_single_event(event_text: &str) -> Option<SseEvent> {
        let mut event_type = None;
        let mut data_lines = Vec::new();

        for line in event_text.lines() {
            // Comments start with ':' and carry no fields.
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            let (field, value) = line.split_once(':').unwrap_or((line, ""));
            let value = value.strip_prefix(' ').unwrap_or(value);

            match field {
                "event" => event_type = Some(value.to_string()),
                "data" => data_lines.push(value),
                _ => {}
            }
        }

        if data_lines.is_empty() {
            return None;
        }

        Some(SseEvent {
            event_type,
            data: data_lines.join("\n"),
        })
    }

    /// Parse whatever is left once the connection closed without a trailing blank line.
    fn flush_remainder(&mut self) -> Option<SseEvent> {
        let remainder = std::mem::take(&mut self.buffer);
        let text = std::str::from_utf8(&remainder).ok()?.trim();
        if text.is_empty() {
            return None;
        }
        Self::parse_single_event(text)
    }
}

impl<S, B, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Item = Result<SseEvent, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(event) = self.events.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            if self.finished {
                return Poll::Ready(None);
            }

            let chunk = match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    self.finished = true;
                    self.buffer.clear();
                    return Poll::Ready(Some(Err(Error::network(e))));
                }
                None => {
                    self.finished = true;
                    return Poll::Ready(self.flush_remainder().map(Ok));
                }
            };

            // Normalize CRLF framing so the separator search only has to look for "\n\n".
            self.buffer
                .extend(chunk.as_ref().iter().copied().filter(|&b| b != b'\r'));

            if self.buffer.len() > MAX_BUFFER_BYTES {
                self.finished = true;
                self.buffer.clear();
                return Poll::Ready(Some(Err(Error::streaming(
                    "SSE buffer exceeded maximum size",
                ))));
            }

            if let Err(e) = self.parse_buffer() {
                self.finished = true;
                return Poll::Ready(Some(Err(e)));
            }
        }
    }
}

/// Extension trait to add SSE parsing to byte streams.
pub trait SseStreamExt: Stream {
    /// Parse this byte stream as SSE events.
    fn sse_events(self) -> SseStream<Self>
    where
        Self: Sized,
    {
        SseStream::new(self)
    }
}

impl<S: Stream> SseStreamExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures_util::stream;

    type ByteResult = Result<Bytes, std::io::Error>;

    fn chunks(parts: Vec<ByteResult>) -> SseStream<impl Stream<Item = ByteResult> + Unpin> {
        stream::iter(parts).sse_events()
    }

    #[tokio::test]
    async fn test_sse_stream_split_events() {
        let mut sse_stream = chunks(vec![
            Ok(Bytes::from("data: Hel")),
            Ok(Bytes::from("lo World\n\ndata: ")),
            Ok(Bytes::from("Second\n\n")),
        ]);

        assert_eq!(sse_stream.next().await.unwrap().unwrap().data, "Hello World");
        assert_eq!(sse_stream.next().await.unwrap().unwrap().data, "Second");
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_sse_stream_crlf_and_comments() {
        let mut sse_stream = chunks(vec![Ok(Bytes::from(
            ": keep-alive\r\n\r\nevent: chunk\r\ndata: {\"a\":1}\r\n\r\n",
        ))]);

        let event = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(event.event_type.as_deref(), Some("chunk"));
        assert_eq!(event.data, "{\"a\":1}");
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_sse_stream_multiline() {
        let mut sse_stream = chunks(vec![Ok(Bytes::from("data: Line 1\ndata: Line 2\n\n"))]);

        let event = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(event.data, "Line 1\nLine 2");
    }

    #[tokio::test]
    async fn test_sse_stream_utf8_boundary() {
        // The euro sign is three bytes; split it across two chunks.
        let euro_bytes = "€".as_bytes();
        let mut sse_stream = chunks(vec![
            Ok(Bytes::from([b"data: Price: ".as_slice(), &euro_bytes[..2]].concat())),
            Ok(Bytes::from([&euro_bytes[2..], b"100\n\n"].concat())),
        ]);

        let event = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(event.data, "Price: €100");
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_sse_stream_invalid_utf8_error() {
        let mut sse_stream = chunks(vec![Ok(Bytes::from(
            b"data: Valid start \xFF\xFE invalid bytes\n\n".to_vec(),
        ))]);

        let result = sse_stream.next().await.unwrap();
        assert!(matches!(result, Err(Error::Streaming(_))));
    }

    #[tokio::test]
    async fn test_sse_stream_ends_without_final_newline() {
        let mut sse_stream = chunks(vec![
            Ok(Bytes::from("data: First event\n\n")),
            Ok(Bytes::from("data: [DONE]")),
        ]);

        assert_eq!(sse_stream.next().await.unwrap().unwrap().data, "First event");

        let last = sse_stream.next().await.unwrap().unwrap();
        assert!(last.is_done());
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_transport_error_is_network_error() {
        let mut sse_stream = chunks(vec![
            Ok(Bytes::from("data: one\n\n")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(Bytes::from("data: never\n\n")),
        ]);

        assert_eq!(sse_stream.next().await.unwrap().unwrap().data, "one");
        assert!(matches!(sse_stream.next().await, Some(Err(Error::Network(_)))));
        assert!(sse_stream.next().await.is_none());
    }
}
