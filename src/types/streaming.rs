//! Types for streaming responses.

use crate::types::{FinishReason, Usage};

/// Events a provider emits while a response is being generated.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A chunk of generated text was received.
    ContentDelta { delta: String },
    /// The server reported the end of the generation.
    Done {
        finish_reason: Option<FinishReason>,
        usage: Option<Usage>,
    },
}

impl StreamEvent {
    /// The text carried by this event, if any.
    pub fn delta(&self) -> Option<&str> {
        match self {
            StreamEvent::ContentDelta { delta } => Some(delta),
            StreamEvent::Done { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_event_delta() {
        let content_event = StreamEvent::ContentDelta {
            delta: "test".to_string(),
        };
        assert_eq!(content_event.delta(), Some("test"));

        let done_event = StreamEvent::Done {
            finish_reason: Some(FinishReason::Stop),
            usage: None,
        };
        assert_eq!(done_event.delta(), None);
    }
}
