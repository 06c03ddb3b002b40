//! Delta accumulation logic for streaming responses.

use crate::response::CompleteResponse;
use crate::types::{FinishReason, StreamEvent, Usage};

/// Accumulates streaming deltas into a complete response.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    content: String,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
    done: bool,
}

impl ResponseAccumulator {
    /// Create a new response accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a stream event and update the accumulation.
    pub fn process_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::ContentDelta { delta } => self.content.push_str(&delta),
            StreamEvent::Done {
                finish_reason,
                usage,
            } => {
                // Some servers send usage on a later frame than the finish reason.
                if finish_reason.is_some() {
                    self.finish_reason = finish_reason;
                }
                if usage.is_some() {
                    self.usage = usage;
                }
                self.done = true;
            }
        }
    }

    /// Whether a `Done` event has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Text accumulated so far.
    pub fn current_content(&self) -> &str {
        &self.content
    }

    /// Finalize and return the complete response.
    pub fn finalize(self) -> CompleteResponse {
        CompleteResponse {
            content: self.content,
            finish_reason: self.finish_reason,
            usage: self.usage,
        }
    }
}
