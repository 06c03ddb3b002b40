use crate::response::CompleteResponse;
use crate::types::{ChatMessage, CompletionRequest, FinishReason, StreamEvent, Usage};
use crate::Error;
use serde::{Deserialize, Serialize};

/// Body of `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
}

impl<'a> From<&'a CompletionRequest> for ChatCompletionRequest<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: request.stream,
        }
    }
}

/// Non-streaming response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Take the first choice's text; a response without choices yields empty content.
    pub fn into_complete(self) -> CompleteResponse {
        let (content, finish_reason) = match self.choices.into_iter().next() {
            Some(choice) => (choice.message.content.unwrap_or_default(), choice.finish_reason),
            None => (String::new(), None),
        };

        CompleteResponse {
            content,
            finish_reason,
            usage: self.usage,
        }
    }
}

/// One `data:` frame of a streaming response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
    /// Set when the server reports a failure in-band, after the 200 status was sent.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Delta,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Human-readable message of an `error` payload: `{"message": ...}`, a bare string, or raw JSON.
pub fn error_message(error: &serde_json::Value) -> String {
    match error {
        serde_json::Value::String(message) => message.clone(),
        other => match other.get("message").and_then(|m| m.as_str()) {
            Some(message) => message.to_string(),
            None => other.to_string(),
        },
    }
}

impl ChatCompletionChunk {
    /// Convert this frame into zero or more stream events, or the error it carries.
    pub fn into_events(self) -> Result<Vec<StreamEvent>, Error> {
        if let Some(error) = &self.error {
            return Err(Error::streaming(format!(
                "server reported an error mid-stream: {}",
                error_message(error)
            )));
        }

        let mut events = Vec::new();
        let mut finish_reason = None;

        if let Some(choice) = self.choices.into_iter().next() {
            if let Some(delta) = choice.delta.content.filter(|d| !d.is_empty()) {
                events.push(StreamEvent::ContentDelta { delta });
            }
            finish_reason = choice.finish_reason;
        }

        if finish_reason.is_some() || self.usage.is_some() {
            events.push(StreamEvent::Done {
                finish_reason,
                usage: self.usage,
            });
        }

        Ok(events)
    }
}
