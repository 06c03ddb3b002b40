use serde::{Deserialize, Serialize};

use super::message::ChatMessage;
use crate::Error;

pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Sampling parameters shared by every call shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationOptions {
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Request handed to a provider, one per call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
}

impl CompletionRequest {
    /// Build a request, rejecting `max_tokens == 0` and temperatures outside `[0, 2]`.
    pub fn new(
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
        options: GenerationOptions,
        stream: bool,
    ) -> Result<Self, Error> {
        if options.max_tokens == 0 {
            return Err(Error::invalid_request("max_tokens must be greater than 0"));
        }
        if !(0.0..=2.0).contains(&options.temperature) {
            return Err(Error::invalid_request(format!(
                "temperature must be within [0, 2], got {}",
                options.temperature
            )));
        }
        if messages.is_empty() {
            return Err(Error::invalid_request("at least one message is required"));
        }

        Ok(Self {
            model: model.into(),
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            stream,
        })
    }
}
