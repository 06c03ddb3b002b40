//! High-level inference client.

use crate::config::ClientConfig;
use crate::presets::Preset;
use crate::provider::CompletionProvider;
use crate::providers::CerebrasProvider;
use crate::response::{CompleteResponse, TextStream};
use crate::types::{ChatMessage, CompletionRequest, GenerationOptions, Prompt};
use crate::Error;

/// Temperature used for code generation and presets.
pub const CODE_TEMPERATURE: f32 = 0.3;

/// Client for Cerebras Cloud inference.
///
/// Holds immutable configuration only; every call owns its own request and
/// response, so a client can be shared across tasks.
pub struct CerebrasClient<P: CompletionProvider = CerebrasProvider> {
    config: ClientConfig,
    provider: P,
}

impl CerebrasClient<CerebrasProvider> {
    /// Resolve configuration from the arguments, the environment and the config
    /// file, then build an HTTP-backed client.
    ///
    /// Fails with [`Error::MissingCredential`] before any network activity when
    /// no API key is found.
    pub fn new(api_key: Option<String>, model: Option<String>) -> Result<Self, Error> {
        Self::from_config(ClientConfig::resolve(api_key, model)?)
    }

    /// Build an HTTP-backed client from already resolved configuration.
    pub fn from_config(config: ClientConfig) -> Result<Self, Error> {
        let provider = CerebrasProvider::from_config(&config)?;
        Ok(Self { config, provider })
    }
}

impl<P: CompletionProvider> CerebrasClient<P> {
    /// Build a client over a custom provider.
    pub fn with_provider(config: ClientConfig, provider: P) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn request(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerationOptions,
        stream: bool,
    ) -> Result<CompletionRequest, Error> {
        CompletionRequest::new(self.config.model.as_str(), messages, options, stream)
    }

    /// Single-turn completion: `prompt` as the user turn, after an optional system turn.
    pub async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
        options: GenerationOptions,
    ) -> Result<String, Error> {
        let prompt = Prompt::single_turn(prompt, system);
        self.chat(prompt.messages(), options).await
    }

    /// Send a conversation and wait for the full reply.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        options: GenerationOptions,
    ) -> Result<String, Error> {
        Ok(self.chat_response(messages, options).await?.content)
    }

    /// Like [`chat`](Self::chat), but keeps the finish reason and token usage.
    pub async fn chat_response(
        &self,
        messages: &[ChatMessage],
        options: GenerationOptions,
    ) -> Result<CompleteResponse, Error> {
        let request = self.request(messages.to_vec(), options, false)?;
        self.provider.generate(&request).await?.buffer().await
    }

    /// Stream a single-turn completion chunk by chunk.
    ///
    /// A rejected request fails here, before any chunk. Once streaming, a
    /// transport failure is yielded as one `Err` after the chunks that made it.
    pub async fn stream(
        &self,
        prompt: &str,
        system: Option<&str>,
        options: GenerationOptions,
    ) -> Result<TextStream, Error> {
        let prompt = Prompt::single_turn(prompt, system);
        let request = self.request(prompt.into_messages(), options, true)?;
        Ok(self.provider.generate(&request).await?.text_stream())
    }

    /// Generate code only, in `language`, optionally grounded in existing `context`.
    pub async fn code(
        &self,
        task: &str,
        context: Option<&str>,
        language: &str,
    ) -> Result<String, Error> {
        let system = format!(
            "You are an expert {language} programmer.\n\
             Output only code, no explanations unless asked.\n\
             Follow best practices and include error handling."
        );

        let prompt = match context {
            Some(context) => format!("Context:\n```\n{context}\n```\n\nTask: {task}"),
            None => task.to_string(),
        };

        let options = GenerationOptions::default().with_temperature(CODE_TEMPERATURE);
        self.complete(&prompt, Some(system.as_str()), options).await
    }

    /// Run a preset against `context`.
    pub async fn preset(
        &self,
        preset: Preset,
        context: &str,
        target_language: Option<&str>,
    ) -> Result<String, Error> {
        let prompt = preset.expand(context, target_language);
        let options = GenerationOptions::default().with_temperature(CODE_TEMPERATURE);
        self.complete(&prompt.user, Some(prompt.system.as_str()), options).await
    }
}
